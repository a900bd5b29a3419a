pub mod logbook;
pub mod proposal;

pub use logbook::*;
pub use proposal::*;
