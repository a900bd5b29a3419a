pub mod logbook;
pub mod notification;
pub mod proposal;
pub mod settings;
pub mod user;
