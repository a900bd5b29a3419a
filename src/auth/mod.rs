pub mod identity;
pub mod password;
pub mod sweeper;
pub mod token;
pub mod validate;
