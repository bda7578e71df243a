pub mod db;
pub mod error;
pub mod lifeline;
pub mod question;
pub mod round;
pub mod session;
pub mod store;

pub use error::{Error, Result};
