pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod inference;
pub mod progress;
pub mod readiness;
pub mod server;
pub mod upstream;

pub use error::{Error, Result};
