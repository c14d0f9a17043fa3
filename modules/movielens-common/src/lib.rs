pub mod config;
pub mod error;
pub mod schema;

pub use config::Config;
pub use error::{ConfigError, ValidationError, Violation};
pub use schema::*;
