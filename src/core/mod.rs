pub mod config;
pub mod error;
pub mod types;

pub use config::EscortConfig;
pub use error::{EscortError, Result};
