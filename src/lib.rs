pub mod config;
pub mod core;
pub mod errors;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::Settings;
pub use core::*;
pub use errors::{ApiError, ApiResult, ConfigError, RealtimeError, RealtimeResult};
