pub mod api_error;
pub mod config_error;
pub mod realtime_error;

pub use api_error::{ApiError, ApiResult};
pub use config_error::ConfigError;
pub use realtime_error::{RealtimeError, RealtimeResult};
