//! sio Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by the other sio crates:
//! - Client configuration (server address, headers, reconnection policy)
//! - A single error type covering codec, transport and client failures
//! - Structured logging with tracing
//! - Platform directory lookup
//! - Protocol constants

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{SioError, SioResult};
pub use logging::init_logging;
pub use platform::Platform;
