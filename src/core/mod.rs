//! Core utilities, configuration, errors, and common functionality

pub mod config;
pub mod dedup;
pub mod error;
pub mod logging;
pub mod process;
pub mod retry;
pub mod stats;
pub mod utils;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_startup_configuration};
