// Error types for the overlay status bar
//
// This module defines error types using thiserror for better error handling
// and debugging throughout the application.

use thiserror::Error;

/// Main error type for status bar operations
#[derive(Error, Debug)]
pub enum BarError {
    #[error("overlay permission unavailable: {0}")]
    PermissionDenied(String),

    #[error("buffer creation failed: {0}")]
    BufferCreation(String),

    #[error("no usable font found: {0}")]
    FontDiscovery(String),

    #[error("no runtime directory available for the pidfile")]
    NoRuntimeDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results throughout the crate
pub type Result<T> = std::result::Result<T, BarError>;
