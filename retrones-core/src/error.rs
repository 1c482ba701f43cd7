//! Error types for the bridging layer.
//!
//! None of these cross the C boundary: the entry points log them and report plain
//! `false` / 0 / null to the frontend.

use crate::loader::LoadError;

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// The frontend refused RGB565 output.
    #[error("frontend does not support RGB565 output")]
    UnsupportedPixelFormat,

    /// The image failed header validation before reaching the core.
    #[error("invalid ROM image: {0}")]
    InvalidRom(#[from] LoadError),

    /// The core rejected the cartridge.
    #[error("core failed to load cartridge: {0:#}")]
    CoreLoad(anyhow::Error),

    #[error("no game loaded")]
    NotLoaded,

    #[error("failed to save state: {0:#}")]
    StateSave(anyhow::Error),

    #[error("failed to load state: {0:#}")]
    StateLoad(anyhow::Error),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
