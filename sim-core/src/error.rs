//! Error type shared by every part of the core.

use thiserror::Error;

/// Errors produced by the particle core.
///
/// Leaving the canvas is not an error; it is the normal recycle trigger.
#[derive(Error, Debug)]
pub enum SimError {
    /// A particle column was addressed by a name the store does not declare.
    #[error("unknown particle attribute `{0}`")]
    UnknownAttribute(String),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A palette entry could not be parsed as an RGB hex triple.
    #[error("invalid color `{0}`")]
    InvalidColor(String),

    /// A frame produced a non-finite particle; the run loop halts on this.
    #[error("particle {index} became non-finite during frame {tick}")]
    NonFinite { index: usize, tick: u64 },

    /// The simulation was shut down or halted after an earlier frame error.
    #[error("simulation is no longer running")]
    Stopped,

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
