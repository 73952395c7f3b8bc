use thiserror::Error;

/// Top-level error type for the Voxboard system.
///
/// Subsystem crates construct the variant matching their concern; the `?`
/// operator works across crate boundaries through the `From` impls below.
/// Recognition-engine failures never cross the public start/stop contract of
/// the session manager — they are converted to status messages or silent
/// restarts at the session boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoxboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recognition engine error: {0}")]
    Engine(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Text surface error: {0}")]
    Surface(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for VoxboardError {
    fn from(err: toml::de::Error) -> Self {
        VoxboardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VoxboardError {
    fn from(err: toml::ser::Error) -> Self {
        VoxboardError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VoxboardError {
    fn from(err: serde_json::Error) -> Self {
        VoxboardError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Voxboard operations.
pub type Result<T> = std::result::Result<T, VoxboardError>;
