use thiserror::Error;

/// Errors surfaced at the crate's outer edges (config files, blob stores, CLI)
///
/// The combat core itself never fails: rejected actions and stale timers
/// degrade to no-ops.
#[derive(Error, Debug)]
pub enum DuelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, DuelError>;
