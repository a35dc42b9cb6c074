use thiserror::Error;

use crate::core::types::PartyId;

#[derive(Error, Debug)]
pub enum EscortError {
    #[error("Party not found: {0:?}")]
    PartyNotFound(PartyId),

    #[error("Leader unavailable: {0}")]
    LeaderUnavailable(String),

    #[error("Host rejected request: {0}")]
    HostRejected(String),

    #[error("Visual layer unavailable: {0}")]
    VisualLayerUnavailable(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported save version {found} (newest known is {newest})")]
    UnsupportedSaveVersion { found: u32, newest: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EscortError>;
