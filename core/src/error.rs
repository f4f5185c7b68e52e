use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Non-finite value computed for {what}")]
    NonFinite { what: &'static str },

    #[error("Unlock gates did not settle after {passes} passes")]
    GateDidNotSettle { passes: u32 },

    #[error("Unknown catalog entry '{id}'")]
    UnknownEntry { id: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GameResult<T> = Result<T, GameError>;
