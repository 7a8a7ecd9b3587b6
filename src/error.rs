use thiserror::Error;

/// Contract violations in a prediction request. These are rejected before any
/// factor runs and are never defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("unknown match format {0:?} (expected ODI or T20)")]
    UnknownFormat(String),
    #[error("unknown gender {0:?} (expected Male or Female)")]
    UnknownGender(String),
    #[error("unknown prediction mode {0:?} (expected pre-match or post-innings)")]
    UnknownMode(String),
    #[error("invalid match date {0:?}")]
    InvalidDate(String),
    #[error("invalid first innings score {0:?}")]
    InvalidScore(String),
    #[error("first innings score is required in post-innings mode")]
    MissingScore,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username {0:?} already exists")]
    UsernameTaken(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0} access required")]
    Forbidden(&'static str),
    #[error("session expired or unknown")]
    SessionExpired,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
