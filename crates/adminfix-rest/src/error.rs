//! Error types for the hosted REST API

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error(transparent)]
    Core(#[from] adminfix_core::Error),
}

impl Error {
    /// HTTP status of a rejected call, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
