//! Errors of the repair workflows

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Rest(#[from] adminfix_rest::Error),

    #[error(transparent)]
    Core(#[from] adminfix_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Found {0} client records for the admin user; use `reinsert` to replace them")]
    Ambiguous(usize),

    #[error("Admin record did not converge: {0}")]
    NotConverged(String),
}

pub type Result<T> = std::result::Result<T, Error>;
