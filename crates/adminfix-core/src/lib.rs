//! adminfix core
//!
//! Data models, configuration and SQL helpers shared by the REST client and
//! the operator CLI.

pub mod error;
pub mod models;
pub mod sql;
pub mod storage;

pub use error::{Error, Result};
