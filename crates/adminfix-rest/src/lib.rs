//! adminfix REST client
//!
//! Client library for the hosted backend's auth and table endpoints.

pub mod auth;
pub mod client;
pub mod error;
pub mod secrets;
pub mod types;

pub use auth::ApiKey;
pub use client::RestClient;
pub use error::{Error, Result};
pub use secrets::{Credentials, ExplicitCredentials, KeyringStore, MemoryStore, SecretStore};
pub use types::*;
