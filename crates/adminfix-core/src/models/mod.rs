pub mod client;
pub mod config;

pub use client::{AdminStatus, ClientPatch, ClientRecord, NewClient, RepairAction, Role};
pub use config::{AdminConfig, Config, HttpConfig, ProjectConfig};
