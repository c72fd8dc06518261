//! adminfix operator library
//!
//! The repair workflows behind the `adminfix` binary, exposed as a library
//! for testing.

pub mod error;
pub mod inspect;
pub mod logging;
pub mod repair;
pub mod session;
pub mod sql;

pub use error::{Error, Result};
pub use inspect::{inspect, schema_probe};
pub use repair::{reinsert, repair, ReinsertOutcome, RepairOptions, RepairOutcome};
pub use session::AdminSession;
pub use sql::{apply_sql, load_statements, SqlSummary, StatementOutcome};
