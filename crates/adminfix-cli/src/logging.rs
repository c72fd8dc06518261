//! Log setup: stderr for the operator, a debug log file for the record

use adminfix_core::storage::init_data_dir;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Send INFO and above to stderr and DEBUG and above to
/// `<data_dir>/adminfix/adminfix.log`. `filter` is an env-filter directive
/// such as `info` or `adminfix_rest=debug`.
///
/// Returns the log file path, or `None` when no file could be opened and only
/// stderr is used.
pub fn init_logging(filter: &str) -> Option<PathBuf> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    let stderr_writer = std::io::stderr.with_max_level(tracing::Level::INFO);

    let log_file = init_data_dir().ok().and_then(|data_dir| {
        let path = data_dir.join("adminfix.log");
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
            .map(|file| (path, file))
    });

    match log_file {
        Some((path, file)) => {
            let file_writer = Mutex::new(file).with_max_level(tracing::Level::DEBUG);
            tracing_subscriber::fmt()
                .with_writer(stderr_writer.and(file_writer))
                .with_env_filter(filter)
                .with_ansi(false) // No color codes in log file
                .init();
            Some(path)
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(stderr_writer)
                .with_env_filter(filter)
                .init();
            None
        }
    }
}
