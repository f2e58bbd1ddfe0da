use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "sitecal";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

/// Start writing log records to rotating files in `log_dir`, creating the
/// directory if needed.  `level` is a `flexi_logger` log specification such as
/// `info` or `warn, sitecal::project=debug`.
///
/// Logging stays active for as long as the returned handle is alive.  The
/// terminal belongs to the calendar, so nothing is ever logged to stderr.
pub(crate) fn init(level: &str, log_dir: &Path) -> Result<LoggerHandle, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;
    let handle = Logger::try_with_str(level)
        .map_err(|source| LoggingError::Level {
            level: level.to_owned(),
            source,
        })?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Start)?;
    log::info!(
        "{} {} started; logging at {level:?} to {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );
    Ok(handle)
}

#[derive(Debug, Error)]
pub(crate) enum LoggingError {
    #[error("failed to create log directory {}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("invalid log level {level:?}")]
    Level {
        level: String,
        source: FlexiLoggerError,
    },
    #[error("failed to start logger")]
    Start(#[source] FlexiLoggerError),
}
