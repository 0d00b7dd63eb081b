//! Run logging: every record at debug level goes to a file below the logging
//! root, while the console only shows warnings and errors.
//!
//! Dry runs write no file and print debug records to the console instead.
//! `RUST_LOG` overrides the console filter; the file filter is fixed.

use camino::{Utf8Path, Utf8PathBuf};
use env_logger::{Env, Logger, Target, WriteStyle};
use log::{LevelFilter, Log, Metadata, Record, debug};

use crate::CliError;

/// File name of the run log below the logging root.
pub(crate) const RUN_LOG_FILE: &str = "mapcreator.log";

/// Location of the run log for a logging root.
pub(crate) fn run_log_path(logs: &Utf8Path) -> Utf8PathBuf {
    logs.join(RUN_LOG_FILE)
}

/// Console sink paired with an optional run log file.
pub(crate) struct RunLogger {
    console: Logger,
    file: Option<Logger>,
}

impl RunLogger {
    /// Build the sinks for a run whose tool logs live under `logs`.
    pub(crate) fn new(logs: &Utf8Path, dry_run: bool) -> Result<Self, CliError> {
        let console_filter = if dry_run { "debug" } else { "warn" };
        let console =
            env_logger::Builder::from_env(Env::default().default_filter_or(console_filter))
                .build();
        let file = if dry_run {
            None
        } else {
            let path = run_log_path(logs);
            let sink = regiomap_fs::open_append(&path)
                .map_err(|source| CliError::OpenRunLog { path, source })?;
            Some(
                env_logger::Builder::new()
                    .filter_level(LevelFilter::Debug)
                    .write_style(WriteStyle::Never)
                    .target(Target::Pipe(Box::new(sink)))
                    .build(),
            )
        };
        Ok(Self { console, file })
    }

    /// Most verbose level any sink accepts.
    pub(crate) fn max_level(&self) -> LevelFilter {
        self.file
            .as_ref()
            .map_or(LevelFilter::Off, Logger::filter)
            .max(self.console.filter())
    }

    /// Whether a run log file is being written.
    pub(crate) const fn writes_file(&self) -> bool {
        self.file.is_some()
    }
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.console.enabled(metadata)
            || self
                .file
                .as_ref()
                .is_some_and(|file| file.enabled(metadata))
    }

    fn log(&self, record: &Record<'_>) {
        self.console.log(record);
        if let Some(file) = &self.file {
            file.log(record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            file.flush();
        }
    }
}

/// Install the run logger for a build.
///
/// A logger installed earlier, for example by a test harness, is kept.
pub(crate) fn init_logging(logs: &Utf8Path, dry_run: bool) -> Result<(), CliError> {
    let logger = RunLogger::new(logs, dry_run)?;
    let level = logger.max_level();
    let writes_file = logger.writes_file();
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level);
        if writes_file {
            debug!("writing run log to {}", run_log_path(logs));
        }
    } else {
        debug!("a logger is already installed, keeping it");
    }
    Ok(())
}
