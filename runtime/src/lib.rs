//! Process-wide logging setup shared by the Folio binaries.

use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directory for rolling log files; stdout only when unset.
pub const LOG_DIR_ENV: &str = "FOLIO_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
    pub log_dir: Option<PathBuf>,
    /// File name prefix of the daily log files, e.g. `backend.log`.
    pub file_prefix: String,
}

impl LoggingOptions {
    pub fn new(file_prefix: impl Into<String>) -> Self {
        Self {
            default_filter: "info".to_string(),
            log_dir: None,
            file_prefix: file_prefix.into(),
        }
    }

    pub fn from_env(file_prefix: impl Into<String>) -> Self {
        Self::from_lookup(file_prefix, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(file_prefix: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::new(file_prefix);
        options.log_dir = lookup(LOG_DIR_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        options
    }
}

/// Install the global subscriber: stdout always, plus a daily rolling file
/// when a log directory is configured. Keep the returned guard alive for the
/// lifetime of the process or buffered file lines are lost.
pub fn init_tracing(options: &LoggingOptions) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &options.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(dir) = &options.log_dir {
        tracing::info!("writing logs to {}", dir.display());
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_log_dir_means_stdout_only() {
        let options = LoggingOptions::from_lookup("cli.log", |_| Some("   ".to_string()));
        assert_eq!(options.log_dir, None);
        assert_eq!(options.default_filter, "info");

        let options = LoggingOptions::from_lookup("cli.log", |key| {
            (key == LOG_DIR_ENV).then(|| "/var/log/folio".to_string())
        });
        assert_eq!(options.log_dir, Some(PathBuf::from("/var/log/folio")));
    }

    #[test]
    fn init_creates_the_log_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut options = LoggingOptions::new("test.log");
        options.log_dir = Some(temp.path().join("logs"));

        let guard = init_tracing(&options).expect("install subscriber");
        assert!(guard.is_some());
        assert!(temp.path().join("logs").is_dir());
    }
}
