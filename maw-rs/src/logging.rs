//! Tracing subscriber setup.
//!
//! The filter comes from the `MAW_LOG` environment variable, then the
//! settings' `log_level`, then `info`. Output goes to the settings'
//! `log_file` (truncated on start) or to stderr.

use crate::config::Settings;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "MAW_LOG";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter {directive:?}: {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Filter directive to use, by precedence.
pub fn filter_directive(env: Option<String>, settings: &Settings) -> String {
    env.filter(|d| !d.trim().is_empty())
        .or_else(|| settings.log_level.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber.
pub fn init(settings: &Settings) -> Result<(), LoggingError> {
    let directive = filter_directive(std::env::var(LOG_ENV).ok(), settings);
    let filter = EnvFilter::try_new(&directive).map_err(|source| LoggingError::InvalidFilter {
        directive: directive.clone(),
        source,
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match &settings.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| LoggingError::OpenFile {
                path: path.clone(),
                source,
            })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!("Logging initialized with filter {}", directive);
    Ok(())
}
