use std::{env, path::PathBuf, str::FromStr};

use url::Url;

use crate::{error::ContentError, preview::PreviewOptions};

pub const DB_PATH_ENV: &str = "FOLIO_DB_PATH";
pub const MEDIA_BASE_URL_ENV: &str = "FOLIO_MEDIA_BASE_URL";
pub const PREVIEW_MAX_LINES_ENV: &str = "FOLIO_PREVIEW_MAX_LINES";
pub const PREVIEW_SENTENCES_ENV: &str = "FOLIO_PREVIEW_SENTENCES";
pub const PREVIEW_SENTENCE_CAP_ENV: &str = "FOLIO_PREVIEW_SENTENCE_CAP";
pub const PREVIEW_FALLBACK_CAP_ENV: &str = "FOLIO_PREVIEW_FALLBACK_CAP";

/// Settings for reading content and building view models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentConfig {
    /// SQLite database file. `None` is reported when the store is first read.
    pub database_path: Option<PathBuf>,
    /// Public base URL of the media bucket; empty leaves relative paths as-is.
    pub media_base_url: String,
    pub preview: PreviewOptions,
}

impl ContentConfig {
    pub fn from_env() -> Result<Self, ContentError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, e.g. a fixed map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database_path = read(DB_PATH_ENV).map(PathBuf::from);

        let media_base_url = match read(MEDIA_BASE_URL_ENV) {
            Some(raw) => {
                Url::parse(&raw).map_err(|err| {
                    ContentError::Configuration(format!("{MEDIA_BASE_URL_ENV}={raw:?}: {err}"))
                })?;
                raw.trim_end_matches('/').to_string()
            },
            None => String::new(),
        };

        let defaults = PreviewOptions::default();
        let preview = PreviewOptions {
            max_lines: parse_or(
                read(PREVIEW_MAX_LINES_ENV),
                PREVIEW_MAX_LINES_ENV,
                defaults.max_lines,
            )?,
            sentence_count: parse_or(
                read(PREVIEW_SENTENCES_ENV),
                PREVIEW_SENTENCES_ENV,
                defaults.sentence_count,
            )?,
            sentence_cap: parse_or(
                read(PREVIEW_SENTENCE_CAP_ENV),
                PREVIEW_SENTENCE_CAP_ENV,
                defaults.sentence_cap,
            )?,
            fallback_cap: parse_or(
                read(PREVIEW_FALLBACK_CAP_ENV),
                PREVIEW_FALLBACK_CAP_ENV,
                defaults.fallback_cap,
            )?,
        };

        Ok(Self {
            database_path,
            media_base_url,
            preview,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ContentError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| ContentError::Configuration(format!("{key}={raw:?}: {err}"))),
        None => Ok(default),
    }
}
