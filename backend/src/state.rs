use std::{env, sync::Arc};

use anyhow::{Context, Result};
use folio_shared::{
    config::ContentConfig,
    content_store::{ContentStore, MemoryContentStore},
    mapper::ViewMapper,
    sqlite_store::SqliteContentStore,
};

/// Serve a JSON fixture instead of the SQLite store (local previews, demos).
pub const FIXTURE_PATH_ENV: &str = "FOLIO_FIXTURE_PATH";

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ContentStore>,
    mapper: Arc<ViewMapper>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, mapper: ViewMapper) -> Self {
        Self {
            store,
            mapper: Arc::new(mapper),
        }
    }

    pub async fn from_env() -> Result<Self> {
        let config = ContentConfig::from_env().context("invalid content configuration")?;
        let mapper = ViewMapper::from_config(&config);

        if let Ok(fixture_path) = env::var(FIXTURE_PATH_ENV) {
            let raw = tokio::fs::read_to_string(&fixture_path)
                .await
                .with_context(|| format!("failed to read fixture {fixture_path}"))?;
            let store = MemoryContentStore::from_json(&raw)
                .with_context(|| format!("failed to parse fixture {fixture_path}"))?;
            tracing::info!("Serving content fixture {}", fixture_path);
            return Ok(Self::new(Arc::new(store), mapper));
        }

        match &config.database_path {
            Some(path) => tracing::info!("Content database: {}", path.display()),
            None => tracing::warn!("No content database configured; pages will report it"),
        }
        Ok(Self::new(Arc::new(SqliteContentStore::from_config(&config)), mapper))
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    pub fn mapper(&self) -> &ViewMapper {
        &self.mapper
    }
}
