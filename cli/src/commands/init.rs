use anyhow::{Context, Result};
use folio_shared::sqlite_store::CONTENT_TABLE_NAMES;

use super::Workspace;

pub async fn run(workspace: &Workspace) -> Result<()> {
    workspace
        .store
        .init_schema()
        .await
        .context("failed to create content tables")?;

    for table in CONTENT_TABLE_NAMES {
        tracing::info!("table ready: {table}");
    }
    Ok(())
}
