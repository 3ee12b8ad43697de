use anyhow::{Context, Result};
use folio_shared::{slugify, CategoryRecord};

use super::Workspace;

pub async fn run(
    workspace: &Workspace,
    id: String,
    name: String,
    slug: Option<String>,
    color: String,
    sort_index: i64,
) -> Result<()> {
    let slug = slug
        .map(|slug| slug.trim().to_string())
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(&name));

    let category = CategoryRecord {
        id,
        name,
        color,
        slug,
        sort_index,
    };
    tracing::info!("writing category {} ({})", category.id, category.slug);
    workspace
        .store
        .upsert_category(category)
        .await
        .context("failed to write category")?;
    Ok(())
}
