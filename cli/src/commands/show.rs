use anyhow::{Context, Result};
use folio_shared::{content_store::ContentStore, resolver::DetailResolver};

use super::Workspace;

pub async fn run(workspace: &Workspace, id: &str, drafts: bool) -> Result<()> {
    let known = workspace
        .store
        .fetch_categories()
        .await
        .context("failed to load categories")?;

    let mut resolver = DetailResolver::new(&workspace.store);
    if drafts {
        resolver = resolver.including_drafts();
    }
    let Some(detail) = resolver.resolve(id).await.context("failed to fetch article")? else {
        anyhow::bail!("article {id} not found");
    };
    let related = resolver
        .resolve_related(&detail)
        .await
        .context("failed to fetch related articles")?;

    let page = workspace.mapper.page(&detail, &known, &related);
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
