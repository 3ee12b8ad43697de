use anyhow::{Context, Result};
use folio_shared::{loader::load_categories, Category};

use super::Workspace;
use crate::cli::ListOutputFormat;

pub async fn run(workspace: &Workspace, format: ListOutputFormat) -> Result<()> {
    let loaded = load_categories(&workspace.store)
        .await
        .context("failed to load categories")?;
    let categories: Vec<Category> = loaded
        .iter()
        .map(|entry| workspace.mapper.category(entry))
        .collect();

    match format {
        ListOutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&categories)?);
        },
        ListOutputFormat::Table => {
            for category in &categories {
                println!(
                    "{} ({}) {} {} article(s)",
                    category.name,
                    category.slug,
                    category.color,
                    category.articles.len()
                );
                for article in &category.articles {
                    println!("  {:<20} {:<32} {}", article.date, article.slug, article.title);
                }
            }
        },
    }
    Ok(())
}
