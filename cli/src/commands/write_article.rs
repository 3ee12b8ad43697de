use std::{fs, path::Path};

use anyhow::{Context, Result};
use fl_cli::utils::{article_from_markdown, parse_list, parse_markdown};

use super::Workspace;

pub async fn run(
    workspace: &Workspace,
    file: &Path,
    id: Option<String>,
    categories: Option<String>,
    document: Option<&Path>,
) -> Result<()> {
    let content = fs::read_to_string(file).context("failed to read markdown file")?;
    let (mut frontmatter, body) = parse_markdown(&content)?;
    if id.is_some() {
        frontmatter.id = id;
    }
    if let Some(categories) = categories {
        frontmatter.categories = Some(parse_list(&categories));
    }

    let document = document
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read document {}", path.display()))
        })
        .transpose()?;

    let fallback_id = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let written_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let article = article_from_markdown(frontmatter, body, fallback_id, document, &written_at)?;

    let summary = article.summary.clone();
    let categories = article.categories.len();
    let media = article.media.len();
    workspace
        .store
        .upsert_article(article)
        .await
        .context("failed to write article")?;

    println!("Article written successfully:");
    println!("  id:         {}", summary.id);
    println!("  slug:       {}", summary.slug);
    println!("  title:      {}", summary.title);
    println!("  published:  {}", summary.status);
    println!("  categories: {}", categories);
    println!("  media:      {}", media);
    Ok(())
}
