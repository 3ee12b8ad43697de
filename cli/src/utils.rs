use anyhow::{Context, Result};
use folio_shared::{
    ArticleBody, ArticleCategoryLink, ArticleDetail, ArticleSummary, MediaAttachment,
    RelatedArticleRef,
};
use gray_matter::{engine::YAML, Matter};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Frontmatter {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    /// Published flag; articles are published unless `status: false`.
    pub status: Option<bool>,
    /// Authored date as written by the author.
    pub date: Option<String>,
    pub published_at: Option<String>,
    pub preview: Option<String>,
    pub excerpt: Option<String>,
    pub header_image: Option<String>,
    pub sort_index: Option<i64>,
    /// Category ids in display order.
    pub categories: Option<Vec<String>>,
    /// Related article ids in display order.
    pub related: Option<Vec<String>>,
    pub media: Option<Vec<MediaEntry>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaEntry {
    pub path: String,
    pub caption: Option<String>,
    pub credit: Option<String>,
    pub alt: Option<String>,
    #[serde(default)]
    pub header: bool,
}

pub fn parse_markdown(content: &str) -> Result<(Frontmatter, String)> {
    let matter = Matter::<YAML>::new();
    let parsed = matter.parse(content);

    let frontmatter = parsed
        .data
        .map(|data| data.deserialize::<Frontmatter>())
        .transpose()
        .context("invalid frontmatter")?
        .unwrap_or_default();

    Ok((frontmatter, parsed.content))
}

pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Build the article record written by `write-article`.
///
/// `fallback_id` (usually the file stem) is used when the frontmatter has no
/// id; the slug defaults to the id. `written_at` stamps `updated_at` and, for
/// new rows, `created_at`.
pub fn article_from_markdown(
    frontmatter: Frontmatter,
    body: String,
    fallback_id: &str,
    document: Option<String>,
    written_at: &str,
) -> Result<ArticleDetail> {
    let title = clean(frontmatter.title).context("frontmatter title is required")?;
    let id = clean(frontmatter.id).unwrap_or_else(|| fallback_id.trim().to_string());
    if id.is_empty() {
        anyhow::bail!("article id is required (frontmatter `id` or file name)");
    }
    let slug = clean(frontmatter.slug).unwrap_or_else(|| folio_shared::slugify(&id));

    let categories = frontmatter
        .categories
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| clean(Some(id)))
        .enumerate()
        .map(|(position, category_id)| ArticleCategoryLink {
            category_id,
            sort_index: position as i64,
            ..ArticleCategoryLink::default()
        })
        .collect();

    let related = frontmatter
        .related
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| clean(Some(id)))
        .enumerate()
        .map(|(position, article_id)| RelatedArticleRef {
            article_id,
            sort_index: position as i64,
        })
        .collect();

    let media = frontmatter
        .media
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(position, entry)| MediaAttachment {
            id: String::new(),
            storage_path: entry.path.trim().to_string(),
            caption: clean(entry.caption),
            credit: clean(entry.credit),
            alt_text: clean(entry.alt),
            is_header: entry.header,
            sort_index: position as i64,
        })
        .collect();

    let markdown = body.trim();
    Ok(ArticleDetail {
        summary: ArticleSummary {
            id,
            slug,
            title,
            author_name: clean(frontmatter.author),
            status: frontmatter.status.unwrap_or(true),
            authored_date: clean(frontmatter.date),
            published_at: clean(frontmatter.published_at),
            updated_at: Some(written_at.to_string()),
            created_at: Some(written_at.to_string()),
            preview: clean(frontmatter.preview),
            excerpt: clean(frontmatter.excerpt),
            header_image_path: clean(frontmatter.header_image),
            sort_index: frontmatter.sort_index.unwrap_or_default(),
        },
        body: ArticleBody {
            markdown: (!markdown.is_empty()).then(|| markdown.to_string()),
            html: None,
            document,
        },
        categories,
        related,
        media,
    })
}
