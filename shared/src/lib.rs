//! Shared content model and read pipeline for the Folio magazine.
//!
//! Store rows flow one way: [`loader`] and [`resolver`] read from a
//! [`content_store::ContentStore`], and [`mapper`] flattens the results into
//! the [`Article`] / [`Category`] view models the rendering layer consumes.

use serde::{Deserialize, Serialize};

pub mod body;
pub mod config;
pub mod content_store;
pub mod error;
pub mod loader;
pub mod mapper;
pub mod media;
pub mod preview;
pub mod resolver;
pub mod sqlite_store;
pub mod timestamp;

pub use error::ContentError;

/// Display date used when none of the article timestamps is set.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Color assigned to categories synthesized from bare link data.
pub const DEFAULT_CATEGORY_COLOR: &str = "#000000";

// 分类（内容库中的原始行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    pub color: String,
    pub slug: String,
    #[serde(default)]
    pub sort_index: i64,
}

// 列表项（精简版，不含正文）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub authored_date: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub header_image_path: Option<String>,
    #[serde(default)]
    pub sort_index: i64,
}

/// Listing entry: an article summary plus the body its preview may be
/// derived from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListedArticle {
    #[serde(flatten)]
    pub summary: ArticleSummary,
    #[serde(default)]
    pub body: ArticleBody,
}

/// A category together with its published articles, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWithArticles {
    pub category: CategoryRecord,
    pub articles: Vec<ListedArticle>,
}

/// Article body in the forms the editorial workspace may have stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleBody {
    /// Markdown source.
    #[serde(default)]
    pub markdown: Option<String>,
    /// Precomputed HTML, preferred for rendering when present.
    #[serde(default)]
    pub html: Option<String>,
    /// Structured editor document as raw JSON text.
    #[serde(default)]
    pub document: Option<String>,
}

/// Membership of an article in a category.
///
/// `sort_index` orders the article's categories and is independent of the
/// category's own `category_sort_index`. The display fields come from a left
/// join and may be missing when the category row is gone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleCategoryLink {
    pub category_id: String,
    #[serde(default)]
    pub sort_index: i64,
    #[serde(default)]
    pub category_sort_index: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedArticleRef {
    pub article_id: String,
    #[serde(default)]
    pub sort_index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    pub storage_path: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_header: bool,
    #[serde(default)]
    pub sort_index: i64,
}

// 完整文章数据模型
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub summary: ArticleSummary,
    #[serde(default)]
    pub body: ArticleBody,
    #[serde(default)]
    pub categories: Vec<ArticleCategoryLink>,
    #[serde(default)]
    pub related: Vec<RelatedArticleRef>,
    #[serde(default)]
    pub media: Vec<MediaAttachment>,
}

/// Flattened article handed to rendering code. Every field is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub category_name: String,
    pub category_slug: String,
    pub author: String,
    pub date: String,
    pub preview: String,
    pub header_image_url: String,
    pub media_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub slug: String,
    pub articles: Vec<Article>,
}

/// Resolved identity of a category an article belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub color: String,
}

impl From<&CategoryRecord> for CategoryRef {
    fn from(record: &CategoryRecord) -> Self {
        CategoryRef {
            id: record.id.clone(),
            name: record.name.clone(),
            slug: record.slug.clone(),
            color: record.color.clone(),
        }
    }
}

/// Everything an article detail page needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub article: Article,
    pub body_html: String,
    pub categories: Vec<CategoryRef>,
    pub related: Vec<Article>,
}

/// Normalize a category slug or name for comparison.
///
/// Case and surrounding whitespace are ignored, and runs of whitespace,
/// underscores and hyphens compare equal, so `" Arts & Culture "`,
/// `"arts-&-culture"` and `"ARTS_&_CULTURE"` share a key.
pub fn normalize_taxonomy_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    let mut pending_separator = false;
    for ch in value.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = !key.is_empty();
            continue;
        }
        if pending_separator {
            key.push('-');
            pending_separator = false;
        }
        key.extend(ch.to_lowercase());
    }
    key
}

/// Build a URL segment from free text: lowercase alphanumerics joined by `-`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = !slug.is_empty();
        }
    }
    slug
}

/// Trimmed value of an optional field, `None` when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
