//! Flattening of store records into the view models pages render.
//!
//! Every field of the produced [`Article`] and [`Category`] is filled: each
//! value is resolved through a fallback chain where the first non-blank
//! candidate wins, ending in an empty string or [`UNKNOWN_DATE`].

use std::sync::Arc;

use crate::{
    body::{preview_source, render_body_html},
    config::ContentConfig,
    media::MediaResolver,
    non_blank, normalize_taxonomy_key,
    preview::{derive_preview, PreviewOptions},
    slugify,
    timestamp::{format_display_date, parse_timestamp},
    Article, ArticleBody, ArticleCategoryLink, ArticleDetail, ArticlePage, ArticleSummary,
    Category, CategoryRecord, CategoryRef, CategoryWithArticles, ListedArticle, MediaAttachment,
    DEFAULT_CATEGORY_COLOR, UNKNOWN_DATE,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewMapper {
    media: MediaResolver,
    preview: PreviewOptions,
}

impl ViewMapper {
    pub fn new(media: MediaResolver, preview: PreviewOptions) -> Self {
        Self {
            media,
            preview,
        }
    }

    pub fn from_config(config: &ContentConfig) -> Self {
        Self::new(MediaResolver::new(config.media_base_url.clone()), config.preview)
    }

    pub fn media(&self) -> &MediaResolver {
        &self.media
    }

    /// Map a listing entry under the category it is listed in. Listings carry
    /// no media, so the header image stops at the explicit path.
    pub fn article_from_listing(
        &self,
        listed: &ListedArticle,
        category: &CategoryRecord,
    ) -> Article {
        let summary = &listed.summary;
        Article {
            id: summary.id.clone(),
            title: summary.title.clone(),
            slug: summary.slug.clone(),
            category_name: category.name.clone(),
            category_slug: category.slug.clone(),
            author: author_of(summary),
            date: display_date(summary),
            preview: self.resolve_preview(summary, &listed.body),
            header_image_url: self.header_image_url(summary, &[]),
            media_urls: Vec::new(),
        }
    }

    /// Map a resolved detail. The primary category is the first link in
    /// display order.
    pub fn article_from_detail(&self, detail: &ArticleDetail, known: &[CategoryRecord]) -> Article {
        let summary = &detail.summary;
        let (category_name, category_slug) = match detail.categories.first() {
            Some(link) => {
                let category = Self::resolve_category(link, known);
                (category.name, category.slug)
            },
            None => (String::new(), String::new()),
        };

        Article {
            id: summary.id.clone(),
            title: summary.title.clone(),
            slug: summary.slug.clone(),
            category_name,
            category_slug,
            author: author_of(summary),
            date: display_date(summary),
            preview: self.resolve_preview(summary, &detail.body),
            header_image_url: self.header_image_url(summary, &detail.media),
            media_urls: self.media_urls(&detail.media),
        }
    }

    pub fn category(&self, entry: &CategoryWithArticles) -> Category {
        let record = &entry.category;
        Category {
            id: record.id.clone(),
            name: record.name.clone(),
            color: record.color.clone(),
            slug: record.slug.clone(),
            articles: entry
                .articles
                .iter()
                .map(|listed| self.article_from_listing(listed, record))
                .collect(),
        }
    }

    /// Identify the category behind an article link: by id, then by
    /// normalized slug, then by normalized name. Links matching no known
    /// category are turned into a category from their own fields.
    pub fn resolve_category(link: &ArticleCategoryLink, known: &[CategoryRecord]) -> CategoryRef {
        if let Some(record) = known.iter().find(|record| record.id == link.category_id) {
            return CategoryRef::from(record);
        }

        if let Some(slug) = non_blank(link.slug.as_deref()) {
            let key = normalize_taxonomy_key(slug);
            if let Some(record) = known
                .iter()
                .find(|record| normalize_taxonomy_key(&record.slug) == key)
            {
                return CategoryRef::from(record);
            }
        }
        if let Some(name) = non_blank(link.name.as_deref()) {
            let key = normalize_taxonomy_key(name);
            if let Some(record) = known
                .iter()
                .find(|record| normalize_taxonomy_key(&record.name) == key)
            {
                return CategoryRef::from(record);
            }
        }

        let name = non_blank(link.name.as_deref()).unwrap_or_default().to_string();
        let slug = match non_blank(link.slug.as_deref()) {
            Some(slug) => slug.to_string(),
            None => slugify(&name),
        };
        CategoryRef {
            id: link.category_id.clone(),
            name,
            slug,
            color: non_blank(link.color.as_deref())
                .unwrap_or(DEFAULT_CATEGORY_COLOR)
                .to_string(),
        }
    }

    /// Assemble an article page from a resolved detail and its resolved
    /// related articles.
    pub fn page(
        &self,
        detail: &ArticleDetail,
        known: &[CategoryRecord],
        related: &[Arc<ArticleDetail>],
    ) -> ArticlePage {
        self.build_page(detail, known, related, None)
    }

    /// Like [`ViewMapper::page`], for an article reached through one of its
    /// categories: that category is shown as the article's category as long
    /// as the article is linked to it.
    pub fn page_in_category(
        &self,
        detail: &ArticleDetail,
        known: &[CategoryRecord],
        related: &[Arc<ArticleDetail>],
        category: &CategoryRecord,
    ) -> ArticlePage {
        self.build_page(detail, known, related, Some(category))
    }

    fn build_page(
        &self,
        detail: &ArticleDetail,
        known: &[CategoryRecord],
        related: &[Arc<ArticleDetail>],
        current: Option<&CategoryRecord>,
    ) -> ArticlePage {
        let mut categories: Vec<CategoryRef> = Vec::with_capacity(detail.categories.len());
        for link in &detail.categories {
            let category = Self::resolve_category(link, known);
            if !categories.iter().any(|seen| seen.id == category.id) {
                categories.push(category);
            }
        }

        let mut article = self.article_from_detail(detail, known);
        if let Some(current) = current {
            if categories.iter().any(|category| category.id == current.id) {
                article.category_name = current.name.clone();
                article.category_slug = current.slug.clone();
            }
        }

        ArticlePage {
            article,
            body_html: render_body_html(&detail.body),
            categories,
            related: related
                .iter()
                .map(|related| self.article_from_detail(related, known))
                .collect(),
        }
    }

    /// Explicit preview, then excerpt (both verbatim), then a preview derived
    /// from the body.
    fn resolve_preview(&self, summary: &ArticleSummary, body: &ArticleBody) -> String {
        for explicit in [&summary.preview, &summary.excerpt] {
            if let Some(value) = explicit {
                if !value.trim().is_empty() {
                    return value.clone();
                }
            }
        }
        preview_source(body)
            .map(|text| derive_preview(&text, &self.preview))
            .unwrap_or_default()
    }

    fn header_image_url(&self, summary: &ArticleSummary, media: &[MediaAttachment]) -> String {
        let flagged = media
            .iter()
            .filter(|item| item.is_header)
            .map(|item| self.media.resolve(&item.storage_path))
            .find(|url| !url.is_empty());
        if let Some(url) = flagged {
            return url;
        }
        if let Some(path) = non_blank(summary.header_image_path.as_deref()) {
            return self.media.resolve(path);
        }
        self.media_urls(media).into_iter().next().unwrap_or_default()
    }

    /// Resolved media URLs in attachment order, blanks and repeats removed.
    fn media_urls(&self, media: &[MediaAttachment]) -> Vec<String> {
        let mut urls: Vec<String> = Vec::with_capacity(media.len());
        for item in media {
            let url = self.media.resolve(&item.storage_path);
            if !url.is_empty() && !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

fn author_of(summary: &ArticleSummary) -> String {
    non_blank(summary.author_name.as_deref())
        .unwrap_or_default()
        .to_string()
}

/// Published, authored, updated, then created date. Unparseable values are
/// shown as written.
pub fn display_date(summary: &ArticleSummary) -> String {
    let candidate = [
        &summary.published_at,
        &summary.authored_date,
        &summary.updated_at,
        &summary.created_at,
    ]
    .into_iter()
    .find_map(|value| non_blank(value.as_deref()));

    match candidate {
        Some(value) => match parse_timestamp(value) {
            Some(parsed) => format_display_date(&parsed),
            None => value.to_string(),
        },
        None => UNKNOWN_DATE.to_string(),
    }
}
