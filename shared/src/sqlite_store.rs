use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use crate::{
    body::validate_document,
    config::{ContentConfig, DB_PATH_ENV},
    content_store::{CategoryArticleRow, ContentStore},
    error::ContentError,
    ArticleBody, ArticleCategoryLink, ArticleDetail, ArticleSummary, CategoryRecord,
    ListedArticle, MediaAttachment, RelatedArticleRef,
};

pub const CONTENT_TABLE_NAMES: &[&str] = &[
    "categories",
    "articles",
    "article_categories",
    "article_relations",
    "article_media",
];

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    color TEXT NOT NULL DEFAULT '#000000',
    slug TEXT NOT NULL UNIQUE,
    sort_index INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS articles (
    id TEXT PRIMARY KEY NOT NULL,
    slug TEXT NOT NULL,
    title TEXT NOT NULL,
    author_name TEXT,
    status INTEGER NOT NULL DEFAULT 0,
    authored_date TEXT,
    published_at TEXT,
    updated_at TEXT,
    created_at TEXT,
    preview TEXT,
    excerpt TEXT,
    header_image_path TEXT,
    sort_index INTEGER NOT NULL DEFAULT 0,
    body_markdown TEXT,
    body_html TEXT,
    body_document TEXT
);

-- No foreign key on category_id: links may outlive their category.
CREATE TABLE IF NOT EXISTS article_categories (
    article_id TEXT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    category_id TEXT NOT NULL,
    sort_index INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (article_id, category_id)
);
CREATE INDEX IF NOT EXISTS idx_article_categories_category
    ON article_categories(category_id);

CREATE TABLE IF NOT EXISTS article_relations (
    article_id TEXT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    related_article_id TEXT NOT NULL,
    sort_index INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (article_id, related_article_id)
);

-- Media ids are only unique within their article.
CREATE TABLE IF NOT EXISTS article_media (
    id TEXT NOT NULL,
    article_id TEXT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    storage_path TEXT NOT NULL,
    caption TEXT,
    credit TEXT,
    alt_text TEXT,
    is_header INTEGER NOT NULL DEFAULT 0,
    sort_index INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (article_id, id)
);
"#;

const SUMMARY_COLUMNS: &str = "a.id AS id, a.slug AS slug, a.title AS title, a.author_name AS \
                               author_name, a.status AS status, a.authored_date AS authored_date, \
                               a.published_at AS published_at, a.updated_at AS updated_at, \
                               a.created_at AS created_at, a.preview AS preview, a.excerpt AS \
                               excerpt, a.header_image_path AS header_image_path, a.sort_index AS \
                               sort_index";

const BODY_COLUMNS: &str = "a.body_markdown AS body_markdown, a.body_html AS body_html, \
                            a.body_document AS body_document";

/// Content store backed by a SQLite file.
///
/// Each call opens its own connection on a blocking thread, so every read
/// sees the current rows and nothing is shared between requests.
#[derive(Debug, Clone)]
pub struct SqliteContentStore {
    path: Option<PathBuf>,
}

impl SqliteContentStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
        }
    }

    pub fn from_config(config: &ContentConfig) -> Self {
        Self::new(config.database_path.clone())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configured_path(&self) -> Result<PathBuf, ContentError> {
        self.path
            .clone()
            .ok_or_else(|| ContentError::Configuration(format!("{DB_PATH_ENV} is not set")))
    }

    async fn read<T, F>(&self, query: F) -> Result<T, ContentError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ContentError> + Send + 'static,
    {
        let path = self.configured_path()?;
        if !path.exists() {
            return Err(ContentError::Configuration(format!(
                "content database {} does not exist",
                path.display()
            )));
        }
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            query(&conn)
        })
        .await?
    }

    async fn write<T, F>(&self, update: F) -> Result<T, ContentError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, ContentError> + Send + 'static,
    {
        let path = self.configured_path()?;
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)?;
            conn.pragma_update(None, "foreign_keys", true)?;
            update(&mut conn)
        })
        .await?
    }

    /// Create the content tables if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), ContentError> {
        self.write(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        let path = self.path.as_deref().unwrap_or(Path::new(""));
        tracing::info!("content schema ready at {}", path.display());
        Ok(())
    }

    pub async fn upsert_category(&self, category: CategoryRecord) -> Result<(), ContentError> {
        validate_category(&category)?;
        self.write(move |conn| {
            conn.execute(
                "INSERT INTO categories (id, name, color, slug, sort_index)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    color = excluded.color,
                    slug = excluded.slug,
                    sort_index = excluded.sort_index",
                params![
                    category.id.trim(),
                    category.name.trim(),
                    category.color.trim(),
                    category.slug.trim(),
                    category.sort_index
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Write an article row and replace its links, relations and media.
    pub async fn upsert_article(&self, detail: ArticleDetail) -> Result<(), ContentError> {
        validate_article(&detail)?;
        let id = detail.summary.id.clone();
        self.write(move |conn| {
            let tx = conn.transaction()?;
            let summary = &detail.summary;
            tx.execute(
                "INSERT INTO articles (id, slug, title, author_name, status, authored_date,
                    published_at, updated_at, created_at, preview, excerpt, header_image_path,
                    sort_index, body_markdown, body_html, body_document)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                 ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    title = excluded.title,
                    author_name = excluded.author_name,
                    status = excluded.status,
                    authored_date = excluded.authored_date,
                    published_at = excluded.published_at,
                    updated_at = excluded.updated_at,
                    created_at = COALESCE(articles.created_at, excluded.created_at),
                    preview = excluded.preview,
                    excerpt = excluded.excerpt,
                    header_image_path = excluded.header_image_path,
                    sort_index = excluded.sort_index,
                    body_markdown = excluded.body_markdown,
                    body_html = excluded.body_html,
                    body_document = excluded.body_document",
                params![
                    summary.id.trim(),
                    summary.slug.trim(),
                    summary.title.trim(),
                    summary.author_name,
                    summary.status,
                    summary.authored_date,
                    summary.published_at,
                    summary.updated_at,
                    summary.created_at,
                    summary.preview,
                    summary.excerpt,
                    summary.header_image_path,
                    summary.sort_index,
                    detail.body.markdown,
                    detail.body.html,
                    detail.body.document,
                ],
            )?;

            let article_id = summary.id.trim();
            tx.execute(
                "DELETE FROM article_categories WHERE article_id = ?1",
                params![article_id],
            )?;
            for link in &detail.categories {
                tx.execute(
                    "INSERT OR REPLACE INTO article_categories (article_id, category_id, sort_index)
                     VALUES (?1, ?2, ?3)",
                    params![article_id, link.category_id.trim(), link.sort_index],
                )?;
            }

            tx.execute(
                "DELETE FROM article_relations WHERE article_id = ?1",
                params![article_id],
            )?;
            for related in &detail.related {
                tx.execute(
                    "INSERT OR REPLACE INTO article_relations
                        (article_id, related_article_id, sort_index)
                     VALUES (?1, ?2, ?3)",
                    params![article_id, related.article_id.trim(), related.sort_index],
                )?;
            }

            tx.execute(
                "DELETE FROM article_media WHERE article_id = ?1",
                params![article_id],
            )?;
            for (position, media) in detail.media.iter().enumerate() {
                tx.execute(
                    "INSERT INTO article_media (id, article_id, storage_path, caption,
                        credit, alt_text, is_header, sort_index)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        media_id(article_id, position, media),
                        article_id,
                        media.storage_path.trim(),
                        media.caption,
                        media.credit,
                        media.alt_text,
                        media.is_header,
                        media.sort_index
                    ],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
        .await?;
        tracing::debug!("article {id} written");
        Ok(())
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn fetch_categories(&self) -> Result<Vec<CategoryRecord>, ContentError> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, color, slug, sort_index FROM categories
                 ORDER BY sort_index ASC, name ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(CategoryRecord {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    color: row.get("color")?,
                    slug: row.get("slug")?,
                    sort_index: row.get("sort_index")?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn fetch_category_articles(&self) -> Result<Vec<CategoryArticleRow>, ContentError> {
        self.read(|conn| {
            let sql = format!(
                "SELECT ac.category_id AS category_id, {SUMMARY_COLUMNS}, {BODY_COLUMNS}
                 FROM article_categories ac
                 JOIN articles a ON a.id = ac.article_id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(CategoryArticleRow {
                    category_id: row.get("category_id")?,
                    article: ListedArticle {
                        summary: summary_from_row(row)?,
                        body: body_from_row(row)?,
                    },
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn fetch_article(&self, id: &str) -> Result<Option<ArticleDetail>, ContentError> {
        let id = id.to_string();
        self.read(move |conn| {
            // One snapshot for the row and its children.
            let tx = conn.unchecked_transaction()?;
            let sql =
                format!("SELECT {SUMMARY_COLUMNS}, {BODY_COLUMNS} FROM articles a WHERE a.id = ?1");
            let detail = tx
                .query_row(&sql, params![id], |row| {
                    Ok(ArticleDetail {
                        summary: summary_from_row(row)?,
                        body: body_from_row(row)?,
                        categories: Vec::new(),
                        related: Vec::new(),
                        media: Vec::new(),
                    })
                })
                .optional()?;
            let Some(mut detail) = detail else {
                return Ok(None);
            };

            let mut stmt = tx.prepare(
                "SELECT ac.category_id AS category_id, ac.sort_index AS sort_index,
                        COALESCE(c.sort_index, 0) AS category_sort_index,
                        c.name AS name, c.slug AS slug, c.color AS color
                 FROM article_categories ac
                 LEFT JOIN categories c ON c.id = ac.category_id
                 WHERE ac.article_id = ?1
                 ORDER BY ac.sort_index ASC, category_sort_index ASC",
            )?;
            detail.categories = stmt
                .query_map(params![id], |row| {
                    Ok(ArticleCategoryLink {
                        category_id: row.get("category_id")?,
                        sort_index: row.get("sort_index")?,
                        category_sort_index: row.get("category_sort_index")?,
                        name: row.get("name")?,
                        slug: row.get("slug")?,
                        color: row.get("color")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = tx.prepare(
                "SELECT related_article_id, sort_index FROM article_relations
                 WHERE article_id = ?1 ORDER BY sort_index ASC",
            )?;
            detail.related = stmt
                .query_map(params![id], |row| {
                    Ok(RelatedArticleRef {
                        article_id: row.get("related_article_id")?,
                        sort_index: row.get("sort_index")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = tx.prepare(
                "SELECT id, storage_path, caption, credit, alt_text, is_header, sort_index
                 FROM article_media WHERE article_id = ?1 ORDER BY sort_index ASC, id ASC",
            )?;
            detail.media = stmt
                .query_map(params![id], |row| {
                    Ok(MediaAttachment {
                        id: row.get("id")?,
                        storage_path: row.get("storage_path")?,
                        caption: row.get("caption")?,
                        credit: row.get("credit")?,
                        alt_text: row.get("alt_text")?,
                        is_header: row.get("is_header")?,
                        sort_index: row.get("sort_index")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Some(detail))
        })
        .await
    }
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleSummary> {
    Ok(ArticleSummary {
        id: row.get("id")?,
        slug: row.get("slug")?,
        title: row.get("title")?,
        author_name: row.get("author_name")?,
        status: row.get("status")?,
        authored_date: row.get("authored_date")?,
        published_at: row.get("published_at")?,
        updated_at: row.get("updated_at")?,
        created_at: row.get("created_at")?,
        preview: row.get("preview")?,
        excerpt: row.get("excerpt")?,
        header_image_path: row.get("header_image_path")?,
        sort_index: row.get("sort_index")?,
    })
}

fn body_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleBody> {
    Ok(ArticleBody {
        markdown: row.get("body_markdown")?,
        html: row.get("body_html")?,
        document: row.get("body_document")?,
    })
}

/// Stored media id: the given id, or `{article_id}-media-{position}` when blank.
fn media_id(article_id: &str, position: usize, media: &MediaAttachment) -> String {
    match media.id.trim() {
        "" => format!("{article_id}-media-{position}"),
        id => id.to_string(),
    }
}

fn validate_category(category: &CategoryRecord) -> Result<(), ContentError> {
    if category.id.trim().is_empty() {
        return Err(ContentError::validation("category id", "must not be empty"));
    }
    if category.name.trim().is_empty() {
        return Err(ContentError::validation("category name", "must not be empty"));
    }
    if category.slug.trim().is_empty() {
        return Err(ContentError::validation("category slug", "must not be empty"));
    }
    Ok(())
}

fn validate_article(detail: &ArticleDetail) -> Result<(), ContentError> {
    let summary = &detail.summary;
    if summary.id.trim().is_empty() {
        return Err(ContentError::validation("article id", "must not be empty"));
    }
    if summary.slug.trim().is_empty() {
        return Err(ContentError::validation("article slug", "must not be empty"));
    }
    if summary.title.trim().is_empty() {
        return Err(ContentError::validation("article title", "must not be empty"));
    }
    if let Some(document) = detail.body.document.as_deref() {
        validate_document(document)?;
    }
    if detail
        .related
        .iter()
        .any(|related| related.article_id.trim() == summary.id.trim())
    {
        return Err(ContentError::validation(
            "related articles",
            "an article cannot relate to itself",
        ));
    }
    let mut media_ids = HashSet::with_capacity(detail.media.len());
    for (position, media) in detail.media.iter().enumerate() {
        if media.storage_path.trim().is_empty() {
            return Err(ContentError::validation("media", "storage path must not be empty"));
        }
        if !media_ids.insert(media_id(summary.id.trim(), position, media)) {
            return Err(ContentError::validation(
                "media",
                format!("duplicate media id {}", media.id.trim()),
            ));
        }
    }
    Ok(())
}
