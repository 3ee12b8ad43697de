use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::ContentError, ArticleDetail, CategoryRecord, ListedArticle};

/// Category-to-article link row with the linked article's summary and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryArticleRow {
    pub category_id: String,
    pub article: ListedArticle,
}

/// Read surface of the relational content store.
///
/// Implementations return rows as stored; publication filtering and ordering
/// guarantees are applied by [`crate::loader`] and [`crate::resolver`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<CategoryRecord>, ContentError>;

    /// Every category link, each carrying the linked article's summary fields
    /// and body columns.
    async fn fetch_category_articles(&self) -> Result<Vec<CategoryArticleRow>, ContentError>;

    /// The article row joined with its category links, relations and media.
    async fn fetch_article(&self, id: &str) -> Result<Option<ArticleDetail>, ContentError>;
}

/// Content fixture as stored in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFixture {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub articles: Vec<ArticleDetail>,
}

/// In-process store over a fixed set of rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    fixture: ContentFixture,
}

impl MemoryContentStore {
    pub fn new(categories: Vec<CategoryRecord>, articles: Vec<ArticleDetail>) -> Self {
        Self {
            fixture: ContentFixture {
                categories,
                articles,
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let fixture: ContentFixture = serde_json::from_str(json)?;
        Ok(Self {
            fixture,
        })
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch_categories(&self) -> Result<Vec<CategoryRecord>, ContentError> {
        let mut categories = self.fixture.categories.clone();
        categories.sort_by(|a, b| {
            a.sort_index
                .cmp(&b.sort_index)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }

    async fn fetch_category_articles(&self) -> Result<Vec<CategoryArticleRow>, ContentError> {
        Ok(self
            .fixture
            .articles
            .iter()
            .flat_map(|detail| {
                detail.categories.iter().map(move |link| CategoryArticleRow {
                    category_id: link.category_id.clone(),
                    article: ListedArticle {
                        summary: detail.summary.clone(),
                        body: detail.body.clone(),
                    },
                })
            })
            .collect())
    }

    async fn fetch_article(&self, id: &str) -> Result<Option<ArticleDetail>, ContentError> {
        let Some(detail) = self
            .fixture
            .articles
            .iter()
            .find(|detail| detail.summary.id == id)
        else {
            return Ok(None);
        };

        // Fill link display fields the way the SQL join does.
        let mut detail = detail.clone();
        for link in &mut detail.categories {
            if let Some(category) = self
                .fixture
                .categories
                .iter()
                .find(|category| category.id == link.category_id)
            {
                link.name.get_or_insert_with(|| category.name.clone());
                link.slug.get_or_insert_with(|| category.slug.clone());
                link.color.get_or_insert_with(|| category.color.clone());
                link.category_sort_index = category.sort_index;
            }
        }
        Ok(Some(detail))
    }
}
