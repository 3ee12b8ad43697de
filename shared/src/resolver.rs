//! Article detail lookups for a single request.
//!
//! A [`DetailResolver`] memoizes every lookup it performs, keyed by article
//! id, so an article that shows up twice while one page is built (say as a
//! listing entry and as a related article) is fetched once. The memo lives
//! exactly as long as the resolver; build one per request.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::{content_store::ContentStore, error::ContentError, ArticleDetail};

type Slot = Arc<OnceCell<Option<Arc<ArticleDetail>>>>;

pub struct DetailResolver<'s, S: ContentStore + ?Sized> {
    store: &'s S,
    include_drafts: bool,
    cache: Mutex<HashMap<String, Slot>>,
}

impl<'s, S: ContentStore + ?Sized> DetailResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            include_drafts: false,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Also return unpublished articles (editorial inspection).
    pub fn including_drafts(mut self) -> Self {
        self.include_drafts = true;
        self
    }

    /// Fetch an article with its collections in display order.
    ///
    /// `Ok(None)` when the article does not exist or is unpublished. Store
    /// failures are returned as-is and are not memoized, so a later call for
    /// the same id tries again.
    pub async fn resolve(&self, id: &str) -> Result<Option<Arc<ArticleDetail>>, ContentError> {
        let slot = {
            let mut cache = self.cache.lock();
            cache.entry(id.to_string()).or_default().clone()
        };

        let detail = slot
            .get_or_try_init(|| async {
                tracing::debug!("fetching article {id}");
                let fetched = self.store.fetch_article(id).await?;
                Ok::<_, ContentError>(fetched.map(normalize_detail).map(Arc::new))
            })
            .await?;

        Ok(detail
            .as_ref()
            .filter(|detail| self.include_drafts || detail.summary.status)
            .cloned())
    }

    /// Resolve the related articles of `detail` in relation order.
    ///
    /// Lookups run concurrently through the same memo. Missing or unpublished
    /// targets, duplicates and self references are skipped.
    pub async fn resolve_related(
        &self,
        detail: &ArticleDetail,
    ) -> Result<Vec<Arc<ArticleDetail>>, ContentError> {
        let mut ids: Vec<&str> = Vec::with_capacity(detail.related.len());
        for related in &detail.related {
            let id = related.article_id.as_str();
            if id != detail.summary.id && !ids.contains(&id) {
                ids.push(id);
            }
        }

        let lookups = futures::future::join_all(ids.into_iter().map(|id| self.resolve(id))).await;
        let mut resolved = Vec::with_capacity(lookups.len());
        for lookup in lookups {
            if let Some(related) = lookup? {
                resolved.push(related);
            }
        }
        Ok(resolved)
    }

    /// Number of distinct ids looked up so far.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}

/// Put nested collections in display order: categories by link sort index
/// then category sort index, relations and media by their sort index.
fn normalize_detail(mut detail: ArticleDetail) -> ArticleDetail {
    detail.categories.sort_by(|a, b| {
        a.sort_index
            .cmp(&b.sort_index)
            .then_with(|| a.category_sort_index.cmp(&b.category_sort_index))
    });
    detail.related.sort_by_key(|related| related.sort_index);
    detail.media.sort_by_key(|media| media.sort_index);
    detail
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        content_store::{CategoryArticleRow, MemoryContentStore},
        ArticleCategoryLink, ArticleSummary, CategoryRecord, MediaAttachment, RelatedArticleRef,
    };

    struct CountingStore {
        inner: MemoryContentStore,
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ContentStore for CountingStore {
        async fn fetch_categories(&self) -> Result<Vec<CategoryRecord>, ContentError> {
            self.inner.fetch_categories().await
        }

        async fn fetch_category_articles(&self) -> Result<Vec<CategoryArticleRow>, ContentError> {
            self.inner.fetch_category_articles().await
        }

        async fn fetch_article(&self, id: &str) -> Result<Option<ArticleDetail>, ContentError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ContentError::Configuration("store offline".to_string()));
            }
            self.inner.fetch_article(id).await
        }
    }

    fn detail(id: &str, status: bool, related: &[&str]) -> ArticleDetail {
        ArticleDetail {
            summary: ArticleSummary {
                id: id.to_string(),
                slug: id.to_string(),
                title: id.to_uppercase(),
                status,
                ..ArticleSummary::default()
            },
            related: related
                .iter()
                .enumerate()
                .map(|(index, target)| RelatedArticleRef {
                    article_id: target.to_string(),
                    sort_index: 10 - index as i64,
                })
                .collect(),
            ..ArticleDetail::default()
        }
    }

    fn counting(articles: Vec<ArticleDetail>, fail: bool) -> CountingStore {
        CountingStore {
            inner: MemoryContentStore::new(vec![], articles),
            fetches: AtomicUsize::new(0),
            fail,
        }
    }

    #[tokio::test]
    async fn repeated_lookups_hit_the_store_once() {
        let store = counting(vec![detail("a1", true, &["a2"]), detail("a2", true, &[])], false);
        let resolver = DetailResolver::new(&store);

        let first = resolver.resolve("a1").await.expect("resolve").expect("a1");
        let again = resolver.resolve("a1").await.expect("resolve").expect("a1");
        assert!(Arc::ptr_eq(&first, &again));
        assert!(resolver.resolve("nope").await.expect("resolve").is_none());
        assert!(resolver.resolve("nope").await.expect("resolve").is_none());
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);

        // A fresh resolver (next request) fetches again.
        let next_request = DetailResolver::new(&store);
        next_request.resolve("a1").await.expect("resolve");
        assert_eq!(store.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn related_articles_share_the_request_memo() {
        let store = counting(
            vec![
                detail("a1", true, &["a2", "a3", "a1", "a2", "missing"]),
                detail("a2", true, &[]),
                detail("a3", false, &[]),
            ],
            false,
        );
        let resolver = DetailResolver::new(&store);
        resolver.resolve("a2").await.expect("resolve");

        let a1 = resolver.resolve("a1").await.expect("resolve").expect("a1");
        let related = resolver.resolve_related(&a1).await.expect("related");
        let ids: Vec<&str> = related.iter().map(|d| d.summary.id.as_str()).collect();
        assert_eq!(ids, vec!["a2"]);
        // a2, a1, then a3 and missing; a2 came from the memo.
        assert_eq!(store.fetches.load(Ordering::SeqCst), 4);
        assert_eq!(resolver.cached_len(), 4);
    }

    #[tokio::test]
    async fn drafts_are_hidden_unless_requested() {
        let store = counting(vec![detail("draft", false, &[])], false);
        assert!(DetailResolver::new(&store)
            .resolve("draft")
            .await
            .expect("resolve")
            .is_none());
        let found = DetailResolver::new(&store)
            .including_drafts()
            .resolve("draft")
            .await
            .expect("resolve");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn collections_come_back_in_display_order() {
        let mut unordered = detail("a1", true, &["x", "y"]);
        unordered.categories = vec![
            ArticleCategoryLink {
                category_id: "late".to_string(),
                sort_index: 1,
                category_sort_index: 0,
                ..ArticleCategoryLink::default()
            },
            ArticleCategoryLink {
                category_id: "second".to_string(),
                sort_index: 0,
                category_sort_index: 9,
                ..ArticleCategoryLink::default()
            },
            ArticleCategoryLink {
                category_id: "first".to_string(),
                sort_index: 0,
                category_sort_index: 1,
                ..ArticleCategoryLink::default()
            },
        ];
        unordered.media = vec![
            MediaAttachment {
                id: "m2".to_string(),
                sort_index: 2,
                ..MediaAttachment::default()
            },
            MediaAttachment {
                id: "m1".to_string(),
                sort_index: 1,
                ..MediaAttachment::default()
            },
        ];
        let store = counting(vec![unordered], false);
        let resolved = DetailResolver::new(&store)
            .resolve("a1")
            .await
            .expect("resolve")
            .expect("a1");

        let categories: Vec<&str> = resolved
            .categories
            .iter()
            .map(|c| c.category_id.as_str())
            .collect();
        assert_eq!(categories, vec!["first", "second", "late"]);
        let related: Vec<&str> = resolved.related.iter().map(|r| r.article_id.as_str()).collect();
        assert_eq!(related, vec!["y", "x"]);
        let media: Vec<&str> = resolved.media.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(media, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn failures_propagate_and_are_not_memoized() {
        let store = counting(vec![detail("a1", true, &[])], true);
        let resolver = DetailResolver::new(&store);
        assert!(resolver.resolve("a1").await.is_err());
        assert!(resolver.resolve("a1").await.is_err());
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
    }
}
