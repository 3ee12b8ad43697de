use std::{cmp::Ordering, collections::HashMap};

use crate::{
    content_store::ContentStore, error::ContentError, normalize_taxonomy_key,
    timestamp::parse_timestamp, ArticleSummary, CategoryWithArticles, ListedArticle,
};

/// Load every category with its published articles in display order.
///
/// Categories come back in store order (sort index, then name). Within a
/// category, articles are ordered by [`compare_summaries`]. Unpublished
/// articles are dropped on every call, so a demoted article disappears on the
/// next request.
pub async fn load_categories<S>(store: &S) -> Result<Vec<CategoryWithArticles>, ContentError>
where
    S: ContentStore + ?Sized,
{
    let (categories, links) =
        futures::try_join!(store.fetch_categories(), store.fetch_category_articles())?;

    let mut grouped: HashMap<String, Vec<ListedArticle>> = HashMap::new();
    let mut hidden = 0usize;
    for link in links {
        if !link.article.summary.status {
            hidden += 1;
            continue;
        }
        grouped
            .entry(link.category_id)
            .or_default()
            .push(link.article);
    }

    let mut loaded = Vec::with_capacity(categories.len());
    for category in categories {
        let mut articles = grouped.remove(&category.id).unwrap_or_default();
        articles.sort_by(|a, b| compare_summaries(&a.summary, &b.summary));
        loaded.push(CategoryWithArticles {
            category,
            articles,
        });
    }

    for (category_id, orphans) in &grouped {
        tracing::debug!(
            "skipping {} article link(s) to unknown category {category_id}",
            orphans.len()
        );
    }
    tracing::debug!("loaded {} categories ({hidden} unpublished links hidden)", loaded.len());
    Ok(loaded)
}

/// Find a loaded category by slug, ignoring case and separator style.
pub fn find_category<'a>(
    categories: &'a [CategoryWithArticles],
    slug: &str,
) -> Option<&'a CategoryWithArticles> {
    let key = normalize_taxonomy_key(slug);
    if key.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|entry| normalize_taxonomy_key(&entry.category.slug) == key)
}

/// Listing order: sort index ascending, newest published first (articles
/// without a usable timestamp last), then title.
pub fn compare_summaries(a: &ArticleSummary, b: &ArticleSummary) -> Ordering {
    a.sort_index
        .cmp(&b.sort_index)
        .then_with(|| {
            let a_published = a.published_at.as_deref().and_then(parse_timestamp);
            let b_published = b.published_at.as_deref().and_then(parse_timestamp);
            match (a_published, b_published) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
        .then_with(|| compare_titles(&a.title, &b.title))
        .then_with(|| a.id.cmp(&b.id))
}

/// Case-insensitive title comparison with a byte-order tie break.
fn compare_titles(a: &str, b: &str) -> Ordering {
    let folded_a = a.trim().to_lowercase();
    let folded_b = b.trim().to_lowercase();
    folded_a.cmp(&folded_b).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content_store::MemoryContentStore, ArticleCategoryLink, ArticleDetail, CategoryRecord,
    };

    fn category(id: &str, sort_index: i64) -> CategoryRecord {
        CategoryRecord {
            id: id.to_string(),
            name: format!("Category {id}"),
            color: "#ffffff".to_string(),
            slug: format!("category-{id}"),
            sort_index,
        }
    }

    fn article(
        id: &str,
        title: &str,
        sort_index: i64,
        published_at: Option<&str>,
    ) -> ArticleSummary {
        ArticleSummary {
            id: id.to_string(),
            slug: id.to_string(),
            title: title.to_string(),
            status: true,
            published_at: published_at.map(str::to_string),
            sort_index,
            ..ArticleSummary::default()
        }
    }

    fn linked(summary: ArticleSummary, category_ids: &[&str]) -> ArticleDetail {
        ArticleDetail {
            summary,
            categories: category_ids
                .iter()
                .map(|id| ArticleCategoryLink {
                    category_id: id.to_string(),
                    ..ArticleCategoryLink::default()
                })
                .collect(),
            ..ArticleDetail::default()
        }
    }

    fn ids(entry: &CategoryWithArticles) -> Vec<&str> {
        entry.articles.iter().map(|a| a.summary.id.as_str()).collect()
    }

    #[tokio::test]
    async fn sort_index_ties_break_by_date_then_title() {
        let same_day = Some("2024-05-01T09:00:00Z");
        let store = MemoryContentStore::new(
            vec![category("c1", 0)],
            vec![
                linked(article("a", "Zebra", 2, same_day), &["c1"]),
                linked(article("b", "beta", 1, same_day), &["c1"]),
                linked(article("c", "Alpha", 1, same_day), &["c1"]),
            ],
        );

        let first = load_categories(&store).await.expect("load");
        assert_eq!(ids(&first[0]), vec!["c", "b", "a"]);
        for _ in 0..5 {
            assert_eq!(load_categories(&store).await.expect("load"), first);
        }
    }

    #[tokio::test]
    async fn newer_articles_come_first_within_a_sort_index() {
        let store = MemoryContentStore::new(
            vec![category("c1", 0)],
            vec![
                linked(article("old", "A", 0, Some("2023-01-01")), &["c1"]),
                linked(article("undated", "B", 0, None), &["c1"]),
                linked(article("new", "C", 0, Some("2024-01-01 08:00:00")), &["c1"]),
            ],
        );

        let loaded = load_categories(&store).await.expect("load");
        assert_eq!(ids(&loaded[0]), vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn unpublished_articles_never_appear() {
        let mut draft = article("draft", "Draft", 0, None);
        draft.status = false;
        let store = MemoryContentStore::new(
            vec![category("c1", 1), category("c2", 0)],
            vec![
                linked(draft, &["c1", "c2"]),
                linked(article("live", "Live", 0, None), &["c1", "unknown"]),
            ],
        );

        let loaded = load_categories(&store).await.expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].category.id, "c2");
        assert!(loaded[0].articles.is_empty());
        assert_eq!(ids(&loaded[1]), vec!["live"]);
        assert!(loaded
            .iter()
            .flat_map(|entry| &entry.articles)
            .all(|listed| listed.summary.status));
    }

    #[tokio::test]
    async fn listed_articles_keep_their_body() {
        let mut detail = linked(article("a1", "A", 0, None), &["c1"]);
        detail.body.markdown = Some("Opening line. Second line.".to_string());
        let store = MemoryContentStore::new(vec![category("c1", 0)], vec![detail]);

        let loaded = load_categories(&store).await.expect("load");
        let body = &loaded[0].articles[0].body;
        assert_eq!(body.markdown.as_deref(), Some("Opening line. Second line."));
    }

    #[tokio::test]
    async fn categories_are_found_by_normalized_slug() {
        let store = MemoryContentStore::new(vec![category("c1", 0)], vec![]);
        let loaded = load_categories(&store).await.expect("load");
        assert!(find_category(&loaded, "Category_C1").is_some());
        assert!(find_category(&loaded, "category-c2").is_none());
        assert!(find_category(&loaded, "  ").is_none());
    }
}
