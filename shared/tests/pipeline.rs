#[cfg(test)]
mod tests {
    use anyhow::{Context, Result};
    use folio_shared::{
        loader::{find_category, load_categories},
        mapper::ViewMapper,
        media::MediaResolver,
        preview::PreviewOptions,
        resolver::DetailResolver,
        sqlite_store::SqliteContentStore,
        ArticleBody, ArticleCategoryLink, ArticleDetail, ArticleSummary, CategoryRecord,
        MediaAttachment, RelatedArticleRef, UNKNOWN_DATE,
    };
    use tempfile::TempDir;

    const BODY: &str = "# Title\n\nSome *intro* sentence. Second sentence here.\n\n\
                        ![img](x.png)\n\nMore text.";

    fn category(id: &str, name: &str, sort_index: i64) -> CategoryRecord {
        CategoryRecord {
            id: id.to_string(),
            name: name.to_string(),
            color: "#336699".to_string(),
            slug: name.to_lowercase(),
            sort_index,
        }
    }

    fn link(category_id: &str, sort_index: i64) -> ArticleCategoryLink {
        ArticleCategoryLink {
            category_id: category_id.to_string(),
            sort_index,
            ..ArticleCategoryLink::default()
        }
    }

    fn article(id: &str, status: bool, published_at: Option<&str>) -> ArticleDetail {
        ArticleDetail {
            summary: ArticleSummary {
                id: id.to_string(),
                slug: id.to_string(),
                title: format!("Article {id}"),
                status,
                published_at: published_at.map(str::to_string),
                ..ArticleSummary::default()
            },
            ..ArticleDetail::default()
        }
    }

    async fn seeded_store() -> Result<(TempDir, SqliteContentStore)> {
        let dir = tempfile::tempdir().context("tempdir")?;
        let store = SqliteContentStore::new(Some(dir.path().join("folio.db")));
        store.init_schema().await?;
        store.upsert_category(category("c1", "News", 0)).await?;
        store.upsert_category(category("c2", "Culture", 1)).await?;

        let mut lead = article("lead", true, Some("2024-03-04T10:00:00Z"));
        lead.summary.author_name = Some("Ada".to_string());
        lead.summary.header_image_path = Some("covers/ignored.jpg".to_string());
        lead.body = ArticleBody {
            markdown: Some(BODY.to_string()),
            ..ArticleBody::default()
        };
        lead.categories = vec![link("c1", 1), link("c2", 0)];
        lead.related = vec![
            RelatedArticleRef {
                article_id: "draft".to_string(),
                sort_index: 0,
            },
            RelatedArticleRef {
                article_id: "second".to_string(),
                sort_index: 1,
            },
        ];
        lead.media = vec![
            MediaAttachment {
                id: String::new(),
                storage_path: "gallery/one.jpg".to_string(),
                sort_index: 0,
                ..MediaAttachment::default()
            },
            MediaAttachment {
                id: String::new(),
                storage_path: "heroes/lead.jpg".to_string(),
                is_header: true,
                sort_index: 1,
                ..MediaAttachment::default()
            },
        ];
        store.upsert_article(lead).await?;

        let mut second = article("second", true, None);
        second.summary.preview = Some("Hand-written teaser.".to_string());
        second.categories = vec![link("c1", 0)];
        store.upsert_article(second).await?;

        let mut draft = article("draft", false, Some("2024-05-01"));
        draft.categories = vec![link("c1", 0)];
        store.upsert_article(draft).await?;

        Ok((dir, store))
    }

    fn mapper() -> ViewMapper {
        ViewMapper::new(
            MediaResolver::new("https://cdn.example.com/media"),
            PreviewOptions::default(),
        )
    }

    #[tokio::test]
    async fn listing_pipeline_reads_current_rows() -> Result<()> {
        let (_dir, store) = seeded_store().await?;

        let loaded = load_categories(&store).await?;
        let news = find_category(&loaded, "news").context("news category")?;
        let ids: Vec<&str> = news
            .articles
            .iter()
            .map(|a| a.summary.id.as_str())
            .collect();
        assert_eq!(ids, vec!["lead", "second"]);

        let mapped = mapper().category(news);
        assert_eq!(mapped.articles[0].date, "March 4, 2024");
        assert_eq!(
            mapped.articles[0].preview,
            "Some *intro* sentence. Second sentence here."
        );
        assert_eq!(mapped.articles[1].date, UNKNOWN_DATE);
        assert_eq!(mapped.articles[1].preview, "Hand-written teaser.");

        // Demoting an article hides it on the very next load.
        let mut demoted = article("second", false, None);
        demoted.categories = vec![link("c1", 0)];
        store.upsert_article(demoted).await?;
        let reloaded = load_categories(&store).await?;
        let news = find_category(&reloaded, "news").context("news category")?;
        assert_eq!(news.articles.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn detail_pipeline_builds_a_complete_page() -> Result<()> {
        let (_dir, store) = seeded_store().await?;
        let known = load_categories(&store)
            .await?
            .into_iter()
            .map(|entry| entry.category)
            .collect::<Vec<_>>();

        let resolver = DetailResolver::new(&store);
        let lead = resolver.resolve("lead").await?.context("lead article")?;
        let related = resolver.resolve_related(&lead).await?;
        assert!(resolver.resolve("draft").await?.is_none());

        let page = mapper().page(&lead, &known, &related);
        assert_eq!(page.article.preview, "Some *intro* sentence. Second sentence here.");
        assert_eq!(
            page.article.header_image_url,
            "https://cdn.example.com/media/heroes/lead.jpg"
        );
        assert_eq!(page.article.category_slug, "culture");
        assert_eq!(page.article.author, "Ada");
        assert_eq!(page.article.media_urls.len(), 2);
        let categories: Vec<&str> = page.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(categories, vec!["culture", "news"]);
        let related: Vec<&str> = page.related.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(related, vec!["second"]);
        assert!(page.body_html.contains("<em>intro</em>"));
        Ok(())
    }
}
