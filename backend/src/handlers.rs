use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use folio_shared::{
    content_store::ContentStore,
    loader::{find_category, load_categories},
    normalize_taxonomy_key,
    resolver::DetailResolver,
    Article, ArticlePage, Category, CategoryRecord, CategoryWithArticles, ContentError,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct AuthorArticlesResponse {
    pub author: String,
    pub articles: Vec<Article>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let loaded = load_categories(state.store())
        .await
        .map_err(|e| content_error("Failed to load categories", e))?;
    let categories: Vec<Category> = loaded
        .iter()
        .map(|entry| state.mapper().category(entry))
        .collect();

    Ok(Json(CategoryListResponse {
        total: categories.len(),
        categories,
    }))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let loaded = load_categories(state.store())
        .await
        .map_err(|e| content_error("Failed to load categories", e))?;

    match find_category(&loaded, &slug) {
        Some(entry) => Ok(Json(state.mapper().category(entry))),
        None => Err(not_found("Category not found")),
    }
}

pub async fn get_category_article(
    State(state): State<AppState>,
    Path((slug, article_slug)): Path<(String, String)>,
) -> Result<Json<ArticlePage>, ApiError> {
    let loaded = load_categories(state.store())
        .await
        .map_err(|e| content_error("Failed to load categories", e))?;
    let entry = find_category(&loaded, &slug).ok_or_else(|| not_found("Category not found"))?;
    let listed = entry
        .articles
        .iter()
        .find(|listed| {
            listed
                .summary
                .slug
                .trim()
                .eq_ignore_ascii_case(article_slug.trim())
        })
        .ok_or_else(|| not_found("Article not found"))?;

    build_page(
        &state,
        &listed.summary.id,
        &known_categories(&loaded),
        Some(&entry.category),
    )
    .await
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArticlePage>, ApiError> {
    let known = state
        .store()
        .fetch_categories()
        .await
        .map_err(|e| content_error("Failed to load categories", e))?;

    build_page(&state, &id, &known, None).await
}

pub async fn list_author_articles(
    State(state): State<AppState>,
    Path(author): Path<String>,
) -> Result<Json<AuthorArticlesResponse>, ApiError> {
    let key = normalize_taxonomy_key(&author);
    if key.is_empty() {
        return Err(not_found("Author not found"));
    }
    let loaded = load_categories(state.store())
        .await
        .map_err(|e| content_error("Failed to load categories", e))?;

    // An article listed in several categories shows up once, under the first.
    let mut articles: Vec<Article> = Vec::new();
    let mut display_name = None;
    for entry in &loaded {
        for listed in &entry.articles {
            let summary = &listed.summary;
            let Some(name) = summary.author_name.as_deref() else {
                continue;
            };
            if normalize_taxonomy_key(name) != key
                || articles.iter().any(|article| article.id == summary.id)
            {
                continue;
            }
            display_name.get_or_insert_with(|| name.trim().to_string());
            articles.push(state.mapper().article_from_listing(listed, &entry.category));
        }
    }

    let Some(author) = display_name else {
        return Err(not_found("Author not found"));
    };
    Ok(Json(AuthorArticlesResponse {
        author,
        total: articles.len(),
        articles,
    }))
}

/// Resolve one article and its related articles through a resolver scoped to
/// this request. `current` is the category the article was reached through.
async fn build_page(
    state: &AppState,
    id: &str,
    known: &[CategoryRecord],
    current: Option<&CategoryRecord>,
) -> Result<Json<ArticlePage>, ApiError> {
    let resolver = DetailResolver::new(state.store());
    let detail = resolver
        .resolve(id)
        .await
        .map_err(|e| content_error("Failed to fetch article", e))?
        .ok_or_else(|| not_found("Article not found"))?;
    let related = resolver
        .resolve_related(&detail)
        .await
        .map_err(|e| content_error("Failed to fetch related articles", e))?;
    tracing::debug!("resolved article {id} with {} lookups", resolver.cached_len());

    let page = match current {
        Some(category) => state
            .mapper()
            .page_in_category(&detail, known, &related, category),
        None => state.mapper().page(&detail, known, &related),
    };
    Ok(Json(page))
}

fn known_categories(loaded: &[CategoryWithArticles]) -> Vec<CategoryRecord> {
    loaded.iter().map(|entry| entry.category.clone()).collect()
}

fn not_found(message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: 404,
        }),
    )
}

/// Missing store configuration degrades to 503 so the page can say so; any
/// other store failure is a 500.
fn content_error(message: &str, err: ContentError) -> ApiError {
    if err.is_configuration() {
        tracing::warn!("{}: {}", message, err);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Content is temporarily unavailable".to_string(),
                code: 503,
            }),
        );
    }
    internal_error(message, err)
}

fn internal_error(message: &str, err: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", message, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
            code: 500,
        }),
    )
}
