//! Handlers for `/snippets` endpoints.
//!
//! | Method   | Path | Caller | Notes |
//! |----------|------|--------|-------|
//! | `POST`   | `/snippets` | required | 201 + snippet |
//! | `GET`    | `/snippets/{id}` | optional | 403 on someone else's private snippet |
//! | `PUT`    | `/snippets/{id}` | required | 404 unless the caller is the author |
//! | `DELETE` | `/snippets/{id}` | required | 204; 404 unless the caller is the author |
//! | `GET`    | `/snippets/public/{id}` | none | private snippets are 404 |
//! | `GET`    | `/snippets/public`, `/search`, `/popular`, `/recent` | none | public only |
//! | `GET`    | `/snippets/language/{language}`, `/user/{username}` | none | public only |
//! | `GET`    | `/snippets/my`, `/my/search` | required | every visibility |
//! | `GET`    | `/snippets/languages`, `/tags` | none | distinct values over public snippets |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use snipper_core::{
  page::Page,
  snippet::{Snippet, SnippetDraft, SnippetId, SnippetSummary},
  store::SnippetFilter,
};

use crate::{
  AppState, Backend,
  auth::{AuthUser, Viewer},
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
  params::{PageParams, SearchParams, SortParams},
};

type Listing = Json<Page<SnippetSummary>>;

fn listing(page: Page<Snippet>) -> Listing { Json(page.map(SnippetSummary::from)) }

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// `POST /snippets`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  JsonBody(draft): JsonBody<SnippetDraft>,
) -> Result<impl IntoResponse, ApiError> {
  let snippet = state.snippets.create(&who, draft).await?;
  Ok((StatusCode::CREATED, Json(snippet)))
}

/// `GET /snippets/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  PathParam(id): PathParam<SnippetId>,
) -> Result<Json<Snippet>, ApiError> {
  Ok(Json(state.snippets.get(id, viewer.identity()).await?))
}

/// `GET /snippets/public/{id}`
pub async fn get_public<S: Backend>(
  State(state): State<AppState<S>>,
  PathParam(id): PathParam<SnippetId>,
) -> Result<Json<Snippet>, ApiError> {
  Ok(Json(state.snippets.get_public(id).await?))
}

/// `PUT /snippets/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  PathParam(id): PathParam<SnippetId>,
  JsonBody(draft): JsonBody<SnippetDraft>,
) -> Result<Json<Snippet>, ApiError> {
  Ok(Json(state.snippets.update(&who, id, draft).await?))
}

/// `DELETE /snippets/{id}`
pub async fn remove<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  PathParam(id): PathParam<SnippetId>,
) -> Result<StatusCode, ApiError> {
  state.snippets.delete(&who, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Public enumeration ──────────────────────────────────────────────────────

/// `GET /snippets/public`
pub async fn list_public<S: Backend>(
  State(state): State<AppState<S>>,
  QueryParams(page): QueryParams<PageParams>,
  QueryParams(sort): QueryParams<SortParams>,
) -> Result<Listing, ApiError> {
  let result = state
    .snippets
    .list_public(SnippetFilter::default(), sort.order()?, page.request())
    .await?;
  Ok(listing(result))
}

/// `GET /snippets/search?q=&language=&tags=`
///
/// A `visibility` parameter is accepted but cannot widen the result beyond
/// public snippets.
pub async fn search_public<S: Backend>(
  State(state): State<AppState<S>>,
  QueryParams(page): QueryParams<PageParams>,
  QueryParams(sort): QueryParams<SortParams>,
  QueryParams(search): QueryParams<SearchParams>,
) -> Result<Listing, ApiError> {
  let result = state
    .snippets
    .list_public(search.filter()?, sort.order()?, page.request())
    .await?;
  Ok(listing(result))
}

/// `GET /snippets/popular`
pub async fn popular<S: Backend>(
  State(state): State<AppState<S>>,
  QueryParams(page): QueryParams<PageParams>,
) -> Result<Listing, ApiError> {
  Ok(listing(state.snippets.popular(page.request()).await?))
}

/// `GET /snippets/recent`
pub async fn recent<S: Backend>(
  State(state): State<AppState<S>>,
  QueryParams(page): QueryParams<PageParams>,
) -> Result<Listing, ApiError> {
  Ok(listing(state.snippets.recent(page.request()).await?))
}

/// `GET /snippets/language/{language}`
pub async fn by_language<S: Backend>(
  State(state): State<AppState<S>>,
  PathParam(language): PathParam<String>,
  QueryParams(page): QueryParams<PageParams>,
) -> Result<Listing, ApiError> {
  Ok(listing(state.snippets.by_language(&language, page.request()).await?))
}

/// `GET /snippets/user/{username}`
pub async fn by_user<S: Backend>(
  State(state): State<AppState<S>>,
  PathParam(username): PathParam<String>,
  QueryParams(page): QueryParams<PageParams>,
  QueryParams(sort): QueryParams<SortParams>,
) -> Result<Listing, ApiError> {
  let result = state
    .snippets
    .public_by_username(&username, sort.order()?, page.request())
    .await?;
  Ok(listing(result))
}

/// `GET /snippets/languages`
pub async fn languages<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
  Ok(Json(state.snippets.languages().await?))
}

/// `GET /snippets/tags`
pub async fn tags<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
  Ok(Json(state.snippets.tags().await?))
}

// ─── Own snippets ────────────────────────────────────────────────────────────

/// `GET /snippets/my`
pub async fn list_mine<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  QueryParams(page): QueryParams<PageParams>,
  QueryParams(sort): QueryParams<SortParams>,
) -> Result<Listing, ApiError> {
  let result = state
    .snippets
    .list_mine(&who, SnippetFilter::default(), sort.order()?, page.request())
    .await?;
  Ok(listing(result))
}

/// `GET /snippets/my/search?q=&language=&tags=&visibility=`
pub async fn search_mine<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  QueryParams(page): QueryParams<PageParams>,
  QueryParams(sort): QueryParams<SortParams>,
  QueryParams(search): QueryParams<SearchParams>,
) -> Result<Listing, ApiError> {
  let result = state
    .snippets
    .list_mine(&who, search.filter()?, sort.order()?, page.request())
    .await?;
  Ok(listing(result))
}
