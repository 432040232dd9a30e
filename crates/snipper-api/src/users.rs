//! Handlers for `/users` endpoints.
//!
//! | Method   | Path | Caller |
//! |----------|------|--------|
//! | `GET`    | `/users/profile` | required |
//! | `PUT`    | `/users/profile` | required |
//! | `GET`    | `/users/dashboard` | required |
//! | `GET`    | `/users/snippets?visibility=&language=&search=` | required |
//! | `DELETE` | `/users/snippets/{id}` | required |
//! | `GET`    | `/users/{username}/profile` | none |
//! | `GET`    | `/users/{username}/snippets` | none |

use axum::{Json, extract::State, http::StatusCode};
use snipper_core::{
  account::Dashboard,
  page::Page,
  snippet::{SnippetId, SnippetSummary},
  user::{ProfileUpdate, User},
};

use crate::{
  AppState, Backend,
  auth::AuthUser,
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
  params::{OwnSnippetParams, PageParams, SortParams},
};

/// `GET /users/profile`
pub async fn profile<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
) -> Result<Json<User>, ApiError> {
  Ok(Json(state.accounts.profile(&who).await?))
}

/// `PUT /users/profile`
pub async fn update_profile<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
  Ok(Json(state.accounts.update_profile(&who, update).await?))
}

/// `GET /users/dashboard`
pub async fn dashboard<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
) -> Result<Json<Dashboard>, ApiError> {
  Ok(Json(state.accounts.dashboard(&who).await?))
}

/// `GET /users/snippets`
pub async fn my_snippets<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  QueryParams(filter): QueryParams<OwnSnippetParams>,
  QueryParams(page): QueryParams<PageParams>,
  QueryParams(sort): QueryParams<SortParams>,
) -> Result<Json<Page<SnippetSummary>>, ApiError> {
  let result = state
    .snippets
    .list_mine(&who, filter.filter()?, sort.order()?, page.request())
    .await?;
  Ok(Json(result.map(SnippetSummary::from)))
}

/// `DELETE /users/snippets/{id}`
pub async fn delete_snippet<S: Backend>(
  State(state): State<AppState<S>>,
  AuthUser(who): AuthUser,
  PathParam(id): PathParam<SnippetId>,
) -> Result<StatusCode, ApiError> {
  state.snippets.delete(&who, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{username}/profile`
pub async fn public_profile<S: Backend>(
  State(state): State<AppState<S>>,
  PathParam(username): PathParam<String>,
) -> Result<Json<User>, ApiError> {
  Ok(Json(state.accounts.public_profile(&username).await?))
}

/// `GET /users/{username}/snippets`
pub async fn public_snippets<S: Backend>(
  State(state): State<AppState<S>>,
  PathParam(username): PathParam<String>,
  QueryParams(page): QueryParams<PageParams>,
  QueryParams(sort): QueryParams<SortParams>,
) -> Result<Json<Page<SnippetSummary>>, ApiError> {
  let result = state
    .snippets
    .public_by_username(&username, sort.order()?, page.request())
    .await?;
  Ok(Json(result.map(SnippetSummary::from)))
}
