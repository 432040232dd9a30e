//! JSON REST API for Snipper.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`SnippetStore`] and [`UserStore`]. TLS and process concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = snipper_api::app(state, true);
//! axum::serve(listener, app).await?;
//! ```

pub mod accounts;
pub mod auth;
pub mod error;
pub mod extract;
pub mod params;
pub mod password;
pub mod snippets;
pub mod token;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use snipper_core::{
  account::AccountService,
  service::SnippetService,
  store::{SnippetStore, UserStore},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;
use password::Argon2Hasher;
use token::TokenIssuer;

// ─── Application state ───────────────────────────────────────────────────────

/// Everything the handlers need: a store that holds both snippets and users.
pub trait Backend: SnippetStore + UserStore + 'static {}

impl<T: SnippetStore + UserStore + 'static> Backend for T {}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub snippets: SnippetService<S>,
  pub accounts: AccountService<S, Argon2Hasher>,
  pub tokens:   Arc<TokenIssuer>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      snippets: self.snippets.clone(),
      accounts: self.accounts.clone(),
      tokens:   Arc::clone(&self.tokens),
    }
  }
}

impl<S: Backend> AppState<S> {
  pub fn new(store: Arc<S>, hasher: Argon2Hasher, tokens: TokenIssuer) -> Self {
    Self {
      snippets: SnippetService::new(Arc::clone(&store)),
      accounts: AccountService::new(store, Arc::new(hasher)),
      tokens:   Arc::new(tokens),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`. Paths are relative; mount under `/api`.
///
/// Static segments (`/snippets/public`, `/snippets/my`, ...) take precedence
/// over the `{id}` capture.
pub fn api_router<S: Backend>(state: AppState<S>) -> Router<()> {
  Router::new()
    // Auth
    .route("/auth/register", post(accounts::register::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/refresh", post(accounts::refresh::<S>))
    .route("/auth/logout", post(accounts::logout))
    .route("/auth/health", get(accounts::health))
    // Snippets
    .route("/snippets", post(snippets::create::<S>))
    .route(
      "/snippets/{id}",
      get(snippets::get_one::<S>)
        .put(snippets::update::<S>)
        .delete(snippets::remove::<S>),
    )
    .route("/snippets/public", get(snippets::list_public::<S>))
    .route("/snippets/public/{id}", get(snippets::get_public::<S>))
    .route("/snippets/search", get(snippets::search_public::<S>))
    .route("/snippets/my", get(snippets::list_mine::<S>))
    .route("/snippets/my/search", get(snippets::search_mine::<S>))
    .route("/snippets/popular", get(snippets::popular::<S>))
    .route("/snippets/recent", get(snippets::recent::<S>))
    .route("/snippets/language/{language}", get(snippets::by_language::<S>))
    .route("/snippets/languages", get(snippets::languages::<S>))
    .route("/snippets/tags", get(snippets::tags::<S>))
    .route("/snippets/user/{username}", get(snippets::by_user::<S>))
    // Users
    .route("/users/profile", get(users::profile::<S>).put(users::update_profile::<S>))
    .route("/users/dashboard", get(users::dashboard::<S>))
    .route("/users/snippets", get(users::my_snippets::<S>))
    .route("/users/snippets/{id}", delete(users::delete_snippet::<S>))
    .route("/users/{username}/profile", get(users::public_profile::<S>))
    .route("/users/{username}/snippets", get(users::public_snippets::<S>))
    .with_state(state)
}

/// The complete HTTP application: [`api_router`] nested under `/api`, with
/// request tracing and, optionally, permissive CORS.
pub fn app<S: Backend>(state: AppState<S>, cors_allow_any_origin: bool) -> Router {
  let router = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());
  if cors_allow_any_origin {
    router.layer(CorsLayer::very_permissive())
  } else {
    router
  }
}
