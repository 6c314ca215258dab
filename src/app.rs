use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

/// `import_limit` caps the body of `/api/import`; see
/// `Config::import_body_limit`.
pub fn router(state: AppState, import_limit: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/entries", post(handlers::entry_submit))
        .route("/entries/:id/delete", post(handlers::entry_delete))
        .route("/reviews", post(handlers::review_submit))
        .route(
            "/api/entries",
            get(handlers::list_entries).post(handlers::create_entry),
        )
        .route("/api/entries/:id", delete(handlers::delete_entry))
        .route("/api/stats", get(handlers::get_stats))
        .route(
            "/api/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .route("/api/export", get(handlers::export))
        .route(
            "/api/import",
            post(handlers::import).layer(DefaultBodyLimit::max(import_limit)),
        )
        .with_state(state)
}
