use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use jotter_store::Store;

use crate::handler;

/// Build the axum router with every jotter endpoint.
pub fn build_router(store: Arc<Store>) -> Router {
    Router::new()
        .route("/posts", get(handler::list_posts).post(handler::create_post))
        .route(
            "/posts/:id",
            get(handler::get_post)
                .put(handler::update_post)
                .delete(handler::delete_post),
        )
        .route("/posts/:id/comments", get(handler::comments_for_post))
        .route("/posts/author/:author", get(handler::posts_by_author))
        .route("/comments", get(handler::list_comments).post(handler::create_comment))
        .route(
            "/comments/:id",
            get(handler::get_comment)
                .put(handler::update_comment)
                .delete(handler::delete_comment),
        )
        .route(
            "/comments/post/:post_id",
            get(handler::comments_for_post).delete(handler::delete_comments_by_post),
        )
        .route(
            "/profile",
            get(handler::get_profile)
                .post(handler::set_profile)
                .put(handler::set_profile)
                .delete(handler::clear_profile),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(store)
}
