use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use jotter_store::{Store, StoreResult};
use jotter_types::{Comment, CommentDraft, Post, PostDraft, Profile};

use crate::error::{ApiError, ApiResult};
use crate::extract::{record_id, JsonBody};

type SharedStore = State<Arc<Store>>;
type IdPath = Result<Path<jotter_types::RecordId>, PathRejection>;

/// Run a store call off the async runtime; store calls hold a lock across
/// the snapshot file write.
async fn blocking<T, F>(store: Arc<Store>, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

// ---- Posts ----

pub async fn list_posts(State(store): SharedStore) -> ApiResult<Json<Vec<Post>>> {
    blocking(store, |s| s.list_posts()).await.map(Json)
}

pub async fn create_post(
    State(store): SharedStore,
    JsonBody(draft): JsonBody<PostDraft>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = blocking(store, move |s| s.create_post(draft)).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(State(store): SharedStore, id: IdPath) -> ApiResult<Json<Post>> {
    let id = record_id(id)?;
    blocking(store, move |s| s.get_post(id)).await.map(Json)
}

pub async fn update_post(
    State(store): SharedStore,
    id: IdPath,
    JsonBody(draft): JsonBody<PostDraft>,
) -> ApiResult<Json<Post>> {
    let id = record_id(id)?;
    blocking(store, move |s| s.update_post(id, draft)).await.map(Json)
}

/// Responds with the posts left after the delete.
pub async fn delete_post(State(store): SharedStore, id: IdPath) -> ApiResult<Json<Vec<Post>>> {
    let id = record_id(id)?;
    blocking(store, move |s| s.delete_post(id)).await.map(Json)
}

pub async fn posts_by_author(
    State(store): SharedStore,
    Path(author): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    blocking(store, move |s| s.posts_by_author(&author)).await.map(Json)
}

/// Serves both `/posts/:id/comments` and `/comments/post/:post_id`.
pub async fn comments_for_post(
    State(store): SharedStore,
    post_id: IdPath,
) -> ApiResult<Json<Vec<Comment>>> {
    let post_id = record_id(post_id)?;
    blocking(store, move |s| s.comments_for_post(post_id)).await.map(Json)
}

// ---- Comments ----

pub async fn list_comments(State(store): SharedStore) -> ApiResult<Json<Vec<Comment>>> {
    blocking(store, |s| s.list_comments()).await.map(Json)
}

pub async fn create_comment(
    State(store): SharedStore,
    JsonBody(draft): JsonBody<CommentDraft>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = blocking(store, move |s| s.create_comment(draft)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(State(store): SharedStore, id: IdPath) -> ApiResult<Json<Comment>> {
    let id = record_id(id)?;
    blocking(store, move |s| s.get_comment(id)).await.map(Json)
}

pub async fn update_comment(
    State(store): SharedStore,
    id: IdPath,
    JsonBody(draft): JsonBody<CommentDraft>,
) -> ApiResult<Json<Comment>> {
    let id = record_id(id)?;
    blocking(store, move |s| s.update_comment(id, draft)).await.map(Json)
}

/// Responds with the comments left after the delete.
pub async fn delete_comment(
    State(store): SharedStore,
    id: IdPath,
) -> ApiResult<Json<Vec<Comment>>> {
    let id = record_id(id)?;
    blocking(store, move |s| s.delete_comment(id)).await.map(Json)
}

/// Responds with the removed comments.
pub async fn delete_comments_by_post(
    State(store): SharedStore,
    post_id: IdPath,
) -> ApiResult<Json<Vec<Comment>>> {
    let post_id = record_id(post_id)?;
    blocking(store, move |s| s.delete_comments_by_post(post_id)).await.map(Json)
}

// ---- Profile ----

pub async fn get_profile(State(store): SharedStore) -> ApiResult<Json<Profile>> {
    blocking(store, |s| s.profile()).await.map(Json)
}

/// Backs both `POST` and `PUT /profile`; either one replaces the profile.
pub async fn set_profile(
    State(store): SharedStore,
    JsonBody(profile): JsonBody<Profile>,
) -> ApiResult<Json<Profile>> {
    blocking(store, move |s| s.set_profile(profile)).await.map(Json)
}

pub async fn clear_profile(State(store): SharedStore) -> ApiResult<Json<Profile>> {
    blocking(store, |s| s.clear_profile()).await.map(Json)
}
