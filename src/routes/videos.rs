use crate::{
    error::Result,
    models::{
        response::MessageResponse,
        user::User,
        video::{Comment, CommentRequest, Video, VideoQuery},
    },
    state::AppState,
    utils::{extract::ApiJson, middleware::require_auth},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/comment/:video_id", post(add_comment))
        .route(
            "/comment/:video_id/:comment_id",
            put(edit_comment).delete(delete_comment),
        )
        .route("/:id/like", post(like_video))
        .route("/:id/dislike", post(dislike_video))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/", get(list_videos))
        .route("/:id", get(get_video))
        .merge(protected)
}

/// 获取视频列表
/// GET /api/videos
async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoQuery>,
) -> Result<Json<Vec<Video>>> {
    let videos = state.video_service.list_videos(&query).await?;
    Ok(Json(videos))
}

/// 获取单个视频，并增加播放次数
/// GET /api/videos/:id
async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Video>> {
    let video = state.video_service.record_view(&id).await?;
    Ok(Json(video))
}

/// POST /api/videos/comment/:video_id
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(video_id): Path<String>,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = state
        .video_service
        .add_comment(&video_id, &user.id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/videos/comment/:video_id/:comment_id
async fn edit_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path((video_id, comment_id)): Path<(String, String)>,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<Json<Comment>> {
    let comment = state
        .video_service
        .edit_comment(&video_id, &comment_id, &user.id, request)
        .await?;

    Ok(Json(comment))
}

/// DELETE /api/videos/comment/:video_id/:comment_id
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path((video_id, comment_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    state
        .video_service
        .delete_comment(&video_id, &comment_id, &user.id)
        .await?;

    Ok(Json(MessageResponse::new("Comment deleted")))
}

/// POST /api/videos/:id/like
async fn like_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    debug!("User {} liking video {}", user.id, id);
    state.video_service.add_like(&id, &user.id).await?;

    Ok(Json(MessageResponse::new("Video liked successfully")))
}

/// POST /api/videos/:id/dislike
async fn dislike_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    debug!("User {} disliking video {}", user.id, id);
    state.video_service.add_dislike(&id, &user.id).await?;

    Ok(Json(MessageResponse::new("Video disliked successfully")))
}
