use crate::{models::user::User, state::AppState, utils::middleware::require_auth};
use axum::{middleware, response::Json, routing::get, Extension, Router};
use std::sync::Arc;
use tracing::debug;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(get_current_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// 获取当前用户信息
/// GET /api/auth/me
///
/// 令牌由身份服务签发，这里只返回解析得到的用户
async fn get_current_user(Extension(user): Extension<User>) -> Json<User> {
    debug!("Getting current user info for user: {}", user.id);
    Json(user)
}
