use crate::{
    config::Config,
    error::Result,
    services::{auth::AuthService, database::Database, video::VideoService},
};

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Database,

    /// 认证服务
    pub auth_service: AuthService,

    /// 视频、评论与点赞服务
    pub video_service: VideoService,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let auth_service = AuthService::new(&config, db.users.clone())?;
        let video_service = VideoService::new(db.videos.clone(), config.max_comment_length);

        Ok(Self {
            config,
            db,
            auth_service,
            video_service,
        })
    }
}
