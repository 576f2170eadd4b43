use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    user::User,
    video::{MutationOutcome, Video, VideoMutation, VideoQuery},
};
use crate::services::{memory::MemoryStore, surreal::SurrealStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Storage for video aggregates.
///
/// Implementations must apply [`VideoMutation`]s atomically per video: two
/// concurrent mutations on the same video may not overwrite each other.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// All videos matching `query`, newest upload first.
    async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>>;

    async fn find_video(&self, id: &str) -> Result<Option<Video>>;

    /// Rejects videos that violate [`Video::validate_invariants`] or reuse an
    /// existing id or `videoId`.
    async fn insert_video(&self, video: Video) -> Result<Video>;

    /// Returns `Ok(None)` when no video has the given id. A failed mutation
    /// leaves the stored video untouched.
    async fn mutate_video(
        &self,
        id: &str,
        mutation: &VideoMutation,
    ) -> Result<Option<(Video, MutationOutcome)>>;

    /// Confirms the backing storage is reachable.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    async fn insert_user(&self, user: User) -> Result<User>;
}

/// Initial data loaded at startup from `SEED_FILE`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub videos: Arc<dyn VideoStore>,
    pub users: Arc<dyn UserStore>,
}

impl Database {
    /// 根据配置创建数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        let db = if config.uses_surrealdb() {
            info!("Using SurrealDB storage at {}", config.database_url);
            let store = Arc::new(SurrealStore::connect(config).await?);
            Self::from_store(store)
        } else {
            info!("Using in-memory storage");
            Self::memory()
        };

        if let Some(path) = &config.seed_file {
            db.load_seed_file(path).await?;
        }

        Ok(db)
    }

    /// 内存存储，用于开发和测试
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: VideoStore + UserStore + 'static,
    {
        Self {
            videos: store.clone(),
            users: store,
        }
    }

    pub async fn seed(&self, data: SeedData) -> Result<()> {
        let (user_count, video_count) = (data.users.len(), data.videos.len());

        for user in data.users {
            self.users.insert_user(user).await?;
        }
        for video in data.videos {
            self.videos.insert_video(video).await?;
        }

        info!("Seeded {} users and {} videos", user_count, video_count);
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        self.videos.health_check().await
    }

    pub async fn load_seed_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Loading seed data from {}", path.display());

        let raw = tokio::fs::read_to_string(path).await?;
        let data: SeedData = serde_json::from_str(&raw)?;
        self.seed(data).await
    }
}

pub(crate) fn duplicate_video(video_id: &str) -> AppError {
    AppError::Validation(format!("Video {} already exists", video_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_seed_inserts_users_and_videos() {
        let db = Database::memory();
        let data: SeedData = serde_json::from_value(json!({
            "users": [{ "id": "u1", "username": "alice", "email": "alice@example.com" }],
            "videos": [{
                "id": "v1",
                "videoId": "yt-1",
                "title": "Intro",
                "thumbnailURL": "https://cdn.example.com/1.jpg",
                "videoURL": "https://cdn.example.com/1.mp4",
                "channelId": "ch-1",
                "uploader": "u1"
            }]
        }))
        .unwrap();

        db.seed(data).await.unwrap();

        assert!(db.users.find_user("u1").await.unwrap().is_some());
        let video = db.videos.find_video("v1").await.unwrap().unwrap();
        assert_eq!(video.video_id, "yt-1");
    }

    #[tokio::test]
    async fn test_seed_rejects_video_with_conflicting_reactions() {
        let db = Database::memory();
        let data: SeedData = serde_json::from_value(json!({
            "videos": [{
                "id": "v1",
                "videoId": "yt-1",
                "title": "Intro",
                "thumbnailURL": "https://cdn.example.com/1.jpg",
                "videoURL": "https://cdn.example.com/1.mp4",
                "channelId": "ch-1",
                "uploader": "u1",
                "likes": ["u1", "u1"],
                "dislikes": ["u1"]
            }]
        }))
        .unwrap();

        assert!(matches!(db.seed(data).await, Err(AppError::Validation(_))));
        assert!(db.videos.find_video("v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_backend_is_healthy() {
        assert!(Database::memory().health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_an_error() {
        let db = Database::memory();
        let result = db.load_seed_file("/definitely/not/here.json").await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
