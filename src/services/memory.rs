use crate::error::{AppError, Result};
use crate::models::{
    user::User,
    video::{MutationOutcome, Video, VideoMutation, VideoQuery},
};
use crate::services::database::{duplicate_video, UserStore, VideoStore};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::Mutex;

/// In-process store keyed by video id.
///
/// Mutations run while the shard lock for the video is held, which makes
/// each one atomic with respect to other requests on the same video.
/// Inserts are serialized so the `videoId` scan and the write cannot
/// interleave with another insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    videos: DashMap<String, Video>,
    users: DashMap<String, User>,
    insert_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>> {
        let mut videos: Vec<Video> = self
            .videos
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        videos.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(videos)
    }

    async fn find_video(&self, id: &str) -> Result<Option<Video>> {
        Ok(self.videos.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert_video(&self, video: Video) -> Result<Video> {
        video.validate_invariants()?;
        let _guard = self.insert_lock.lock().await;

        if self
            .videos
            .iter()
            .any(|entry| entry.value().video_id == video.video_id)
        {
            return Err(duplicate_video(&video.video_id));
        }

        match self.videos.entry(video.id.clone()) {
            Entry::Occupied(_) => Err(duplicate_video(&video.id)),
            Entry::Vacant(slot) => {
                slot.insert(video.clone());
                Ok(video)
            }
        }
    }

    async fn mutate_video(
        &self,
        id: &str,
        mutation: &VideoMutation,
    ) -> Result<Option<(Video, MutationOutcome)>> {
        let Some(mut entry) = self.videos.get_mut(id) else {
            return Ok(None);
        };

        let mut draft = entry.value().clone();
        let outcome = mutation.apply(&mut draft)?;
        *entry.value_mut() = draft.clone();

        Ok(Some((draft, outcome)))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Validation(format!(
                "User {} already exists",
                user.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }
}
