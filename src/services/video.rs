use crate::{
    error::{AppError, Result},
    models::video::*,
    services::database::VideoStore,
};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct VideoService {
    store: Arc<dyn VideoStore>,
    max_comment_length: usize,
}

impl VideoService {
    pub fn new(store: Arc<dyn VideoStore>, max_comment_length: usize) -> Self {
        Self {
            store,
            max_comment_length,
        }
    }

    pub async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>> {
        debug!("Listing videos with query: {:?}", query);
        self.store.list_videos(query).await
    }

    pub async fn get_video(&self, video_id: &str) -> Result<Video> {
        self.store
            .find_video(video_id)
            .await?
            .ok_or_else(|| AppError::not_found("Video"))
    }

    /// Increments the view counter and returns the updated video.
    pub async fn record_view(&self, video_id: &str) -> Result<Video> {
        let (video, _) = self.mutate(video_id, VideoMutation::RecordView).await?;
        Ok(video)
    }

    pub async fn add_like(&self, video_id: &str, user_id: &str) -> Result<()> {
        self.react(video_id, user_id, Reaction::Like).await
    }

    pub async fn add_dislike(&self, video_id: &str, user_id: &str) -> Result<()> {
        self.react(video_id, user_id, Reaction::Dislike).await
    }

    pub async fn add_comment(
        &self,
        video_id: &str,
        user_id: &str,
        request: CommentRequest,
    ) -> Result<Comment> {
        debug!("Adding comment to video {} by {}", video_id, user_id);

        let text = self.validated_text(request)?;
        let mutation = VideoMutation::AddComment(Comment::new(user_id, text));

        match self.mutate(video_id, mutation).await? {
            (_, MutationOutcome::Comment(comment)) => {
                info!("Comment {} added to video {}", comment.comment_id, video_id);
                Ok(comment)
            }
            (_, other) => Err(unexpected(other)),
        }
    }

    pub async fn edit_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        user_id: &str,
        request: CommentRequest,
    ) -> Result<Comment> {
        debug!("Editing comment {} on video {} by {}", comment_id, video_id, user_id);

        let mutation = VideoMutation::EditComment {
            comment_id: comment_id.to_string(),
            user_id: user_id.to_string(),
            text: self.validated_text(request)?,
        };

        match self.mutate(video_id, mutation).await? {
            (_, MutationOutcome::Comment(comment)) => Ok(comment),
            (_, other) => Err(unexpected(other)),
        }
    }

    pub async fn delete_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        user_id: &str,
    ) -> Result<()> {
        debug!("Deleting comment {} on video {} by {}", comment_id, video_id, user_id);

        let mutation = VideoMutation::DeleteComment {
            comment_id: comment_id.to_string(),
            user_id: user_id.to_string(),
        };

        match self.mutate(video_id, mutation).await? {
            (_, MutationOutcome::CommentRemoved(_)) => {
                info!("Comment {} removed from video {}", comment_id, video_id);
                Ok(())
            }
            (_, other) => Err(unexpected(other)),
        }
    }

    async fn react(&self, video_id: &str, user_id: &str, reaction: Reaction) -> Result<()> {
        debug!("User {} reacting {:?} on video {}", user_id, reaction, video_id);

        let mutation = VideoMutation::React {
            user_id: user_id.to_string(),
            reaction,
        };
        self.mutate(video_id, mutation).await?;
        Ok(())
    }

    async fn mutate(
        &self,
        video_id: &str,
        mutation: VideoMutation,
    ) -> Result<(Video, MutationOutcome)> {
        self.store
            .mutate_video(video_id, &mutation)
            .await?
            .ok_or_else(|| AppError::not_found("Video"))
    }

    fn validated_text(&self, request: CommentRequest) -> Result<String> {
        let request = CommentRequest {
            text: request.text.trim().to_string(),
        };
        request.validate()?;

        if request.text.chars().count() > self.max_comment_length {
            return Err(AppError::Validation(format!(
                "Comment must be at most {} characters",
                self.max_comment_length
            )));
        }

        Ok(request.text)
    }
}

fn unexpected(outcome: MutationOutcome) -> AppError {
    AppError::Internal(format!("Unexpected mutation outcome: {:?}", outcome))
}
