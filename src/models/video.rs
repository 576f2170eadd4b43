use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

/// A video together with its embedded comments and reaction sets.
///
/// Field names on the wire follow the documents produced by the original
/// frontend (`videoId`, `thumbnailURL`, `uploadDate`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(alias = "_id", default = "new_video_key")]
    pub id: String,
    pub video_id: String,
    pub title: String,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    #[serde(rename = "videoURL")]
    pub video_url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub channel_id: String,
    pub uploader: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default = "Utc::now")]
    pub upload_date: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Video {
    /// Checks the aggregate rules a stored video must satisfy: each user
    /// reacts at most once, never both ways, and comment ids are unique.
    pub fn validate_invariants(&self) -> Result<()> {
        let mut reacted = HashSet::new();
        for user_id in self.likes.iter().chain(&self.dislikes) {
            if !reacted.insert(user_id.as_str()) {
                return Err(AppError::Validation(format!(
                    "Video {}: user {} reacted more than once",
                    self.id, user_id
                )));
            }
        }

        let mut comment_ids = HashSet::new();
        for comment in &self.comments {
            if !comment_ids.insert(comment.comment_id.as_str()) {
                return Err(AppError::Validation(format!(
                    "Video {}: duplicate comment id {}",
                    self.id, comment.comment_id
                )));
            }
        }

        Ok(())
    }
}

fn new_video_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: String,
    pub user_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: &str, text: String) -> Self {
        Self {
            comment_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            text,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

/// One state transition on a single video aggregate.
///
/// Stores apply a mutation atomically; the rules themselves live in
/// [`VideoMutation::apply`] so every backend enforces them identically.
#[derive(Debug, Clone)]
pub enum VideoMutation {
    RecordView,
    React {
        user_id: String,
        reaction: Reaction,
    },
    AddComment(Comment),
    EditComment {
        comment_id: String,
        user_id: String,
        text: String,
    },
    DeleteComment {
        comment_id: String,
        user_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Viewed,
    Reacted,
    Comment(Comment),
    CommentRemoved(Comment),
}

impl VideoMutation {
    pub fn apply(&self, video: &mut Video) -> Result<MutationOutcome> {
        match self {
            VideoMutation::RecordView => {
                video.views = video.views.saturating_add(1);
                Ok(MutationOutcome::Viewed)
            }
            VideoMutation::React { user_id, reaction } => {
                let (target, opposite, already) = match reaction {
                    Reaction::Like => (&mut video.likes, &mut video.dislikes, AppError::AlreadyLiked),
                    Reaction::Dislike => {
                        (&mut video.dislikes, &mut video.likes, AppError::AlreadyDisliked)
                    }
                };

                if target.iter().any(|id| id == user_id) {
                    return Err(already);
                }

                opposite.retain(|id| id != user_id);
                target.push(user_id.clone());
                Ok(MutationOutcome::Reacted)
            }
            VideoMutation::AddComment(comment) => {
                if video.comments.iter().any(|c| c.comment_id == comment.comment_id) {
                    return Err(AppError::internal("Duplicate comment identifier"));
                }
                video.comments.push(comment.clone());
                Ok(MutationOutcome::Comment(comment.clone()))
            }
            VideoMutation::EditComment {
                comment_id,
                user_id,
                text,
            } => {
                let comment = video
                    .comments
                    .iter_mut()
                    .find(|c| &c.comment_id == comment_id)
                    .ok_or_else(|| AppError::not_found("Comment"))?;

                if &comment.user_id != user_id {
                    return Err(AppError::forbidden("Not authorized"));
                }

                comment.text = text.clone();
                Ok(MutationOutcome::Comment(comment.clone()))
            }
            VideoMutation::DeleteComment {
                comment_id,
                user_id,
            } => {
                let index = video
                    .comments
                    .iter()
                    .position(|c| &c.comment_id == comment_id)
                    .ok_or_else(|| AppError::not_found("Comment"))?;

                if &video.comments[index].user_id != user_id {
                    return Err(AppError::forbidden("Not authorized"));
                }

                Ok(MutationOutcome::CommentRemoved(video.comments.remove(index)))
            }
        }
    }
}

/// Filter accepted by `GET /videos`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoQuery {
    pub search: Option<String>,
    // Videos carry no category; accepted so existing clients keep working.
    pub category: Option<String>,
}

impl VideoQuery {
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, video: &Video) -> bool {
        match self.search_term() {
            Some(term) => video.title.to_lowercase().contains(&term),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "Comment text is required"))]
    pub text: String,
}
