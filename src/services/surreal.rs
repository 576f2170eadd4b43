use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    user::User,
    video::{MutationOutcome, Video, VideoMutation, VideoQuery},
};
use crate::services::database::{duplicate_video, UserStore, VideoStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, error, info, warn};

const VIDEO_FIELDS: &str = "meta::id(id) AS id, videoId, title, thumbnailURL, videoURL, \
    description, channelId, uploader, views, likes, dislikes, uploadDate, comments, version";

const USER_FIELDS: &str = "meta::id(id) AS id, username, email";

/// SurrealDB-backed store.
///
/// Every video document carries a `version` counter. Mutations are
/// read-modify-write cycles whose write only lands if the version is still
/// the one that was read; otherwise the cycle is retried.
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
    write_retry_limit: u32,
}

#[derive(Debug, Deserialize)]
struct VersionedVideo {
    #[serde(flatten)]
    video: Video,
    #[serde(default)]
    version: u64,
}

impl SurrealStore {
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let db = any::connect(config.database_url.as_str()).await?;
        db.signin(Root {
            username: &config.database_username,
            password: &config.database_password,
        })
        .await?;
        db.use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        let store = Self::with_client(db, config.write_retry_limit).await?;
        store.verify_connection().await?;
        Ok(store)
    }

    /// Wraps a client that already has its namespace and database selected
    /// and defines the indexes the store relies on.
    pub async fn with_client(db: Surreal<Any>, write_retry_limit: u32) -> Result<Self> {
        db.query("DEFINE INDEX video_video_id ON TABLE video COLUMNS videoId UNIQUE")
            .await?
            .check()?;

        Ok(Self {
            db,
            write_retry_limit: write_retry_limit.max(1),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.db.query("INFO FOR DB").await.and_then(|r| r.check()) {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    async fn fetch_video(&self, id: &str) -> Result<Option<VersionedVideo>> {
        let sql = format!("SELECT {} FROM type::thing('video', $id)", VIDEO_FIELDS);
        let mut response = self.db.query(sql).bind(("id", id.to_string())).await?;
        let rows: Vec<Value> = response.take(0)?;

        rows.into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(AppError::from)
    }

    /// Writes `video` only if the stored version is still `expected`.
    /// Returns `false` when another writer got there first.
    async fn write_if_unchanged(&self, id: &str, video: &Video, expected: u64) -> Result<bool> {
        let mut response = self
            .db
            .query(
                "UPDATE type::thing('video', $id) CONTENT $doc \
                 WHERE (version ?? 0) = $expected RETURN version",
            )
            .bind(("id", id.to_string()))
            .bind(("doc", Self::document(video, expected + 1)?))
            .bind(("expected", expected))
            .await?;
        let written: Vec<Value> = response.take(0)?;
        Ok(!written.is_empty())
    }

    /// One read-modify-write cycle against the stored version.
    async fn try_mutate(
        &self,
        id: &str,
        mutation: &VideoMutation,
    ) -> Result<WriteAttempt<Option<(Video, MutationOutcome)>>> {
        let Some(stored) = self.fetch_video(id).await? else {
            return Ok(WriteAttempt::Applied(None));
        };

        let mut video = stored.video;
        let outcome = mutation.apply(&mut video)?;

        if self.write_if_unchanged(id, &video, stored.version).await? {
            Ok(WriteAttempt::Applied(Some((video, outcome))))
        } else {
            debug!("Version conflict on video {} at version {}", id, stored.version);
            Ok(WriteAttempt::Conflict)
        }
    }

    fn document(video: &Video, version: u64) -> Result<Value> {
        let mut doc = serde_json::to_value(video)?;
        if let Some(fields) = doc.as_object_mut() {
            // The record id is carried by the record link itself.
            fields.remove("id");
            fields.insert("version".to_string(), Value::from(version));
        }
        Ok(doc)
    }
}

#[async_trait]
impl VideoStore for SurrealStore {
    async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>> {
        let search = query.search_term();
        let mut sql = format!("SELECT {} FROM video", VIDEO_FIELDS);
        if search.is_some() {
            sql.push_str(" WHERE string::lowercase(title) CONTAINS $search");
        }

        let mut response = self.db.query(sql).bind(("search", search)).await?;
        let rows: Vec<Value> = response.take(0)?;

        let mut videos = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value::<VersionedVideo>(row)
                    .map(|stored| stored.video)
                    .map_err(AppError::from)
            })
            .collect::<Result<Vec<_>>>()?;

        // uploadDate is stored as RFC 3339 text, which does not sort
        // chronologically when fractional seconds are present.
        videos.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(videos)
    }

    async fn find_video(&self, id: &str) -> Result<Option<Video>> {
        Ok(self.fetch_video(id).await?.map(|stored| stored.video))
    }

    async fn insert_video(&self, video: Video) -> Result<Video> {
        video.validate_invariants()?;

        let mut response = self
            .db
            .query("SELECT VALUE meta::id(id) FROM video WHERE videoId = $video_id")
            .bind(("video_id", video.video_id.clone()))
            .await?;
        let existing: Vec<String> = response.take(0)?;
        if !existing.is_empty() {
            return Err(duplicate_video(&video.video_id));
        }

        // The unique index catches inserts racing past the check above.
        let created = self
            .db
            .query("CREATE type::thing('video', $id) CONTENT $doc RETURN NONE")
            .bind(("id", video.id.clone()))
            .bind(("doc", Self::document(&video, 0)?))
            .await
            .and_then(|response| response.check());
        match created {
            Ok(_) => {}
            Err(e) if is_duplicate(&e) => {
                warn!("Rejected duplicate video {} ({}): {}", video.id, video.video_id, e);
                return Err(duplicate_video(&video.video_id));
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Inserted video {} ({})", video.id, video.video_id);
        Ok(video)
    }

    async fn mutate_video(
        &self,
        id: &str,
        mutation: &VideoMutation,
    ) -> Result<Option<(Video, MutationOutcome)>> {
        retry_on_conflict(id, self.write_retry_limit, move |_| {
            self.try_mutate(id, mutation)
        })
        .await
    }

    async fn health_check(&self) -> Result<()> {
        Ok(self.db.health().await?)
    }
}

enum WriteAttempt<T> {
    Applied(T),
    Conflict,
}

/// Runs `attempt` until it applies, giving up after `limit` conflicts.
async fn retry_on_conflict<T, F, Fut>(id: &str, limit: u32, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<WriteAttempt<T>>>,
{
    for n in 1..=limit {
        match attempt(n).await? {
            WriteAttempt::Applied(value) => return Ok(value),
            WriteAttempt::Conflict => debug!("Retrying write on video {} (attempt {})", id, n),
        }
    }

    warn!("Giving up on video {} after {} conflicting writes", id, limit);
    Err(AppError::Internal(format!(
        "Could not apply update to video {} due to concurrent writes",
        id
    )))
}

fn is_duplicate(err: &surrealdb::Error) -> bool {
    use surrealdb::error::Db;

    match err {
        surrealdb::Error::Db(Db::IndexExists { .. } | Db::RecordExists { .. }) => true,
        // Remote engines report the same failures as text.
        other => {
            let message = other.to_string();
            message.contains("already contains") || message.contains("already exists")
        }
    }
}

#[async_trait]
impl UserStore for SurrealStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM type::thing('user', $id)", USER_FIELDS);
        let mut response = self.db.query(sql).bind(("id", id.to_string())).await?;
        let rows: Vec<Value> = response.take(0)?;

        rows.into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(AppError::from)
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        self.db
            .query("CREATE type::thing('user', $id) CONTENT $doc RETURN NONE")
            .bind(("id", user.id.clone()))
            .bind((
                "doc",
                serde_json::json!({ "username": user.username, "email": user.email }),
            ))
            .await?
            .check()?;

        Ok(user)
    }
}
