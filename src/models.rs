use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Lifecycle of a video: Draft on creation, Processing once a split request is
/// accepted, then Ready or Failed once the finalizer has run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "PascalCase")]
pub enum VideoStatus {
    Draft,
    Processing,
    Ready,
    Failed,
}

impl VideoStatus {
    /// Parse a client-supplied status string against the allowed values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Draft" => Some(Self::Draft),
            "Processing" => Some(Self::Processing),
            "Ready" => Some(Self::Ready),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A row from the `videos` table.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration: f64,
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
}

/// A row from the `segments` table. `video_id` is internal bookkeeping and is
/// not part of the wire representation.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Segment {
    pub id: i64,
    #[serde(skip_serializing)]
    pub video_id: i64,
    pub start: f64,
    pub end: f64,
}

/// Validated start/end pair for a pending segment insert.
#[derive(Clone, Copy, Debug)]
pub struct SegmentBounds {
    pub start: f64,
    pub end: f64,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: crate::config::Config,
}

#[derive(Debug, Deserialize)]
pub struct VideoCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: String,
    #[serde(default)]
    pub duration: f64,
}

/// Patch body: absent fields leave the stored values untouched.
#[derive(Debug, Deserialize)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub q: Option<String>,
    pub status: Option<String>,
}

fn default_limit() -> i64 {
    20
}

/// Full video representation returned by the API, current segments inlined.
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration: f64,
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
    pub segments: Vec<Segment>,
}

impl VideoResponse {
    pub fn new(video: Video, segments: Vec<Segment>) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            duration: video.duration,
            status: video.status,
            created_at: video.created_at,
            segments,
        }
    }
}
