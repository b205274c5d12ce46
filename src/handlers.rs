use crate::{
    db,
    error::{ApiError, ApiResult},
    finalize,
    models::{
        AppState, ListVideosParams, Segment, SegmentBounds, Video, VideoCreate, VideoResponse,
        VideoStatus, VideoUpdate,
    },
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// Slack applied when checking segment bounds against the video duration.
const DURATION_EPSILON: f64 = 1e-6;

async fn with_segments(state: &AppState, video: Video) -> ApiResult<VideoResponse> {
    let segments = db::segments_for_video(&state.pool, video.id).await?;
    Ok(VideoResponse::new(video, segments))
}

/// Create a new video record in Draft status
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    Json(input): Json<VideoCreate>,
) -> ApiResult<Json<VideoResponse>> {
    if input.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    if input.video_url.trim().is_empty() {
        return Err(ApiError::bad_request("video_url must not be empty"));
    }
    if input.duration < 0.0 {
        return Err(ApiError::bad_request("duration must not be negative"));
    }

    let video = db::create_video(&state.pool, &input).await?;
    info!("[POST /videos] created video {} ({:?})", video.id, video.title);

    Ok(Json(VideoResponse::new(video, Vec::new())))
}

/// List videos with optional title search and status filter
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListVideosParams>,
) -> ApiResult<Json<Vec<VideoResponse>>> {
    let videos = db::list_videos(
        &state.pool,
        params.skip,
        params.limit,
        params.q.as_deref(),
        params.status.as_deref(),
    )
    .await?;

    let mut out = Vec::with_capacity(videos.len());
    for video in videos {
        out.push(with_segments(&state, video).await?);
    }
    Ok(Json(out))
}

pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<i64>,
) -> ApiResult<Json<VideoResponse>> {
    let video = db::get_video(&state.pool, video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    Ok(Json(with_segments(&state, video).await?))
}

/// Apply whichever of title/description/status are present, leaving the rest
/// untouched. Status must be one of the four known values.
pub async fn patch_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<i64>,
    Json(patch): Json<VideoUpdate>,
) -> ApiResult<Json<VideoResponse>> {
    let status = match patch.status.as_deref() {
        Some(s) => Some(
            VideoStatus::parse(s)
                .ok_or_else(|| ApiError::bad_request(format!("invalid status {s}")))?,
        ),
        None => None,
    };

    let video = db::update_video(
        &state.pool,
        video_id,
        patch.title.as_deref(),
        patch.description.as_deref(),
        status,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(Json(with_segments(&state, video).await?))
}

/// Accept a split request: validate every candidate segment against the
/// video's duration, and only if all pass, mark the video Processing and swap
/// in the new segment set. Finalization runs out-of-band afterwards.
///
/// The body is taken as raw JSON so that shape errors surface as 400 with a
/// message naming the problem instead of a generic rejection.
pub async fn split_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<i64>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Vec<Segment>>> {
    let video = db::get_video(&state.pool, video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let created = accept_split(&state.pool, &video, &payload).await?;

    info!(
        "[POST /videos/{}/split] accepted {} segments, finalize scheduled",
        video.id,
        created.len()
    );

    // Fire-and-forget: the response does not wait for finalization
    tokio::spawn(finalize::finalize_video(state.pool.clone(), video.id));

    Ok(Json(created))
}

/// Synchronous half of a split request: validate the payload, then mark the
/// video Processing and swap in the new segment set. The video holds that
/// status until the caller's scheduled finalization resolves it.
async fn accept_split(
    pool: &SqlitePool,
    video: &Video,
    payload: &Value,
) -> ApiResult<Vec<Segment>> {
    let entries = payload
        .get("segments")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request("segments required"))?;

    // Validation is all-or-nothing: nothing is written until every entry
    // has passed.
    let mut bounds = Vec::with_capacity(entries.len());
    for entry in entries {
        let start = segment_field(entry, "start")?;
        let end = segment_field(entry, "end")?;
        if start < 0.0 || end <= start || end > video.duration + DURATION_EPSILON {
            return Err(ApiError::bad_request(format!("invalid segment {entry}")));
        }
        bounds.push(SegmentBounds { start, end });
    }

    db::set_status(pool, video.id, VideoStatus::Processing).await?;
    Ok(db::replace_segments(pool, video.id, &bounds).await?)
}

fn segment_field(entry: &Value, key: &str) -> Result<f64, ApiError> {
    let invalid = || ApiError::bad_request(format!("invalid segment {entry}"));
    match entry.get(key) {
        None | Some(Value::Null) => Err(ApiError::bad_request(
            "start/end required for each segment",
        )),
        // Bounds arrive as JSON numbers or numeric strings; both coerce to f64
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(v) => v.as_f64().ok_or_else(invalid),
    }
}
