use crate::db;
use crate::models::VideoStatus;
use sqlx::SqlitePool;
use tracing::{error, info};

/// Finalize a video after a split request: resolve the terminal status from
/// the persisted segment set. Spawned fire-and-forget after the split response
/// is produced; the caller never observes its outcome, so failures are only
/// logged. Acquires its own connections from the shared pool rather than
/// reusing the originating request's.
pub async fn finalize_video(pool: SqlitePool, video_id: i64) {
    if let Err(e) = run(&pool, video_id).await {
        error!("[finalize] video {}: {}", video_id, e);
    }
}

async fn run(pool: &SqlitePool, video_id: i64) -> sqlx::Result<()> {
    // The video may have been deleted while the task was queued
    let Some(video) = db::get_video(pool, video_id).await? else {
        info!("[finalize] video {} no longer exists, skipping", video_id);
        return Ok(());
    };

    let segments = db::segments_for_video(pool, video.id).await?;
    let status = if segments.is_empty() {
        VideoStatus::Failed
    } else {
        VideoStatus::Ready
    };

    db::set_status(pool, video.id, status).await?;
    info!(
        "[finalize] video {} -> {:?} ({} segments)",
        video.id,
        status,
        segments.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SegmentBounds, VideoCreate};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool_with_video(duration: f64) -> (SqlitePool, i64) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::init(&pool).await.unwrap();
        let video = db::create_video(
            &pool,
            &VideoCreate {
                title: "clip me".to_string(),
                description: String::new(),
                video_url: "http://example.com/v.mp4".to_string(),
                duration,
            },
        )
        .await
        .unwrap();
        (pool, video.id)
    }

    #[tokio::test]
    async fn finalize_marks_ready_when_segments_exist() {
        let (pool, id) = pool_with_video(60.0).await;
        db::set_status(&pool, id, VideoStatus::Processing).await.unwrap();
        db::replace_segments(&pool, id, &[SegmentBounds { start: 0.0, end: 60.0 }])
            .await
            .unwrap();

        finalize_video(pool.clone(), id).await;

        let video = db::get_video(&pool, id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Ready);
    }

    #[tokio::test]
    async fn finalize_marks_failed_without_segments() {
        let (pool, id) = pool_with_video(60.0).await;
        db::set_status(&pool, id, VideoStatus::Processing).await.unwrap();

        finalize_video(pool.clone(), id).await;

        let video = db::get_video(&pool, id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Failed);
    }

    #[tokio::test]
    async fn finalize_ignores_missing_video() {
        let (pool, id) = pool_with_video(60.0).await;
        // Unknown id: must be a silent no-op
        finalize_video(pool.clone(), id + 999).await;

        let video = db::get_video(&pool, id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Draft);
    }
}
