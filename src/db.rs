use crate::models::{Segment, SegmentBounds, Video, VideoCreate, VideoStatus};
use chrono::Utc;
use sqlx::SqlitePool;

/// Create the schema if it does not exist yet. Segments are owned by their
/// video and are dropped with it.
pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            video_url   TEXT NOT NULL,
            duration    REAL NOT NULL DEFAULT 0,
            status      TEXT NOT NULL DEFAULT 'Draft',
            created_at  TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS segments (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            start    REAL NOT NULL,
            "end"    REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_segments_video_id ON segments(video_id)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_video(pool: &SqlitePool, input: &VideoCreate) -> sqlx::Result<Video> {
    sqlx::query_as::<_, Video>(
        r#"
        INSERT INTO videos (title, description, video_url, duration, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id, title, description, video_url, duration, status, created_at
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.video_url)
    .bind(input.duration)
    .bind(VideoStatus::Draft)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn get_video(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Video>> {
    sqlx::query_as::<_, Video>(
        "SELECT id, title, description, video_url, duration, status, created_at \
         FROM videos WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List videos, newest first. `q` filters by case-insensitive substring match
/// on the title, `status` by exact match; pagination applies after filtering.
pub async fn list_videos(
    pool: &SqlitePool,
    skip: i64,
    limit: i64,
    q: Option<&str>,
    status: Option<&str>,
) -> sqlx::Result<Vec<Video>> {
    let q = q.filter(|s| !s.is_empty());
    sqlx::query_as::<_, Video>(
        r#"
        SELECT id, title, description, video_url, duration, status, created_at
        FROM videos
        WHERE (?1 IS NULL OR instr(lower(title), lower(?1)) > 0)
          AND (?2 IS NULL OR status = ?2)
        ORDER BY created_at DESC, id DESC
        LIMIT ?3 OFFSET ?4
        "#,
    )
    .bind(q)
    .bind(status)
    .bind(limit.max(0))
    .bind(skip.max(0))
    .fetch_all(pool)
    .await
}

/// Partial update: `None` fields keep their stored values. Returns `None`
/// when the video does not exist.
pub async fn update_video(
    pool: &SqlitePool,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    status: Option<VideoStatus>,
) -> sqlx::Result<Option<Video>> {
    sqlx::query_as::<_, Video>(
        r#"
        UPDATE videos SET
            title       = COALESCE(?1, title),
            description = COALESCE(?2, description),
            status      = COALESCE(?3, status)
        WHERE id = ?4
        RETURNING id, title, description, video_url, duration, status, created_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_status(pool: &SqlitePool, id: i64, status: VideoStatus) -> sqlx::Result<()> {
    sqlx::query("UPDATE videos SET status = ?1 WHERE id = ?2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Swap the video's segment set in one transaction: either the whole new set
/// is persisted or the old set is left intact.
pub async fn replace_segments(
    pool: &SqlitePool,
    video_id: i64,
    bounds: &[SegmentBounds],
) -> sqlx::Result<Vec<Segment>> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM segments WHERE video_id = ?1")
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

    let mut created = Vec::with_capacity(bounds.len());
    for b in bounds {
        let segment = sqlx::query_as::<_, Segment>(
            r#"
            INSERT INTO segments (video_id, start, "end")
            VALUES (?1, ?2, ?3)
            RETURNING id, video_id, start, "end"
            "#,
        )
        .bind(video_id)
        .bind(b.start)
        .bind(b.end)
        .fetch_one(&mut *tx)
        .await?;
        created.push(segment);
    }

    tx.commit().await?;
    Ok(created)
}

pub async fn segments_for_video(pool: &SqlitePool, video_id: i64) -> sqlx::Result<Vec<Segment>> {
    sqlx::query_as::<_, Segment>(
        r#"SELECT id, video_id, start, "end" FROM segments WHERE video_id = ?1 ORDER BY start, id"#,
    )
    .bind(video_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init(&pool).await.unwrap();
        pool
    }

    fn video_input(title: &str, duration: f64) -> VideoCreate {
        VideoCreate {
            title: title.to_string(),
            description: String::new(),
            video_url: format!("http://example.com/{title}.mp4"),
            duration,
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids_and_draft_status() {
        let pool = test_pool().await;

        let a = create_video(&pool, &video_input("first", 10.0)).await.unwrap();
        let b = create_video(&pool, &video_input("second", 20.0)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.status, VideoStatus::Draft);
        assert_eq!(b.status, VideoStatus::Draft);
        assert_eq!(a.description, "");
        assert_eq!(b.duration, 20.0);
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_paginates() {
        let pool = test_pool().await;
        for i in 0..5 {
            create_video(&pool, &video_input(&format!("video-{i}"), 1.0))
                .await
                .unwrap();
        }

        let all = list_videos(&pool, 0, 20, None, None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].title, "video-4");
        assert_eq!(all[4].title, "video-0");

        let page = list_videos(&pool, 1, 2, None, None).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "video-3");
        assert_eq!(page[1].title, "video-2");
    }

    #[tokio::test]
    async fn list_filters_by_title_substring_and_status() {
        let pool = test_pool().await;
        let cat = create_video(&pool, &video_input("Cat Compilation", 5.0))
            .await
            .unwrap();
        create_video(&pool, &video_input("Dog Tricks", 5.0)).await.unwrap();

        let cats = list_videos(&pool, 0, 20, Some("cat"), None).await.unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].id, cat.id);

        set_status(&pool, cat.id, VideoStatus::Ready).await.unwrap();
        let ready = list_videos(&pool, 0, 20, None, Some("Ready")).await.unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, cat.id);

        let none = list_videos(&pool, 0, 20, Some("cat"), Some("Draft"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_applies_only_provided_fields() {
        let pool = test_pool().await;
        let video = create_video(&pool, &video_input("original", 10.0))
            .await
            .unwrap();

        let updated = update_video(&pool, video.id, None, Some("new description"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "original");
        assert_eq!(updated.description, "new description");
        assert_eq!(updated.status, VideoStatus::Draft);
        assert_eq!(updated.created_at, video.created_at);

        let missing = update_video(&pool, video.id + 999, Some("x"), None, None)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn replace_segments_swaps_the_whole_set() {
        let pool = test_pool().await;
        let video = create_video(&pool, &video_input("splittable", 100.0))
            .await
            .unwrap();

        let first = replace_segments(
            &pool,
            video.id,
            &[
                SegmentBounds { start: 0.0, end: 30.0 },
                SegmentBounds { start: 30.0, end: 100.0 },
            ],
        )
        .await
        .unwrap();
        assert_eq!(first.len(), 2);

        let second = replace_segments(&pool, video.id, &[SegmentBounds { start: 0.0, end: 100.0 }])
            .await
            .unwrap();
        assert_eq!(second.len(), 1);

        let stored = segments_for_video(&pool, video.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, second[0].id);
        assert_eq!(stored[0].start, 0.0);
        assert_eq!(stored[0].end, 100.0);
        assert!(first.iter().all(|s| s.id != stored[0].id));
    }
}
