use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{HistoryRepo, RepoError},
    domain::entities::PostHistoryRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct PostHistoryRow {
    id: i64,
    tip_id: i64,
    posted_at: OffsetDateTime,
    platform: String,
    post_id: String,
    engagement_count: i32,
}

impl From<PostHistoryRow> for PostHistoryRecord {
    fn from(row: PostHistoryRow) -> Self {
        Self {
            id: row.id,
            tip_id: row.tip_id,
            posted_at: row.posted_at,
            platform: row.platform,
            external_id: row.post_id,
            engagement_count: row.engagement_count,
        }
    }
}

#[async_trait]
impl HistoryRepo for PostgresRepositories {
    async fn list_history(&self, limit: u32) -> Result<Vec<PostHistoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostHistoryRow>(
            r#"
            SELECT id, tip_id, posted_at, platform, post_id, engagement_count
            FROM post_history
            ORDER BY posted_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostHistoryRecord::from).collect())
    }
}
