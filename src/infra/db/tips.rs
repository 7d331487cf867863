use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateTipParams, RecordPostParams, RepoError, TipQueryFilter, TipsRepo, TipsWriteRepo,
    },
    domain::{
        entities::{PostHistoryRecord, TipRecord},
        types::TipProvenance,
    },
};

use super::{PostgresRepositories, history::PostHistoryRow, map_sqlx_error};

pub(super) const TIP_COLUMNS: &str = "t.id, t.category_id, t.title, t.content, t.code_example, \
    t.hashtags, t.is_ai_generated, t.created_at, t.last_posted";

#[derive(sqlx::FromRow)]
pub(super) struct TipRow {
    id: i64,
    category_id: i64,
    title: String,
    content: String,
    code_example: Option<String>,
    hashtags: Option<String>,
    is_ai_generated: bool,
    created_at: OffsetDateTime,
    last_posted: Option<OffsetDateTime>,
}

impl From<TipRow> for TipRecord {
    fn from(row: TipRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            title: row.title,
            body: row.content,
            code_sample: row.code_example,
            hashtags: row.hashtags,
            provenance: TipProvenance::from_generated_flag(row.is_ai_generated),
            created_at: row.created_at,
            last_posted: row.last_posted,
        }
    }
}

fn id_list(ids: &BTreeSet<i64>) -> Vec<i64> {
    ids.iter().copied().collect()
}

#[async_trait]
impl TipsRepo for PostgresRepositories {
    async fn list_tip_ids(&self, category_id: i64) -> Result<BTreeSet<i64>, RepoError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM tips WHERE category_id = $1")
            .bind(category_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ids.into_iter().collect())
    }

    async fn list_posted_tip_ids(&self, ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>, RepoError> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let posted = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT tip_id
            FROM post_history
            WHERE tip_id = ANY($1)
            "#,
        )
        .bind(id_list(ids))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(posted.into_iter().collect())
    }

    async fn get_tips(&self, ids: &BTreeSet<i64>) -> Result<Vec<TipRecord>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TipRow>(&format!(
            "SELECT {TIP_COLUMNS} FROM tips t WHERE t.id = ANY($1) ORDER BY t.id"
        ))
        .bind(id_list(ids))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TipRecord::from).collect())
    }

    async fn get_tip(&self, id: i64) -> Result<Option<TipRecord>, RepoError> {
        let row = sqlx::query_as::<_, TipRow>(&format!(
            "SELECT {TIP_COLUMNS} FROM tips t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TipRecord::from))
    }

    async fn list_tips(&self, filter: &TipQueryFilter) -> Result<Vec<TipRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TIP_COLUMNS} FROM tips t WHERE 1=1"
        ));

        if let Some(category_id) = filter.category_id {
            qb.push(" AND t.category_id = ");
            qb.push_bind(category_id);
        }

        match filter.posted {
            Some(true) => {
                qb.push(" AND EXISTS (SELECT 1 FROM post_history h WHERE h.tip_id = t.id)");
            }
            Some(false) => {
                qb.push(" AND NOT EXISTS (SELECT 1 FROM post_history h WHERE h.tip_id = t.id)");
            }
            None => {}
        }

        qb.push(" ORDER BY t.category_id, t.id");

        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }

        let rows = qb
            .build_query_as::<TipRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TipRecord::from).collect())
    }
}

#[async_trait]
impl TipsWriteRepo for PostgresRepositories {
    async fn insert_tip(&self, params: CreateTipParams) -> Result<TipRecord, RepoError> {
        let row = sqlx::query_as::<_, TipRow>(
            r#"
            INSERT INTO tips AS t
                (category_id, title, content, code_example, hashtags, is_ai_generated, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING t.id, t.category_id, t.title, t.content, t.code_example,
                t.hashtags, t.is_ai_generated, t.created_at, t.last_posted
            "#,
        )
        .bind(params.category_id)
        .bind(params.title)
        .bind(params.body)
        .bind(params.code_sample)
        .bind(params.hashtags)
        .bind(params.provenance.is_generated())
        .bind(params.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_tip(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM tips WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_post(&self, params: RecordPostParams) -> Result<PostHistoryRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, PostHistoryRow>(
            r#"
            INSERT INTO post_history (tip_id, posted_at, platform, post_id, engagement_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tip_id, posted_at, platform, post_id, engagement_count
            "#,
        )
        .bind(params.tip_id)
        .bind(params.posted_at)
        .bind(&params.platform)
        .bind(&params.external_id)
        .bind(params.engagement_count)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let updated = sqlx::query("UPDATE tips SET last_posted = $2 WHERE id = $1")
            .bind(params.tip_id)
            .bind(params.posted_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
