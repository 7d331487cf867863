use async_trait::async_trait;

use crate::application::{
    repos::{RepoError, SeedRepo},
    seed::{SeedCatalog, SeedSummary},
};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SeedRepo for PostgresRepositories {
    async fn seed_catalog(&self, catalog: &SeedCatalog) -> Result<SeedSummary, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        let mut summary = SeedSummary::default();

        for category in &catalog.categories {
            let inserted = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO categories (name, description)
                VALUES ($1, $2)
                ON CONFLICT (name) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(&category.name)
            .bind(&category.description)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            let category_id = match inserted {
                Some(id) => {
                    summary.categories_created += 1;
                    id
                }
                None => sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE name = $1")
                    .bind(&category.name)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?,
            };

            for tip in &category.tips {
                let draft = tip.to_draft().map_err(|err| RepoError::InvalidInput {
                    message: err.to_string(),
                })?;

                let created = sqlx::query(
                    r#"
                    INSERT INTO tips (category_id, title, content, code_example, hashtags)
                    SELECT $1, $2, $3, $4, $5
                    WHERE NOT EXISTS (
                        SELECT 1 FROM tips WHERE category_id = $1 AND title = $2
                    )
                    "#,
                )
                .bind(category_id)
                .bind(&draft.title)
                .bind(&draft.body)
                .bind(&draft.code_sample)
                .bind(&draft.hashtags)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

                summary.tips_created += created.rows_affected() as usize;
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(summary)
    }
}
