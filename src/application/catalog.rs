//! Catalog maintenance: categories, tips, and the post history.

use std::{collections::BTreeSet, sync::Arc};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    application::repos::{
        CategoriesRepo, CreateTipParams, HistoryRepo, RepoError, TipQueryFilter, TipsRepo,
        TipsWriteRepo,
    },
    domain::{
        entities::{CategoryRecord, PostHistoryRecord, TipRecord},
        error::DomainError,
        tips::TipDraft,
    },
};

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 500;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("category {0} does not exist")]
    UnknownCategory(i64),
    #[error("tip {0} has post history and cannot be deleted")]
    TipInUse(i64),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct CatalogService {
    categories: Arc<dyn CategoriesRepo>,
    tips: Arc<dyn TipsRepo>,
    writer: Arc<dyn TipsWriteRepo>,
    history: Arc<dyn HistoryRepo>,
}

impl CatalogService {
    pub fn new(
        categories: Arc<dyn CategoriesRepo>,
        tips: Arc<dyn TipsRepo>,
        writer: Arc<dyn TipsWriteRepo>,
        history: Arc<dyn HistoryRepo>,
    ) -> Self {
        Self {
            categories,
            tips,
            writer,
            history,
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CatalogError> {
        Ok(self.categories.list_categories().await?)
    }

    pub async fn list_tips(&self, mut filter: TipQueryFilter) -> Result<Vec<TipRecord>, CatalogError> {
        filter.limit = filter.limit.map(|limit| limit.clamp(1, MAX_LIST_LIMIT));
        Ok(self.tips.list_tips(&filter).await?)
    }

    pub async fn find_tip(&self, id: i64) -> Result<Option<TipRecord>, CatalogError> {
        Ok(self.tips.get_tip(id).await?)
    }

    pub async fn create_tip(&self, draft: TipDraft) -> Result<TipRecord, CatalogError> {
        let draft = draft.normalize()?;
        if self
            .categories
            .find_category(draft.category_id)
            .await?
            .is_none()
        {
            return Err(CatalogError::UnknownCategory(draft.category_id));
        }

        let tip = self
            .writer
            .insert_tip(CreateTipParams::from_draft(draft, OffsetDateTime::now_utc()))
            .await?;

        info!(
            target = "application::catalog",
            tip_id = tip.id,
            category_id = tip.category_id,
            provenance = tip.provenance.as_str(),
            "tip created"
        );
        Ok(tip)
    }

    /// Delete a tip that has never been attempted. Returns `false` when the tip does not exist.
    pub async fn delete_tip(&self, id: i64) -> Result<bool, CatalogError> {
        let posted = self.tips.list_posted_tip_ids(&BTreeSet::from([id])).await?;
        if posted.contains(&id) {
            return Err(CatalogError::TipInUse(id));
        }

        match self.writer.delete_tip(id).await {
            Ok(deleted) => {
                if deleted {
                    info!(target = "application::catalog", tip_id = id, "tip deleted");
                }
                Ok(deleted)
            }
            Err(RepoError::Integrity { .. }) => Err(CatalogError::TipInUse(id)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list_history(&self, limit: Option<u32>) -> Result<Vec<PostHistoryRecord>, CatalogError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        Ok(self.history.list_history(limit).await?)
    }
}
