//! Repository traits describing persistence adapters.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::seed::{SeedCatalog, SeedSummary};
use crate::domain::entities::{CategoryRecord, PostHistoryRecord, TipRecord};
use crate::domain::tips::TipDraft;
use crate::domain::types::TipProvenance;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TipQueryFilter {
    pub category_id: Option<i64>,
    /// `Some(true)` keeps tips with a post attempt, `Some(false)` keeps the unposted ones.
    pub posted: Option<bool>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CreateTipParams {
    pub category_id: i64,
    pub title: String,
    pub body: String,
    pub code_sample: Option<String>,
    pub hashtags: Option<String>,
    pub provenance: TipProvenance,
    pub created_at: OffsetDateTime,
}

impl CreateTipParams {
    pub fn from_draft(draft: TipDraft, created_at: OffsetDateTime) -> Self {
        Self {
            category_id: draft.category_id,
            title: draft.title,
            body: draft.body,
            code_sample: draft.code_sample,
            hashtags: draft.hashtags,
            provenance: draft.provenance,
            created_at,
        }
    }
}

/// A publish attempt to append to the history.
#[derive(Debug, Clone)]
pub struct RecordPostParams {
    pub tip_id: i64,
    pub posted_at: OffsetDateTime,
    pub platform: String,
    pub external_id: String,
    pub engagement_count: i32,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait TipsRepo: Send + Sync {
    async fn list_tip_ids(&self, category_id: i64) -> Result<BTreeSet<i64>, RepoError>;

    /// The subset of `ids` that already has a post history record.
    async fn list_posted_tip_ids(&self, ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>, RepoError>;

    async fn get_tips(&self, ids: &BTreeSet<i64>) -> Result<Vec<TipRecord>, RepoError>;

    async fn get_tip(&self, id: i64) -> Result<Option<TipRecord>, RepoError>;

    async fn list_tips(&self, filter: &TipQueryFilter) -> Result<Vec<TipRecord>, RepoError>;
}

#[async_trait]
pub trait TipsWriteRepo: Send + Sync {
    async fn insert_tip(&self, params: CreateTipParams) -> Result<TipRecord, RepoError>;

    /// Returns `false` when no tip had that id.
    async fn delete_tip(&self, id: i64) -> Result<bool, RepoError>;

    /// Insert the history row and set the tip's `last_posted` in one transaction.
    /// Either both writes land or neither does.
    async fn record_post(&self, params: RecordPostParams) -> Result<PostHistoryRecord, RepoError>;
}

#[async_trait]
pub trait HistoryRepo: Send + Sync {
    /// Most recent attempts first.
    async fn list_history(&self, limit: u32) -> Result<Vec<PostHistoryRecord>, RepoError>;
}

#[async_trait]
pub trait SeedRepo: Send + Sync {
    async fn seed_catalog(&self, catalog: &SeedCatalog) -> Result<SeedSummary, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
