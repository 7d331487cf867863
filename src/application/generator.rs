//! The replenishment capability: produce a fresh tip for a category.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::{entities::CategoryRecord, error::DomainError, tips::TipDraft};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("content generation is disabled")]
    Disabled,
    #[error("generator request failed: {0}")]
    Request(String),
    #[error("generator returned an unusable response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTip {
    pub draft: TipDraft,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, category: &CategoryRecord) -> Result<GeneratedTip, GeneratorError>;
}

/// Generator used when no backend is configured; replenishment is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl ContentGenerator for DisabledGenerator {
    async fn generate(&self, _category: &CategoryRecord) -> Result<GeneratedTip, GeneratorError> {
        Err(GeneratorError::Disabled)
    }
}
