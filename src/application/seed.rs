//! Starter catalog bundled with the binary.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
    application::repos::{RepoError, SeedRepo},
    domain::{error::DomainError, tips::TipDraft, types::TipProvenance},
};

pub const BUNDLED_SEED: &str = include_str!("../../config/seed.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCatalog {
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tips: Vec<SeedTip>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedTip {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub code_sample: Option<String>,
    #[serde(default)]
    pub hashtags: Option<String>,
}

impl SeedTip {
    /// Validated draft; the category id is assigned by the repository.
    pub fn to_draft(&self) -> Result<TipDraft, DomainError> {
        TipDraft {
            category_id: 0,
            title: self.title.clone(),
            body: self.body.clone(),
            code_sample: self.code_sample.clone(),
            hashtags: self.hashtags.clone(),
            provenance: TipProvenance::Human,
        }
        .normalize()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub tips_created: usize,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed catalog is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("seed tip `{title}` is invalid: {source}")]
    InvalidTip {
        title: String,
        #[source]
        source: DomainError,
    },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl SeedCatalog {
    pub fn bundled() -> Result<Self, SeedError> {
        Self::parse(BUNDLED_SEED)
    }

    pub fn parse(source: &str) -> Result<Self, SeedError> {
        let catalog: SeedCatalog = toml::from_str(source)?;
        for tip in catalog.categories.iter().flat_map(|category| &category.tips) {
            tip.to_draft().map_err(|source| SeedError::InvalidTip {
                title: tip.title.clone(),
                source,
            })?;
        }
        Ok(catalog)
    }

    pub fn tip_count(&self) -> usize {
        self.categories.iter().map(|category| category.tips.len()).sum()
    }
}

pub struct SeedService {
    repo: Arc<dyn SeedRepo>,
}

impl SeedService {
    pub fn new(repo: Arc<dyn SeedRepo>) -> Self {
        Self { repo }
    }

    /// Insert whatever part of the catalog is missing. Safe to run repeatedly.
    pub async fn apply(&self, catalog: &SeedCatalog) -> Result<SeedSummary, SeedError> {
        let summary = self.repo.seed_catalog(catalog).await?;
        info!(
            target = "application::seed",
            categories_created = summary.categories_created,
            tips_created = summary.tips_created,
            tips_in_catalog = catalog.tip_count(),
            "seed catalog applied"
        );
        Ok(summary)
    }
}
