//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::TipProvenance;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TipRecord {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub body: String,
    pub code_sample: Option<String>,
    pub hashtags: Option<String>,
    pub provenance: TipProvenance,
    pub created_at: OffsetDateTime,
    pub last_posted: Option<OffsetDateTime>,
}

/// One publish attempt. `external_id` is empty when the attempt failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHistoryRecord {
    pub id: i64,
    pub tip_id: i64,
    pub posted_at: OffsetDateTime,
    pub platform: String,
    pub external_id: String,
    pub engagement_count: i32,
}

impl PostHistoryRecord {
    pub fn succeeded(&self) -> bool {
        !self.external_id.is_empty()
    }
}
