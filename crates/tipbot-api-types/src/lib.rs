//! Request and response bodies exchanged with the tipbot HTTP API.
//!
//! Timestamps are encoded as RFC 3339 strings.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Who authored a tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipProvenance {
    #[default]
    Human,
    Generated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipView {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub body: String,
    pub code_sample: Option<String>,
    pub hashtags: Option<String>,
    pub provenance: TipProvenance,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub last_posted: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipCreateRequest {
    pub category_id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub code_sample: Option<String>,
    /// Falls back to the catalog default when omitted.
    #[serde(default)]
    pub hashtags: Option<String>,
    #[serde(default)]
    pub provenance: TipProvenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipListResponse {
    pub items: Vec<TipView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostHistoryView {
    pub id: i64,
    pub tip_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub posted_at: OffsetDateTime,
    pub platform: String,
    /// Empty when the publish attempt failed.
    pub external_id: String,
    pub engagement_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub items: Vec<PostHistoryView>,
}

/// Why a rotation cycle had nothing to post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NothingToPostReason {
    CategoryEmpty,
    CategoryExhausted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RotationRunResponse {
    NothingToPost {
        category_id: i64,
        reason: NothingToPostReason,
    },
    Attempted {
        category_id: i64,
        tip: TipView,
        posted: bool,
        external_id: Option<String>,
        history: PostHistoryView,
        replacement: Option<TipView>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayTipResponse {
    pub category_id: i64,
    pub tip: TipView,
    /// Exact text that would be handed to the publisher.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn create_request_defaults_provenance_to_human() {
        let request: TipCreateRequest = serde_json::from_str(
            r#"{"category_id": 3, "title": "Use health checks", "body": "Add HEALTHCHECK."}"#,
        )
        .expect("valid request");

        assert_eq!(request.provenance, TipProvenance::Human);
        assert!(request.code_sample.is_none());
        assert!(request.hashtags.is_none());
    }

    #[test]
    fn rotation_response_is_tagged_by_status() {
        let response = RotationRunResponse::NothingToPost {
            category_id: 7,
            reason: NothingToPostReason::CategoryExhausted,
        };

        let value = serde_json::to_value(&response).expect("serializes");
        assert_eq!(value["status"], "nothing_to_post");
        assert_eq!(value["reason"], "category_exhausted");
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let view = PostHistoryView {
            id: 1,
            tip_id: 5,
            posted_at: datetime!(2025-03-05 09:00:00 UTC),
            platform: "twitter".into(),
            external_id: String::new(),
            engagement_count: 0,
        };

        let value = serde_json::to_value(&view).expect("serializes");
        assert_eq!(value["posted_at"], "2025-03-05T09:00:00Z");
    }
}
