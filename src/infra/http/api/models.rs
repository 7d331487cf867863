//! Conversions from domain records to the wire types in `tipbot-api-types`.

use tipbot_api_types::{
    CategoryView, NothingToPostReason, PostHistoryView, RotationRunResponse, TipCreateRequest,
    TipView,
};

use crate::application::rotation::{EmptyReason, RotationOutcome};
use crate::domain::entities::{CategoryRecord, PostHistoryRecord, TipRecord};
use crate::domain::tips::TipDraft;

pub fn category_view(record: CategoryRecord) -> CategoryView {
    CategoryView {
        id: record.id,
        name: record.name,
        description: record.description,
        created_at: record.created_at,
    }
}

pub fn tip_view(record: TipRecord) -> TipView {
    TipView {
        id: record.id,
        category_id: record.category_id,
        title: record.title,
        body: record.body,
        code_sample: record.code_sample,
        hashtags: record.hashtags,
        provenance: record.provenance.into(),
        created_at: record.created_at,
        last_posted: record.last_posted,
    }
}

pub fn history_view(record: PostHistoryRecord) -> PostHistoryView {
    PostHistoryView {
        id: record.id,
        tip_id: record.tip_id,
        posted_at: record.posted_at,
        platform: record.platform,
        external_id: record.external_id,
        engagement_count: record.engagement_count,
    }
}

pub fn empty_reason(reason: EmptyReason) -> NothingToPostReason {
    match reason {
        EmptyReason::CategoryEmpty => NothingToPostReason::CategoryEmpty,
        EmptyReason::CategoryExhausted => NothingToPostReason::CategoryExhausted,
    }
}

pub fn rotation_response(outcome: RotationOutcome) -> RotationRunResponse {
    match outcome {
        RotationOutcome::NothingToPost {
            category_id,
            reason,
        } => RotationRunResponse::NothingToPost {
            category_id,
            reason: empty_reason(reason),
        },
        RotationOutcome::Attempted(report) => {
            let report = *report;
            RotationRunResponse::Attempted {
                category_id: report.category_id,
                tip: tip_view(report.tip),
                posted: report.posted,
                external_id: report.external_id,
                history: history_view(report.history),
                replacement: report.replacement.map(tip_view),
            }
        }
    }
}

pub fn tip_draft(request: TipCreateRequest) -> TipDraft {
    TipDraft {
        category_id: request.category_id,
        title: request.title,
        body: request.body,
        code_sample: request.code_sample,
        hashtags: request.hashtags,
        provenance: request.provenance.into(),
    }
}
