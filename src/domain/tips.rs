//! Validation rules for tips entering the catalog.

use crate::domain::{error::DomainError, types::TipProvenance};

pub const TITLE_MAX_CHARS: usize = 200;
pub const HASHTAGS_MAX_CHARS: usize = 200;
pub const DEFAULT_HASHTAGS: &str = "#DailyTechTip #Coding";

/// A tip that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TipDraft {
    pub category_id: i64,
    pub title: String,
    pub body: String,
    pub code_sample: Option<String>,
    pub hashtags: Option<String>,
    pub provenance: TipProvenance,
}

impl TipDraft {
    /// Trim text fields, drop blank code samples, default the hashtags, and enforce column limits.
    pub fn normalize(self) -> Result<Self, DomainError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(DomainError::validation(
                "title",
                format!("must be at most {TITLE_MAX_CHARS} characters"),
            ));
        }

        let body = self.body.trim().to_string();
        if body.is_empty() {
            return Err(DomainError::validation("body", "must not be empty"));
        }

        let code_sample = self
            .code_sample
            .filter(|code| !code.trim().is_empty())
            .map(|code| code.trim_end().to_string());

        let hashtags = self
            .hashtags
            .map(|tags| tags.trim().to_string())
            .filter(|tags| !tags.is_empty())
            .unwrap_or_else(|| DEFAULT_HASHTAGS.to_string());
        if hashtags.chars().count() > HASHTAGS_MAX_CHARS {
            return Err(DomainError::validation(
                "hashtags",
                format!("must be at most {HASHTAGS_MAX_CHARS} characters"),
            ));
        }

        Ok(Self {
            category_id: self.category_id,
            title,
            body,
            code_sample,
            hashtags: Some(hashtags),
            provenance: self.provenance,
        })
    }
}
