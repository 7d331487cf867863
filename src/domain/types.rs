//! Shared domain enumerations aligned with persisted columns.

use serde::{Deserialize, Serialize};

/// Authorship of a tip. Persisted as the `is_ai_generated` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipProvenance {
    #[default]
    Human,
    Generated,
}

impl TipProvenance {
    pub fn from_generated_flag(is_ai_generated: bool) -> Self {
        if is_ai_generated {
            TipProvenance::Generated
        } else {
            TipProvenance::Human
        }
    }

    pub fn is_generated(self) -> bool {
        matches!(self, TipProvenance::Generated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TipProvenance::Human => "human",
            TipProvenance::Generated => "generated",
        }
    }
}

impl From<tipbot_api_types::TipProvenance> for TipProvenance {
    fn from(value: tipbot_api_types::TipProvenance) -> Self {
        match value {
            tipbot_api_types::TipProvenance::Human => TipProvenance::Human,
            tipbot_api_types::TipProvenance::Generated => TipProvenance::Generated,
        }
    }
}

impl From<TipProvenance> for tipbot_api_types::TipProvenance {
    fn from(value: TipProvenance) -> Self {
        match value {
            TipProvenance::Human => tipbot_api_types::TipProvenance::Human,
            TipProvenance::Generated => tipbot_api_types::TipProvenance::Generated,
        }
    }
}
