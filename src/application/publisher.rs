//! The outbound "post this text" capability.

use async_trait::async_trait;

/// Result of one publish attempt. Publishers never raise for expected failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub posted: bool,
    pub external_id: Option<String>,
}

impl PublishReceipt {
    pub fn posted(external_id: impl Into<String>) -> Self {
        Self {
            posted: true,
            external_id: Some(external_id.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            posted: false,
            external_id: None,
        }
    }

    /// Identifier stored in the post history; empty for failed attempts.
    pub fn history_id(&self) -> String {
        if self.posted {
            self.external_id.clone().unwrap_or_default()
        } else {
            String::new()
        }
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Platform tag recorded next to each attempt.
    fn platform(&self) -> &str;

    async fn publish(&self, text: &str) -> PublishReceipt;
}
