//! Publisher adapters.

mod oauth;
mod x;

pub use oauth::{OAuthCredentials, OAuthError};
pub use x::XPublisher;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::{
    application::publisher::{PublishReceipt, Publisher},
    config::{PublisherMode, PublisherSettings},
    infra::error::InfraError,
};

/// Writes posts to the log instead of a social platform.
#[derive(Debug, Clone)]
pub struct LogPublisher {
    platform: String,
}

impl LogPublisher {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }
}

#[async_trait]
impl Publisher for LogPublisher {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn publish(&self, text: &str) -> PublishReceipt {
        let id = format!("log-{}", Uuid::new_v4());
        info!(target = "infra::publisher::log", external_id = %id, text = %text, "post written to log");
        PublishReceipt::posted(id)
    }
}

pub fn build_publisher(
    settings: &PublisherSettings,
    platform: &str,
) -> Result<Arc<dyn Publisher>, InfraError> {
    match settings.mode {
        PublisherMode::Log => Ok(Arc::new(LogPublisher::new(platform))),
        PublisherMode::X => {
            let credentials = settings
                .credentials
                .as_ref()
                .map(|creds| OAuthCredentials {
                    consumer_key: creds.api_key.clone(),
                    consumer_secret: creds.api_secret.clone(),
                    access_token: creds.access_token.clone(),
                    access_token_secret: creds.access_token_secret.clone(),
                })
                .ok_or_else(|| {
                    InfraError::configuration(
                        "publisher.mode = \"x\" requires X credentials; use mode \"log\" to run without them",
                    )
                })?;
            let publisher = XPublisher::new(
                settings.api_base.as_str(),
                credentials,
                platform,
                settings.timeout,
            )?;
            Ok(Arc::new(publisher))
        }
    }
}
