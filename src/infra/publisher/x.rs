//! Publisher for the X (Twitter) v2 API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    application::publisher::{PublishReceipt, Publisher},
    infra::error::InfraError,
};

use super::oauth::OAuthCredentials;

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: Option<CreatedPost>,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: Option<String>,
}

pub struct XPublisher {
    client: Client,
    endpoint: String,
    credentials: OAuthCredentials,
    platform: String,
}

impl XPublisher {
    pub fn new(
        api_base: &str,
        credentials: OAuthCredentials,
        platform: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::configuration(format!("failed to build X client: {err}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/2/tweets", api_base.trim_end_matches('/')),
            credentials,
            platform: platform.into(),
        })
    }

    async fn try_publish(&self, text: &str) -> Result<PublishReceipt, String> {
        let authorization = self
            .credentials
            .authorization_header("POST", &self.endpoint, &[])
            .map_err(|err| err.to_string())?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, authorization)
            .json(&CreatePostRequest { text })
            .send()
            .await
            .map_err(|err| format!("request failed: {err}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("X API returned {status}: {body}"));
        }

        let body: CreatePostResponse = response
            .json()
            .await
            .map_err(|err| format!("unreadable response body: {err}"))?;

        match body.data.and_then(|data| data.id).filter(|id| !id.is_empty()) {
            Some(id) => Ok(PublishReceipt::posted(id)),
            None => Err("response did not include a post id".to_string()),
        }
    }
}

#[async_trait]
impl Publisher for XPublisher {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn publish(&self, text: &str) -> PublishReceipt {
        match self.try_publish(text).await {
            Ok(receipt) => {
                info!(
                    target = "infra::publisher::x",
                    external_id = receipt.external_id.as_deref().unwrap_or(""),
                    chars = text.chars().count(),
                    "post published"
                );
                receipt
            }
            Err(reason) => {
                warn!(target = "infra::publisher::x", reason = %reason, "post rejected");
                PublishReceipt::failed()
            }
        }
    }
}
