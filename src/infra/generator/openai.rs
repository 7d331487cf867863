//! OpenAI-compatible chat completion backend for tip generation.
//!
//! Works with any server exposing `/chat/completions` with JSON mode (OpenAI, vLLM, Ollama).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    application::generator::{ContentGenerator, GeneratedTip, GeneratorError},
    domain::{entities::CategoryRecord, tips::TipDraft, types::TipProvenance},
    infra::error::InfraError,
};

const SYSTEM_PROMPT: &str = "You write short, practical programming tips for social media. \
Reply with a single JSON object with the keys \"title\", \"content\", \"code_example\" and \
\"hashtags\". Keep the title under 80 characters, the content to one or two sentences, and the \
code example under 8 lines. Use null for code_example when code does not help.";

pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InfraError> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            InfraError::configuration(format!("failed to build generator client: {err}"))
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn user_prompt(category: &CategoryRecord) -> String {
        match category.description.as_deref() {
            Some(description) => format!(
                "Write one new tip for the \"{}\" category ({description}).",
                category.name
            ),
            None => format!("Write one new tip for the \"{}\" category.", category.name),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormatRequest,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormatRequest {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedPayload {
    title: String,
    content: String,
    #[serde(default)]
    code_example: Option<String>,
    #[serde(default)]
    hashtags: Option<String>,
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(&self, category: &CategoryRecord) -> Result<GeneratedTip, GeneratorError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(category),
                },
            ],
            response_format: ResponseFormatRequest {
                format_type: "json_object",
            },
            temperature: 0.8,
        };

        let mut http = self.client.post(self.chat_completions_url()).json(&request);
        if let Some(key) = self.api_key.as_deref() {
            http = http.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = http
            .send()
            .await
            .map_err(|err| GeneratorError::Request(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Request(format!("{status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| GeneratorError::InvalidResponse(err.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GeneratorError::InvalidResponse("no completion content".into()))?;
        debug!(target = "infra::generator::openai", category = %category.name, "completion received");

        let payload: GeneratedPayload = serde_json::from_str(content.trim())
            .map_err(|err| GeneratorError::InvalidResponse(format!("not a tip object: {err}")))?;

        let draft = TipDraft {
            category_id: category.id,
            title: payload.title,
            body: payload.content,
            code_sample: payload.code_example,
            hashtags: payload.hashtags,
            provenance: TipProvenance::Generated,
        }
        .normalize()?;

        Ok(GeneratedTip {
            draft,
            created_at: OffsetDateTime::now_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn category() -> CategoryRecord {
        CategoryRecord {
            id: 4,
            name: "Git".into(),
            description: Some("Version control and Git workflow tips".into()),
            created_at: None,
        }
    }

    fn generator(server: &MockServer, api_key: Option<&str>) -> OpenAiGenerator {
        OpenAiGenerator::new(
            server.url("/v1"),
            "gpt-4o-mini",
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[tokio::test]
    async fn completion_becomes_a_generated_draft() {
        let server = MockServer::start_async().await;
        let tip = json!({
            "title": "Use git switch",
            "content": "git switch is clearer than checkout for changing branches.",
            "code_example": "git switch -c feature/login",
            "hashtags": "#Git #CLI"
        });
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "choices": [{ "message": { "role": "assistant", "content": tip.to_string() } }]
                    }));
            })
            .await;

        let generated = generator(&server, Some("sk-test"))
            .generate(&category())
            .await
            .expect("generated");

        mock.assert_async().await;
        assert_eq!(generated.draft.category_id, 4);
        assert_eq!(generated.draft.title, "Use git switch");
        assert_eq!(generated.draft.provenance, TipProvenance::Generated);
        assert_eq!(generated.draft.hashtags.as_deref(), Some("#Git #CLI"));
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let server = MockServer::start_async().await;
        let tip = json!({ "title": " ", "content": "Something", "code_example": null, "hashtags": null });
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "choices": [{ "message": { "content": tip.to_string() } }] }));
            })
            .await;

        match generator(&server, None).generate(&category()).await {
            Err(GeneratorError::Invalid(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_errors_are_request_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(500).body("overloaded");
            })
            .await;

        match generator(&server, None).generate(&category()).await {
            Err(GeneratorError::Request(message)) => assert!(message.contains("overloaded")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
