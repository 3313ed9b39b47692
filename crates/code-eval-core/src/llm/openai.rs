use super::{LlmClient, LlmSettings};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            bail!(
                "OpenAI API key must be provided via {}",
                LlmSettings::API_KEY_ENV
            );
        }
        let base = settings.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let url = format!("{}/v1/chat/completions", base.trim_end_matches('/'));
        let mut builder = Client::builder().user_agent(concat!(
            "code-eval/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            http,
            url,
            api_key: settings.api_key.clone(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        info!(model = %self.model, prompt_chars = prompt.len(), "requesting evaluation");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to call OpenAI chat completions API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAI API error ({}): {}", status, body);
        }

        let chat: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to parse OpenAI response")?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI response missing message content"))?;
        debug!(reply_chars = content.len(), "received evaluation reply");
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const COMPLETION_BODY: &str = r##"{"choices":[{"message":{"role":"assistant","content":"# Code Structure Evaluation Report"}}]}"##;

    fn base_settings(url: String) -> LlmSettings {
        LlmSettings {
            provider: "openai".into(),
            api_key: "test-key".into(),
            endpoint: Some(url),
            model: Some("gpt-test".into()),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn requires_api_key() {
        let mut settings = base_settings("http://localhost".into());
        settings.api_key = "  ".into();
        let err = OpenAiClient::new(&settings).unwrap_err();
        assert!(err.to_string().contains(LlmSettings::API_KEY_ENV));
    }

    #[test]
    fn defaults_model_and_endpoint() {
        let settings = LlmSettings {
            api_key: "secret".into(),
            ..LlmSettings::default()
        };
        let client = OpenAiClient::new(&settings).unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.url, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn response_content_may_contain_markdown_headings() {
        let chat: ChatCompletionResponse = serde_json::from_str(COMPLETION_BODY).unwrap();
        let content = chat.choices.into_iter().next().and_then(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("# Code Structure Evaluation Report"));
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn complete_returns_first_choice_content() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .body_contains("expert code evaluator");
            then.status(200)
                .header("content-type", "application/json")
                .body(COMPLETION_BODY);
        });

        let client = OpenAiClient::new(&base_settings(server.base_url())).unwrap();
        let reply = client
            .complete("You are an expert code evaluator assistant.", "evaluate")
            .await
            .unwrap();
        assert_eq!(reply, "# Code Structure Evaluation Report");
        mock.assert();
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn non_success_status_embeds_status_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("rate limited");
        });

        let client = OpenAiClient::new(&base_settings(server.base_url())).unwrap();
        let err = client.complete("system", "prompt").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("rate limited"));
        mock.assert_hits(1);
    }
}
