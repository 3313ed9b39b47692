mod openai;
mod settings;

use std::str::FromStr;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

pub use openai::OpenAiClient;
pub use settings::LlmSettings;

/// Client abstraction for chat-completion style language models.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one system + user exchange and return the generated text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Supported model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Noop,
}

impl ProviderKind {
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Noop)
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "noop" => Ok(Self::Noop),
            other => Err(anyhow!(
                "unsupported LLM provider `{other}` (expected `openai` or `noop`)"
            )),
        }
    }
}

/// Construct the client selected by `settings`.
pub fn build_client(settings: &LlmSettings) -> Result<Box<dyn LlmClient>> {
    match settings.validate()? {
        ProviderKind::OpenAi => Ok(Box::new(OpenAiClient::new(settings)?)),
        ProviderKind::Noop => Ok(Box::new(NoopLlmClient)),
    }
}

/// Offline client that answers with a fixed report carrying no score.
#[derive(Debug, Default, Clone)]
pub struct NoopLlmClient;

#[async_trait]
impl LlmClient for NoopLlmClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(NOOP_REPLY.to_string())
    }
}

const NOOP_REPLY: &str = "# Code Structure Evaluation Report

## Summary

No LLM provider was configured, so no evaluation was performed.

## Overall Feedback

Configure the `openai` provider and an API key to receive a scored evaluation.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_are_case_insensitive() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" noop ".parse::<ProviderKind>().unwrap(), ProviderKind::Noop);
        assert!("gemini".parse::<ProviderKind>().is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn noop_client_returns_report_heading() {
        let settings = LlmSettings {
            provider: "noop".into(),
            ..LlmSettings::default()
        };
        let client = build_client(&settings).unwrap();
        let reply = client.complete("system", "prompt").await.unwrap();
        assert!(reply.starts_with("# Code Structure Evaluation Report"));
    }
}
