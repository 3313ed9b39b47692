use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::ProviderKind;

/// Connection settings for the evaluation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// Request timeout; `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            endpoint: None,
            model: None,
            timeout_secs: None,
        }
    }
}

impl LlmSettings {
    pub const API_KEY_ENV: &'static str = "OPENAI_API_KEY";

    /// Resolve the provider and check provider-specific requirements.
    pub fn validate(&self) -> Result<ProviderKind> {
        let kind: ProviderKind = self.provider.parse()?;
        if kind.requires_api_key() && self.api_key.trim().is_empty() {
            bail!(
                "an API key must be provided via --api-key or {} for provider `{}`",
                Self::API_KEY_ENV,
                self.provider
            );
        }
        Ok(kind)
    }
}
