use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::{HostedProvider, ProviderConfig, TranslationCommonConfig};
use crate::errors::ProviderError;
use crate::providers::TranslationBackend;
use crate::translation::document::TranslationRequest;
use crate::translation::prompts::PromptBuilder;

/// Version header the Messages API requires
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API
#[derive(Debug)]
pub struct AnthropicClient {
    /// HTTP client for API requests
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    prompts: PromptBuilder,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    pub model: String,

    /// System prompt, outside the message list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub messages: Vec<AnthropicMessage>,

    pub max_tokens: u32,

    pub temperature: f32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,
    pub content: String,
}

/// Anthropic response; only the content blocks are read
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub content: Vec<AnthropicContent>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    #[serde(rename = "type")]
    pub content_type: String,

    #[serde(default)]
    pub text: Option<String>,
}

impl AnthropicClient {
    pub fn new(config: &ProviderConfig, common: &TranslationCommonConfig, brand_names: &[String]) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.trim().to_string(),
            endpoint: config.get_endpoint(),
            model: config.get_model(),
            temperature: common.temperature,
            max_tokens: common.max_tokens,
            prompts: PromptBuilder::new(brand_names),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.endpoint.trim_end_matches('/'))
    }

    pub fn build_request(&self, request: &TranslationRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            system: Some(self.prompts.system_prompt(request)),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: self.prompts.user_message(request),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Concatenate the text blocks of a response body
    pub fn extract_text(body: &str) -> Result<String, ProviderError> {
        let response: AnthropicResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        let texts: Vec<String> = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if texts.is_empty() {
            return Err(ProviderError::MalformedResponse("missing content[0].text".to_string()));
        }
        Ok(texts.concat())
    }
}

#[async_trait]
impl TranslationBackend for AnthropicClient {
    fn name(&self) -> &str {
        HostedProvider::Anthropic.display_name()
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        if !self.has_api_key() {
            return Err(ProviderError::AuthMissing(format!(
                "Anthropic (set {})",
                HostedProvider::Anthropic.api_key_env()
            )));
        }

        let body = self.build_request(request);
        debug!("Anthropic: sending {} characters to {}", request.text.len(), self.model);

        let response = self
            .client
            .post(self.messages_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Anthropic: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Anthropic: failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::UpstreamError {
                status_code: status.as_u16(),
                body: text,
            });
        }

        Self::extract_text(&text)
    }
}
