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

/// Client for one hosted chat-completion API
#[derive(Debug)]
pub struct ChatCompletionClient {
    /// HTTP client for API requests
    client: Client,
    provider: HostedProvider,
    name: String,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    prompts: PromptBuilder,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

/// One chat message
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Chat completion response; only the fields that are read
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

impl ChatCompletionClient {
    /// Create a client from provider and shared settings
    pub fn new(config: &ProviderConfig, common: &TranslationCommonConfig, brand_names: &[String]) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            provider: config.provider_type,
            name: config.provider_type.display_name().to_string(),
            api_key: config.api_key.trim().to_string(),
            endpoint: config.get_endpoint(),
            model: config.get_model(),
            temperature: common.temperature,
            max_tokens: common.max_tokens,
            top_p: common.top_p,
            prompts: PromptBuilder::new(brand_names),
        }
    }

    pub fn provider(&self) -> HostedProvider {
        self.provider
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Build the request body for a translation request
    pub fn build_request(&self, request: &TranslationRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", self.prompts.system_prompt(request)),
                ChatMessage::new("user", self.prompts.user_message(request)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        }
    }

    /// Pull `choices[0].message.content` out of a response body
    pub fn extract_text(body: &str) -> Result<String, ProviderError> {
        let response: ChatCompletionResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("missing choices[0].message.content".to_string()))
    }
}

#[async_trait]
impl TranslationBackend for ChatCompletionClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        if !self.has_api_key() {
            return Err(ProviderError::AuthMissing(format!(
                "{} (set {})",
                self.name,
                self.provider.api_key_env()
            )));
        }

        let body = self.build_request(request);
        debug!("{}: sending {} characters to {}", self.name, request.text.len(), self.model);

        let response = self
            .client
            .post(self.completions_url())
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("{}: {}", self.name, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("{}: failed to read response: {}", self.name, e)))?;

        if !status.is_success() {
            return Err(ProviderError::UpstreamError {
                status_code: status.as_u16(),
                body: text,
            });
        }

        Self::extract_text(&text)
    }
}
