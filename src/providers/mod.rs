/*!
 * Translation backends.
 *
 * - `chat_completion`: hosted chat-completion APIs (OpenRouter, GitHub Models, OpenAI)
 * - `anthropic`: the Anthropic Messages API
 * - `cli_tool`: a local command line translator, the terminal fallback
 * - `mock`: scripted backend for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{HostedProvider, ProviderConfig, TranslationCommonConfig};
use crate::errors::ProviderError;
use crate::translation::document::TranslationRequest;

/// Common trait for hosted translation backends
///
/// Implementations are interchangeable in the fallback chain held by the
/// translation service.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Name used in logs and outcomes
    fn name(&self) -> &str;

    /// Translate the request text
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or why the backend could not produce it
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;
}

/// Build the client matching a provider's wire format
pub fn hosted_backend(
    config: &ProviderConfig,
    common: &TranslationCommonConfig,
    brand_names: &[String],
) -> Arc<dyn TranslationBackend> {
    match config.provider_type {
        HostedProvider::Anthropic => Arc::new(anthropic::AnthropicClient::new(config, common, brand_names)),
        _ => Arc::new(chat_completion::ChatCompletionClient::new(config, common, brand_names)),
    }
}

pub mod anthropic;
pub mod chat_completion;
pub mod cli_tool;
pub mod mock;
