/*!
 * Integration tests for the backend chain built from configuration
 */

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctrans::app_config::{Config, HostedProvider};
use doctrans::translation::{FallbackOrchestrator, SourceDocument, TranslationTier};

use crate::common;

fn chat_response(content: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
}

/// Offline config whose providers point at local servers, with credentials from a fake environment
fn config_for(endpoints: &[(HostedProvider, &MockServer)], env: &[(&str, &str)]) -> Config {
    let mut config = common::offline_config();
    for provider in &mut config.translation.providers {
        if let Some((_, server)) = endpoints.iter().find(|(p, _)| *p == provider.provider_type) {
            provider.endpoint = server.uri();
        }
    }
    let env: HashMap<String, String> = env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    config.apply_env_from(|key| env.get(key).cloned());
    config
}

fn document(content: &str) -> SourceDocument {
    SourceDocument::from_content("ko/page.md", content, &[])
}

async fn mount_answer(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// A failing provider hands over to the next configured one
#[tokio::test]
async fn test_fallback_withFailingFirstProvider_shouldUseSecond() -> Result<()> {
    common::init_test_logging();
    let openrouter = MockServer::start().await;
    let github = MockServer::start().await;
    mount_answer(&openrouter, 500, json!({ "error": "upstream" })).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer gh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("# Hello\n\nWorld.")))
        .mount(&github)
        .await;

    let config = config_for(
        &[(HostedProvider::OpenRouter, &openrouter), (HostedProvider::GitHubModels, &github)],
        &[("OPENROUTER_API_KEY", "or-key"), ("GITHUB_TOKEN", "gh-token")],
    );
    let orchestrator = FallbackOrchestrator::from_config(&config)?;

    let outcome = orchestrator.translate_document(&document("# 안녕\n\n세계.\n")).await?;

    assert_eq!(
        outcome.tier,
        TranslationTier::Document {
            backend: "GitHub Models".to_string()
        }
    );
    assert_eq!(outcome.text, "# Hello\n\nWorld.\n");
    assert_eq!(openrouter.received_requests().await.unwrap_or_default().len(), 1);
    Ok(())
}

/// A markdown fence wrapped around the whole answer is removed
#[tokio::test]
async fn test_fallback_withFencedAnswer_shouldUnwrapDocument() -> Result<()> {
    let openai = MockServer::start().await;
    mount_answer(&openai, 200, chat_response("```markdown\n# Title\n```")).await;

    let config = config_for(&[(HostedProvider::OpenAI, &openai)], &[("OPENAI_API_KEY", "sk-test")]);
    let outcome = FallbackOrchestrator::from_config(&config)?
        .translate_document(&document("# 제목\n"))
        .await?;

    assert_eq!(outcome.text, "# Title\n");
    Ok(())
}

/// Anthropic answers when OpenAI fails
#[tokio::test]
async fn test_fallback_withFailingOpenAI_shouldUseAnthropic() -> Result<()> {
    let openai = MockServer::start().await;
    let anthropic = MockServer::start().await;
    mount_answer(&openai, 500, json!({ "error": "upstream" })).await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "claude-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "content": [{ "type": "text", "text": "# Title" }] })),
        )
        .mount(&anthropic)
        .await;

    let config = config_for(
        &[(HostedProvider::OpenAI, &openai), (HostedProvider::Anthropic, &anthropic)],
        &[("OPENAI_API_KEY", "sk-test"), ("ANTHROPIC_API_KEY", "claude-key")],
    );
    let outcome = FallbackOrchestrator::from_config(&config)?
        .translate_document(&document("# 제목\n"))
        .await?;

    assert_eq!(
        outcome.tier,
        TranslationTier::Document {
            backend: "Anthropic".to_string()
        }
    );
    assert_eq!(outcome.text, "# Title\n");
    Ok(())
}

/// Rate limiting everywhere leaves the original lines in place
#[tokio::test]
async fn test_fallback_withRateLimitedProviders_shouldKeepOriginalLines() -> Result<()> {
    let openai = MockServer::start().await;
    mount_answer(&openai, 429, json!({ "error": "rate limited" })).await;

    let config = config_for(&[(HostedProvider::OpenAI, &openai)], &[("OPENAI_API_KEY", "sk-test")]);
    let source = "# 제목\n\n```\ncode\n```\n본문\n";
    let outcome = FallbackOrchestrator::from_config(&config)?
        .translate_document(&document(source))
        .await?;

    assert_eq!(outcome.tier, TranslationTier::Lines);
    assert_eq!(outcome.text, source);
    assert_eq!(outcome.lines_kept, 2);
    // one whole-document request, then one per Korean line
    assert_eq!(openai.received_requests().await.unwrap_or_default().len(), 3);
    Ok(())
}

/// Disabled providers are never contacted, even with a key
#[tokio::test]
async fn test_fallback_withDisabledProvider_shouldSkipIt() -> Result<()> {
    let openrouter = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_answer(&openrouter, 200, chat_response("from openrouter")).await;
    mount_answer(&openai, 200, chat_response("from openai")).await;

    let mut config = config_for(
        &[(HostedProvider::OpenRouter, &openrouter), (HostedProvider::OpenAI, &openai)],
        &[("OPENROUTER_API_KEY", "or-key"), ("OPENAI_API_KEY", "sk-test")],
    );
    for provider in &mut config.translation.providers {
        if provider.provider_type == HostedProvider::OpenRouter {
            provider.enabled = false;
        }
    }

    let orchestrator = FallbackOrchestrator::from_config(&config)?;
    assert_eq!(orchestrator.service().backend_names(), vec!["GitHub Models", "OpenAI", "Anthropic", common::MISSING_TOOL]);

    let outcome = orchestrator.translate_document(&document("안녕\n")).await?;

    assert_eq!(outcome.text, "from openai\n");
    assert!(openrouter.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

/// Model overrides from the environment reach the request body
#[tokio::test]
async fn test_request_withModelOverride_shouldSendConfiguredModel() -> Result<()> {
    let openrouter = MockServer::start().await;
    mount_answer(&openrouter, 200, chat_response("Hello")).await;

    let config = config_for(
        &[(HostedProvider::OpenRouter, &openrouter)],
        &[("OPENROUTER_API_KEY", "or-key"), ("OPENROUTER_MODEL", "meta-llama/llama-3-8b")],
    );
    FallbackOrchestrator::from_config(&config)?
        .translate_document(&document("안녕"))
        .await?;

    let requests = openrouter.received_requests().await.unwrap_or_default();
    let body: Value = requests[0].body_json()?;
    assert_eq!(body["model"], "meta-llama/llama-3-8b");
    assert!(body["messages"][1]["content"].as_str().unwrap_or_default().ends_with("안녕"));
    Ok(())
}
