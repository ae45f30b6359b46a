/*!
 * Tests for application configuration
 */

use anyhow::Result;
use std::collections::HashMap;
use std::str::FromStr;

use doctrans::app_config::{clamp_concurrency, Config, HostedProvider, LogLevel, PathMapping};

use crate::common;

/// Defaults describe the ko -> en documentation layout
#[test]
fn test_default_config_shouldUseKoreanToEnglishLayout() {
    let config = Config::default();

    assert_eq!(config.source_language, "ko");
    assert_eq!(config.target_language, "en");
    assert_eq!(config.pattern, "ko/**/*.md");
    assert_eq!(config.validate_pattern, "en/**/*.md");
    assert_eq!(config.concurrency_limit, 3);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(
        config.path_mappings,
        vec![PathMapping::new("docs-ko", "docs"), PathMapping::new("ko", "en")]
    );
    assert!(config.cli_tool.enabled);
    assert_eq!(config.cli_tool.program, "trans");
    assert!(config.validate().is_ok());
}

/// Providers come in fallback priority order without credentials
#[test]
fn test_default_config_shouldListProvidersInPriorityOrder() {
    let config = Config::default();
    let order: Vec<HostedProvider> = config.translation.providers.iter().map(|p| p.provider_type).collect();

    assert_eq!(order, HostedProvider::ALL.to_vec());
    assert!(!config.translation.has_credentials());
}

/// A missing config file yields the defaults
#[test]
fn test_load_withMissingFile_shouldReturnDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = Config::load(temp_dir.path().join("doctrans.json"))?;

    assert_eq!(config.pattern, Config::default().pattern);
    Ok(())
}

/// A partial config file keeps the defaults for omitted fields
#[test]
fn test_load_withPartialFile_shouldMergeWithDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "doctrans.json",
        r#"{
            "concurrency_limit": 5,
            "brand_names": ["SowonFlow", "SowonAI"],
            "translation": {
                "providers": [
                    { "type": "openai", "model": "gpt-4o" }
                ],
                "common": { "line_delay_ms": 0 }
            },
            "cli_tool": { "enabled": false }
        }"#,
    )?;

    let config = Config::load(&path)?;

    assert_eq!(config.concurrency_limit, 5);
    assert_eq!(config.source_language, "ko");
    assert_eq!(config.brand_names, vec!["SowonFlow", "SowonAI"]);
    assert_eq!(config.translation.providers.len(), 1);
    let openai = config
        .translation
        .get_provider_config(&HostedProvider::OpenAI)
        .expect("openai provider");
    assert_eq!(openai.get_model(), "gpt-4o");
    assert_eq!(openai.get_endpoint(), "https://api.openai.com/v1");
    assert!(openai.enabled);
    assert_eq!(config.translation.common.line_delay_ms, 0);
    assert_eq!(config.translation.common.max_tokens, 4000);
    assert!(!config.cli_tool.enabled);
    assert_eq!(config.cli_tool.program, "trans");
    Ok(())
}

/// Invalid JSON is reported with the file name
#[test]
fn test_load_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "doctrans.json", "{ not json")?;

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("doctrans.json"));
    Ok(())
}

/// Environment credentials and models override the config
#[test]
fn test_apply_env_from_withCredentials_shouldFillProviders() {
    let vars: HashMap<&str, &str> = [
        ("OPENROUTER_API_KEY", "  or-key  "),
        ("GITHUB_TOKEN", ""),
        ("OPENAI_MODEL", "gpt-4o"),
        ("DOCTRANS_CLI_TOOL", "/opt/bin/trans"),
    ]
    .into_iter()
    .collect();

    let mut config = Config::default();
    config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));

    let openrouter = config.translation.get_provider_config(&HostedProvider::OpenRouter).expect("openrouter");
    let github = config.translation.get_provider_config(&HostedProvider::GitHubModels).expect("github");
    let openai = config.translation.get_provider_config(&HostedProvider::OpenAI).expect("openai");

    assert_eq!(openrouter.api_key, "or-key");
    assert!(!github.has_api_key(), "empty variables must be ignored");
    assert_eq!(openai.get_model(), "gpt-4o");
    assert!(config.translation.has_credentials());
    assert_eq!(config.cli_tool.program, "/opt/bin/trans");
}

/// A disabled provider does not count as a credential
#[test]
fn test_has_credentials_withOnlyDisabledProviderKey_shouldBeFalse() {
    let mut config = Config::default();
    config.apply_env_from(|key| (key == "OPENAI_API_KEY").then(|| "sk-test".to_string()));
    for provider in &mut config.translation.providers {
        if provider.provider_type == HostedProvider::OpenAI {
            provider.enabled = false;
        }
    }

    assert!(!config.translation.has_credentials());
}

/// Unknown language codes are rejected
#[test]
fn test_validate_withUnknownLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "zz".to_string();
    assert!(config.validate().is_err());
}

/// Degenerate path mappings are rejected
#[test]
fn test_validate_withInvalidMappings_shouldFail() {
    let mut config = Config::default();
    config.path_mappings = vec![PathMapping::new("ko", "ko")];
    assert!(config.validate().is_err());

    config.path_mappings.clear();
    assert!(config.validate().is_err());
}

/// Malformed endpoints and temperatures are rejected
#[test]
fn test_validate_withBadProviderSettings_shouldFail() {
    let mut config = Config::default();
    config.translation.providers[0].endpoint = "not a url".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.common.temperature = 3.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.cli_tool.program = "  ".to_string();
    assert!(config.validate().is_err());
}

/// Concurrency is clamped to [1, 10]
#[test]
fn test_clamp_concurrency_withOutOfRangeValues_shouldClamp() {
    assert_eq!(clamp_concurrency(0), 1);
    assert_eq!(clamp_concurrency(1), 1);
    assert_eq!(clamp_concurrency(4), 4);
    assert_eq!(clamp_concurrency(10), 10);
    assert_eq!(clamp_concurrency(50), 10);

    let mut config = Config::default();
    config.concurrency_limit = 0;
    assert_eq!(config.effective_concurrency(), 1);
}

/// Provider names parse leniently
#[test]
fn test_hosted_provider_from_str_withVariants_shouldParse() -> Result<()> {
    assert_eq!(HostedProvider::from_str("OpenRouter")?, HostedProvider::OpenRouter);
    assert_eq!(HostedProvider::from_str("github-models")?, HostedProvider::GitHubModels);
    assert_eq!(HostedProvider::from_str("OPENAI")?, HostedProvider::OpenAI);
    assert_eq!(HostedProvider::from_str("Claude")?, HostedProvider::Anthropic);
    assert!(HostedProvider::from_str("ollama").is_err());
    assert_eq!(HostedProvider::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
    assert_eq!(HostedProvider::Anthropic.default_endpoint(), "https://api.anthropic.com/v1");
    assert_eq!(HostedProvider::GitHubModels.display_name(), "GitHub Models");
    assert_eq!(HostedProvider::GitHubModels.api_key_env(), "GITHUB_TOKEN");
    Ok(())
}

/// CLI arguments receive the language codes
#[test]
fn test_render_args_withPlaceholders_shouldSubstituteLanguages() {
    let config = Config::default();
    assert_eq!(config.cli_tool.render_args("ko", "en"), vec!["-brief", "ko:en"]);
}
