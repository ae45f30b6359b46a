use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

// @module: Configuration; defaults, optional JSON file, environment overrides

/// Settings for every doctrans command
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Glob selecting the source documents, relative to the docs root
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Glob selecting translated documents for validation
    #[serde(default = "default_validate_pattern")]
    pub validate_pattern: String,

    /// Retranslate documents whose target already exists
    #[serde(default)]
    pub force_overwrite: bool,

    /// Files translated at the same time by `all`
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Local command line translator
    #[serde(default)]
    pub cli_tool: CliToolConfig,

    /// Source root to target root substitutions, first match wins
    #[serde(default = "default_path_mappings")]
    pub path_mappings: Vec<PathMapping>,

    /// Canonical brand spellings restored after translation
    #[serde(default = "default_brand_names")]
    pub brand_names: Vec<String>,

    /// File names treated as tables of contents
    #[serde(default = "default_toc_file_names")]
    pub toc_file_names: Vec<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Hosted providers; all but Anthropic speak the chat-completions shape
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HostedProvider {
    // @provider: OpenRouter
    OpenRouter,
    // @provider: GitHub Models (Azure inference endpoint)
    GitHubModels,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic Messages API
    Anthropic,
}

impl HostedProvider {
    /// Every provider in default priority order
    pub const ALL: [HostedProvider; 4] = [Self::OpenRouter, Self::GitHubModels, Self::OpenAI, Self::Anthropic];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenRouter => "OpenRouter",
            Self::GitHubModels => "GitHub Models",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenRouter => "openrouter".to_string(),
            Self::GitHubModels => "githubmodels".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    /// Environment variable holding the credential
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::GitHubModels => "GITHUB_TOKEN",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Environment variable overriding the model
    pub fn model_env(&self) -> &'static str {
        match self {
            Self::OpenRouter => "OPENROUTER_MODEL",
            Self::GitHubModels => "GITHUB_MODELS_MODEL",
            Self::OpenAI => "OPENAI_MODEL",
            Self::Anthropic => "ANTHROPIC_MODEL",
        }
    }

    pub fn default_model(&self) -> String {
        match self {
            Self::OpenRouter => "mistralai/mistral-7b-instruct:free".to_string(),
            Self::GitHubModels | Self::OpenAI => "gpt-4o-mini".to_string(),
            Self::Anthropic => "claude-sonnet-4-5".to_string(),
        }
    }

    pub fn default_endpoint(&self) -> String {
        match self {
            Self::OpenRouter => "https://openrouter.ai/api/v1".to_string(),
            Self::GitHubModels => "https://models.inference.ai.azure.com".to_string(),
            Self::OpenAI => "https://api.openai.com/v1".to_string(),
            Self::Anthropic => "https://api.anthropic.com/v1".to_string(),
        }
    }
}

impl std::fmt::Display for HostedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for HostedProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "openrouter" => Ok(Self::OpenRouter),
            "githubmodels" | "github" => Ok(Self::GitHubModels),
            "openai" => Ok(Self::OpenAI),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: HostedProvider,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key; usually supplied through the environment
    #[serde(default = "String::new", skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    // @field: Service URL without the request path (/chat/completions or /messages)
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Whether the provider takes part in the fallback chain
    #[serde(default = "default_true")]
    pub enabled: bool,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: HostedProvider) -> Self {
        Self {
            provider_type,
            model: provider_type.default_model(),
            api_key: String::new(),
            endpoint: provider_type.default_endpoint(),
            enabled: true,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Model, falling back to the provider default
    pub fn get_model(&self) -> String {
        if self.model.is_empty() {
            self.provider_type.default_model()
        } else {
            self.model.clone()
        }
    }

    /// Endpoint, falling back to the provider default
    pub fn get_endpoint(&self) -> String {
        if self.endpoint.is_empty() {
            self.provider_type.default_endpoint()
        } else {
            self.endpoint.clone()
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Hosted providers in fallback priority order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

impl TranslationConfig {
    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &HostedProvider) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.provider_type == *provider_type)
    }

    /// Enabled providers in priority order
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Whether any enabled provider has a credential
    pub fn has_credentials(&self) -> bool {
        self.enabled_providers().any(ProviderConfig::has_api_key)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            common: TranslationCommonConfig::default(),
        }
    }
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Sampling temperature, 0.0 to 2.0
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Delay in milliseconds after every line sent to a backend
    #[serde(default = "default_line_delay_ms")]
    pub line_delay_ms: u64,

    /// Reject whole-document translations whose code fence count changed
    #[serde(default = "default_true")]
    pub verify_structure: bool,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            line_delay_ms: default_line_delay_ms(),
            verify_structure: true,
        }
    }
}

/// Local command line translator (translate-shell by default)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CliToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Binary name or path
    #[serde(default = "default_cli_program")]
    pub program: String,

    /// Arguments; `{source}` and `{target}` are replaced by the language codes
    #[serde(default = "default_cli_args")]
    pub args: Vec<String>,
}

impl CliToolConfig {
    /// Arguments with the language placeholders filled in
    pub fn render_args(&self, source_language: &str, target_language: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{source}", source_language)
                    .replace("{target}", target_language)
            })
            .collect()
    }
}

impl Default for CliToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_cli_program(),
            args: default_cli_args(),
        }
    }
}

/// One source root to target root substitution
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub source: String,
    pub target: String,
}

impl PathMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Smallest and largest accepted concurrency
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 10;

fn default_source_language() -> String {
    "ko".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_pattern() -> String {
    "ko/**/*.md".to_string()
}

fn default_validate_pattern() -> String {
    "en/**/*.md".to_string()
}

fn default_concurrency_limit() -> usize {
    3
}

fn default_providers() -> Vec<ProviderConfig> {
    HostedProvider::ALL.iter().copied().map(ProviderConfig::new).collect()
}

fn default_path_mappings() -> Vec<PathMapping> {
    // docs-ko must be tried before ko
    vec![PathMapping::new("docs-ko", "docs"), PathMapping::new("ko", "en")]
}

fn default_brand_names() -> Vec<String> {
    vec!["SowonFlow".to_string()]
}

fn default_toc_file_names() -> Vec<String> {
    vec!["SUMMARY.md".to_string()]
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_top_p() -> f32 {
    1.0
}

fn default_line_delay_ms() -> u64 {
    300
}

fn default_cli_program() -> String {
    "trans".to_string()
}

fn default_cli_args() -> Vec<String> {
    vec!["-brief".to_string(), "{source}:{target}".to_string()]
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration file if it exists, defaults otherwise
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply credentials and model overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for provider in &mut self.translation.providers {
            if let Some(key) = non_empty(provider.provider_type.api_key_env()) {
                provider.api_key = key.trim().to_string();
            }
            if let Some(model) = non_empty(provider.provider_type.model_env()) {
                provider.model = model.trim().to_string();
            }
        }

        if let Some(program) = non_empty("DOCTRANS_CLI_TOOL") {
            self.cli_tool.program = program;
        }
    }

    /// Concurrency clamped to the accepted range
    pub fn effective_concurrency(&self) -> usize {
        clamp_concurrency(self.concurrency_limit)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::get_language_name(&self.source_language)?;
        crate::language_utils::get_language_name(&self.target_language)?;

        for provider in &self.translation.providers {
            let endpoint = provider.get_endpoint();
            Url::parse(&endpoint).with_context(|| {
                format!("Invalid endpoint for {}: {}", provider.provider_type.display_name(), endpoint)
            })?;
        }

        if self.path_mappings.is_empty() {
            return Err(anyhow!("At least one path mapping is required"));
        }
        for mapping in &self.path_mappings {
            if mapping.source.is_empty() || mapping.target.is_empty() || mapping.source == mapping.target {
                return Err(anyhow!(
                    "Invalid path mapping: '{}' -> '{}'",
                    mapping.source,
                    mapping.target
                ));
            }
        }

        if self.concurrency_limit != self.effective_concurrency() {
            warn!(
                "concurrency_limit {} is outside {}..={}, using {}",
                self.concurrency_limit,
                MIN_CONCURRENCY,
                MAX_CONCURRENCY,
                self.effective_concurrency()
            );
        }

        if self.cli_tool.enabled && self.cli_tool.program.trim().is_empty() {
            return Err(anyhow!("CLI tool is enabled but no program is configured"));
        }

        let temperature = self.translation.common.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0, got {}", temperature));
        }

        Ok(())
    }
}

/// Clamp a requested concurrency to [1, 10]
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            pattern: default_pattern(),
            validate_pattern: default_validate_pattern(),
            force_overwrite: false,
            concurrency_limit: default_concurrency_limit(),
            translation: TranslationConfig::default(),
            cli_tool: CliToolConfig::default(),
            path_mappings: default_path_mappings(),
            brand_names: default_brand_names(),
            toc_file_names: default_toc_file_names(),
            log_level: LogLevel::default(),
        }
    }
}
