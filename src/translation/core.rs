/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService`, which owns the ordered hosted
 * backends and the optional command line tool, and turns backend failures
 * into "try the next one".
 */

use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::providers::cli_tool::CliTool;
use crate::providers::{hosted_backend, TranslationBackend};
use crate::translation::document::TranslationRequest;

/// Settings shared by every translation
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub source_language: String,
    pub target_language: String,
    /// Pause after every line that reached a backend
    pub line_delay: Duration,
    /// Reject whole-document answers whose fence count differs from the source
    pub verify_structure: bool,
    pub brand_names: Vec<String>,
    pub toc_file_names: Vec<String>,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            line_delay: Duration::from_millis(config.translation.common.line_delay_ms),
            verify_structure: config.translation.common.verify_structure,
            brand_names: config.brand_names.clone(),
            toc_file_names: config.toc_file_names.clone(),
        }
    }

    /// Same settings without the rate-limit pause
    pub fn without_delay(mut self) -> Self {
        self.line_delay = Duration::ZERO;
        self
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Translation service holding the backend chain
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Hosted backends in priority order
    hosted: Vec<Arc<dyn TranslationBackend>>,

    /// Local tool tried per line after the hosted backends
    cli_tool: Option<CliTool>,

    /// Whether any hosted backend has a credential
    has_credentials: bool,

    pub settings: ServiceSettings,
}

impl TranslationService {
    /// Build the chain from configuration; disabled providers are skipped
    pub fn from_config(config: &Config) -> Result<Self> {
        let hosted: Vec<Arc<dyn TranslationBackend>> = config
            .translation
            .enabled_providers()
            .map(|provider| hosted_backend(provider, &config.translation.common, &config.brand_names))
            .collect();

        let cli_tool = config.cli_tool.enabled.then(|| {
            CliTool::from_config(&config.cli_tool, &config.source_language, &config.target_language)
        });

        debug!(
            "Backend chain: {}",
            hosted.iter().map(|b| b.name().to_string()).collect::<Vec<_>>().join(" -> ")
        );

        Ok(Self {
            hosted,
            cli_tool,
            has_credentials: config.translation.has_credentials(),
            settings: ServiceSettings::from_config(config),
        })
    }

    /// Build a service from ready-made backends
    pub fn with_backends(
        hosted: Vec<Arc<dyn TranslationBackend>>,
        cli_tool: Option<CliTool>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            has_credentials: !hosted.is_empty(),
            hosted,
            cli_tool,
            settings,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.has_credentials
    }

    pub fn cli_tool(&self) -> Option<&CliTool> {
        self.cli_tool.as_ref()
    }

    /// Whether anything at all can translate
    pub fn has_usable_backend(&self) -> bool {
        self.has_credentials || self.cli_tool.as_ref().is_some_and(CliTool::is_available)
    }

    pub fn backend_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hosted.iter().map(|b| b.name().to_string()).collect();
        if let Some(tool) = &self.cli_tool {
            names.push(tool.program().to_string());
        }
        names
    }

    /// Try every hosted backend in order
    ///
    /// An empty answer counts as a failure. Returns the translation and the
    /// name of the backend that produced it, or the last error.
    pub async fn translate_with_hosted(
        &self,
        request: &TranslationRequest,
    ) -> Result<(String, String), ProviderError> {
        let mut last_error = ProviderError::AuthMissing("no hosted backend configured".to_string());

        for backend in &self.hosted {
            match backend.translate(request).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Ok((text, backend.name().to_string()));
                }
                Ok(_) => {
                    warn!("{} returned an empty translation", backend.name());
                    last_error = ProviderError::MalformedResponse(format!(
                        "{} returned empty content",
                        backend.name()
                    ));
                }
                Err(e) if e.is_auth_missing() => {
                    debug!("Skipping {}: {}", backend.name(), e);
                    last_error = e;
                }
                Err(e) => {
                    warn!("{} failed: {}", backend.name(), e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
