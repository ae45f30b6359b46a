/*!
 * Fallback orchestration for one document.
 *
 * Order of attempts:
 * 1. whole document through the hosted backends,
 * 2. line by line: hosted backends, then the command line tool, then the
 *    original line.
 *
 * Backend errors stop here; callers only see I/O failures.
 */

use log::{debug, info, warn};
use std::path::Path;

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::file_utils::FileManager;
use crate::translation::classifier::{classify, count_fence_lines, ClassifierState, LineClass};
use crate::translation::core::TranslationService;
use crate::translation::document::{
    SourceDocument, TranslationOutcome, TranslationRequest, TranslationTier,
};
use crate::translation::formatting::PostProcessor;

/// Translates documents through the backend chain
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    service: TranslationService,
    post_processor: PostProcessor,
    /// Checked once; a missing tool is not spawned per line
    cli_tool_available: bool,
}

/// Result of one translatable line
enum UnitResult {
    Translated(String),
    Kept,
}

impl FallbackOrchestrator {
    pub fn new(service: TranslationService) -> Self {
        let cli_tool_available = service.cli_tool().is_some_and(|tool| tool.is_available());
        Self {
            post_processor: PostProcessor::new(&service.settings.brand_names),
            service,
            cli_tool_available,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(TranslationService::from_config(config)?))
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Read `source`, translate it and write the result to `target`
    pub async fn translate_file<S: AsRef<Path>, T: AsRef<Path>>(
        &self,
        source: S,
        target: T,
    ) -> Result<TranslationOutcome, TranslationError> {
        let document = SourceDocument::read(source.as_ref(), &self.service.settings.toc_file_names)?;
        let outcome = self.translate_document(&document).await?;

        FileManager::write_to_file(target.as_ref(), &outcome.text)
            .map_err(|e| TranslationError::Io(format!("{:#}", e)))?;

        Ok(outcome)
    }

    /// Translate a document, falling back tier by tier
    pub async fn translate_document(
        &self,
        document: &SourceDocument,
    ) -> Result<TranslationOutcome, TranslationError> {
        if !document.has_translatable_text() {
            debug!("{}: no Korean text, copying", document.path.display());
            let text = self.post_processor.apply(&document.content, &document.content);
            return Ok(TranslationOutcome::unchanged(text));
        }

        match self.translate_whole(document).await {
            Ok((text, backend)) => {
                info!("{}: translated as a whole by {}", document.path.display(), backend);
                return Ok(TranslationOutcome {
                    text,
                    tier: TranslationTier::Document { backend },
                    lines_translated: 0,
                    lines_kept: 0,
                });
            }
            Err(TranslationError::Provider(e)) if e.is_auth_missing() => {
                debug!("{}: whole-document translation skipped: {}", document.path.display(), e);
            }
            Err(e) => {
                warn!("{}: whole-document translation rejected: {}", document.path.display(), e);
            }
        }

        Ok(self.translate_lines(document).await)
    }

    async fn translate_whole(&self, document: &SourceDocument) -> Result<(String, String), TranslationError> {
        let settings = &self.service.settings;
        let request = TranslationRequest::document(document, &settings.source_language, &settings.target_language);

        let (answer, backend) = self.service.translate_with_hosted(&request).await?;
        let mut text = strip_wrapping_fence(&document.content, &answer);

        if text.trim().is_empty() {
            return Err(TranslationError::EmptyTranslationResult(backend));
        }

        if settings.verify_structure {
            let expected = count_fence_lines(&document.content);
            let found = count_fence_lines(&text);
            if expected != found {
                return Err(TranslationError::StructureMismatch { expected, found });
            }
        }

        if document.content.ends_with('\n') && !text.ends_with('\n') {
            text.push('\n');
        }

        Ok((self.post_processor.apply(&document.content, &text), backend))
    }

    async fn translate_lines(&self, document: &SourceDocument) -> TranslationOutcome {
        let mut state = ClassifierState::default();
        let mut output = Vec::new();
        let mut translated = 0;
        let mut kept = 0;

        for line in document.content.split('\n') {
            let (class, next) = classify(line, state);
            state = next;

            let unit = match &class {
                LineClass::Prose { text, .. } | LineClass::YamlMultilineScalar { text, .. } => Some(text.as_str()),
                LineClass::YamlKeyValue(value) if value.is_translatable() => Some(value.value.as_str()),
                _ => None,
            };

            let Some(unit) = unit else {
                output.push(line.to_string());
                continue;
            };

            let rendered = match self.translate_unit(unit).await {
                UnitResult::Translated(result) => {
                    translated += 1;
                    match &class {
                        LineClass::Prose { indent, trailing, .. } => format!("{}{}{}", indent, result, trailing),
                        LineClass::YamlMultilineScalar { prefix, trailing, .. } => {
                            format!("{}{}{}", prefix, result, trailing)
                        }
                        LineClass::YamlKeyValue(value) => value.render(&result),
                        _ => line.to_string(),
                    }
                }
                UnitResult::Kept => {
                    kept += 1;
                    line.to_string()
                }
            };
            output.push(rendered);
        }

        info!(
            "{}: translated line by line ({} translated, {} kept)",
            document.path.display(),
            translated,
            kept
        );

        TranslationOutcome {
            text: output.join("\n"),
            tier: TranslationTier::Lines,
            lines_translated: translated,
            lines_kept: kept,
        }
    }

    async fn translate_unit(&self, text: &str) -> UnitResult {
        let settings = &self.service.settings;
        let request = TranslationRequest::line(text, &settings.source_language, &settings.target_language);

        let mut reached_backend = false;
        let result = match self.service.translate_with_hosted(&request).await {
            Ok((translated, _)) => {
                reached_backend = true;
                Some(translated)
            }
            Err(e) => {
                reached_backend |= !e.is_auth_missing();
                match self.service.cli_tool() {
                    Some(tool) if self.cli_tool_available => {
                        reached_backend = true;
                        let translated = tool.translate_or_original(text).await;
                        (translated != text).then_some(translated)
                    }
                    _ => None,
                }
            }
        };

        if reached_backend && !settings.line_delay.is_zero() {
            tokio::time::sleep(settings.line_delay).await;
        }

        match result {
            Some(translated) => {
                let fixed = self.post_processor.apply(text, translated.trim());
                UnitResult::Translated(fixed)
            }
            None => UnitResult::Kept,
        }
    }
}

/// Remove a ```` ```markdown ```` fence wrapped around the whole answer
fn strip_wrapping_fence(source: &str, answer: &str) -> String {
    let trimmed = answer.trim();
    if source.trim_start().starts_with("```") {
        return answer.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    let opens = lines.first().is_some_and(|first| {
        let annotation = first.trim().trim_start_matches('`').trim().to_lowercase();
        first.trim_start().starts_with("```") && matches!(annotation.as_str(), "" | "markdown" | "md")
    });
    let closes = lines.len() >= 2 && lines.last().is_some_and(|last| last.trim() == "```");

    if opens && closes {
        lines.remove(0);
        lines.pop();
        return lines.join("\n");
    }

    answer.to_string()
}
