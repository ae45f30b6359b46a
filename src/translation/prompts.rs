/*!
 * Prompt templates for markdown translation.
 *
 * One fixed system instruction plus a user message that depends on the request
 * mode: a bare line, a whole body document, or a table of contents where only
 * link labels may change.
 */

use crate::language_utils::display_language;
use crate::translation::document::{DocumentKind, RequestMode, TranslationRequest};

const SYSTEM_TEMPLATE: &str = "You are a professional technical translator. \
Translate {source_language} documentation into natural {target_language}.

Rules:
- Preserve all markdown formatting: headings, lists, emphasis, tables and line breaks.
- Preserve YAML structure: never translate keys, keep quotes and indentation.
- Never translate URLs, file paths, inline code or fenced code blocks.
- Keep these names exactly as written: {brand_names}.
- Answer with the translation only, without explanations or surrounding quotes.";

const DOCUMENT_TEMPLATE: &str = "Translate the following {source_language} markdown document into {target_language}. \
Return the complete document with the same structure.\n\n{text}";

const TABLE_OF_CONTENTS_TEMPLATE: &str = "The following markdown file is a table of contents. \
Translate only the {source_language} link text inside square brackets into {target_language}. \
Keep every link target, list marker and line exactly as it is and do not add any content.\n\n{text}";

/// Builds the messages sent to chat-completion backends
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    brand_names: Vec<String>,
}

impl PromptBuilder {
    pub fn new(brand_names: &[String]) -> Self {
        Self {
            brand_names: brand_names.to_vec(),
        }
    }

    /// System instruction for a request
    pub fn system_prompt(&self, request: &TranslationRequest) -> String {
        let brands = if self.brand_names.is_empty() {
            "product names".to_string()
        } else {
            self.brand_names.join(", ")
        };

        render(SYSTEM_TEMPLATE, request).replace("{brand_names}", &brands)
    }

    /// User message carrying the text
    pub fn user_message(&self, request: &TranslationRequest) -> String {
        match request.mode {
            RequestMode::Line => request.text.clone(),
            RequestMode::Document(DocumentKind::Body) => render(DOCUMENT_TEMPLATE, request),
            RequestMode::Document(DocumentKind::TableOfContents) => {
                render(TABLE_OF_CONTENTS_TEMPLATE, request)
            }
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(&["SowonFlow".to_string()])
    }
}

fn render(template: &str, request: &TranslationRequest) -> String {
    // {text} last so document content is never scanned for placeholders
    template
        .replace("{source_language}", &display_language(&request.source_language))
        .replace("{target_language}", &display_language(&request.target_language))
        .replace("{text}", &request.text)
}
