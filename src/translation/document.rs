/*!
 * Document and request model.
 *
 * A `SourceDocument` is read once and never mutated. Every backend call gets a
 * fresh `TranslationRequest`; the outcome records which tier produced the text.
 */

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::TranslationError;
use crate::language_utils::contains_hangul;

/// What kind of markdown file a document is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Regular documentation page
    Body,
    /// Navigation file; only link labels may be translated
    TableOfContents,
}

/// A markdown file as read from disk
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub content: String,
    pub kind: DocumentKind,
}

impl SourceDocument {
    /// Read a document, deciding its kind from the file name
    pub fn read<P: AsRef<Path>>(path: P, toc_file_names: &[String]) -> Result<Self, TranslationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TranslationError::FileNotFound(path.to_path_buf()),
            _ => TranslationError::Io(format!("{}: {}", path.display(), e)),
        })?;

        Ok(Self::from_content(path, content, toc_file_names))
    }

    /// Build a document from text already in memory
    pub fn from_content<P: AsRef<Path>>(path: P, content: impl Into<String>, toc_file_names: &[String]) -> Self {
        let path = path.as_ref().to_path_buf();
        let kind = if is_toc_file(&path, toc_file_names) {
            DocumentKind::TableOfContents
        } else {
            DocumentKind::Body
        };

        Self {
            path,
            content: content.into(),
            kind,
        }
    }

    pub fn is_table_of_contents(&self) -> bool {
        self.kind == DocumentKind::TableOfContents
    }

    /// Whether any Korean text is left to translate
    pub fn has_translatable_text(&self) -> bool {
        contains_hangul(&self.content)
    }
}

fn is_toc_file(path: &Path, toc_file_names: &[String]) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| toc_file_names.iter().any(|toc| toc.eq_ignore_ascii_case(&name)))
}

/// Granularity of a backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A single line or YAML value
    Line,
    /// A whole file
    Document(DocumentKind),
}

/// One call to a translation backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub mode: RequestMode,
}

impl TranslationRequest {
    pub fn line(text: impl Into<String>, source_language: &str, target_language: &str) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            mode: RequestMode::Line,
        }
    }

    pub fn document(document: &SourceDocument, source_language: &str, target_language: &str) -> Self {
        Self {
            text: document.content.clone(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            mode: RequestMode::Document(document.kind),
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self.mode, RequestMode::Document(_))
    }
}

/// Which fallback tier produced the final text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationTier {
    /// Whole-file translation by a hosted backend
    Document { backend: String },
    /// Line-by-line translation (hosted, CLI tool or original per line)
    Lines,
    /// Nothing to translate
    Unchanged,
}

/// Result of translating one document
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub text: String,
    pub tier: TranslationTier,
    /// Units a backend translated in line mode
    pub lines_translated: usize,
    /// Units left in the source language after every backend failed
    pub lines_kept: usize,
}

impl TranslationOutcome {
    pub fn unchanged(text: String) -> Self {
        Self {
            text,
            tier: TranslationTier::Unchanged,
            lines_translated: 0,
            lines_kept: 0,
        }
    }
}
