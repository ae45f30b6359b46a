/*!
 * Validation service that runs every check over translated documents.
 *
 * Finding issues is the normal outcome of a validation run, not an error;
 * only failing to enumerate or read the documents is.
 */

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::file_utils::{FileManager, GlobPattern, PathMapper};
use crate::language_utils::count_hangul_syllables;

use super::links::LinkValidator;
use super::yaml::YamlBlockValidator;

/// More remaining Hangul syllables than this is reported
pub const KOREAN_TEXT_THRESHOLD: usize = 5;

/// Kinds of problems a translated document can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IssueKind {
    MissingSource,
    EmptyFile,
    KoreanText,
    MalformedYaml,
    BrokenLink,
}

impl IssueKind {
    pub const ALL: [IssueKind; 5] = [
        Self::MissingSource,
        Self::EmptyFile,
        Self::KoreanText,
        Self::MalformedYaml,
        Self::BrokenLink,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingSource => "missing source",
            Self::EmptyFile => "empty file",
            Self::KoreanText => "untranslated Korean text",
            Self::MalformedYaml => "malformed YAML block",
            Self::BrokenLink => "broken relative link",
        }
    }
}

/// One problem found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationIssue {
    /// No source document maps to this file
    MissingSource { expected: Option<PathBuf> },
    EmptyFile,
    /// Hangul syllables left in the translation
    KoreanText { count: usize },
    /// 1-based YAML block index and line number
    MalformedYaml { block: usize, line: usize },
    BrokenLink { url: String },
}

impl ValidationIssue {
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::MissingSource { .. } => IssueKind::MissingSource,
            Self::EmptyFile => IssueKind::EmptyFile,
            Self::KoreanText { .. } => IssueKind::KoreanText,
            Self::MalformedYaml { .. } => IssueKind::MalformedYaml,
            Self::BrokenLink { .. } => IssueKind::BrokenLink,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource { expected: Some(path) } => {
                write!(f, "source file {} does not exist", path.display())
            }
            Self::MissingSource { expected: None } => write!(f, "file is not under a target root"),
            Self::EmptyFile => write!(f, "file is empty"),
            Self::KoreanText { count } => write!(f, "{} Korean characters remain", count),
            Self::MalformedYaml { block, line } => {
                write!(f, "YAML block {} looks malformed at line {}", block, line)
            }
            Self::BrokenLink { url } => write!(f, "link target {} does not exist", url),
        }
    }
}

/// Issues of one document
#[derive(Debug, Clone, Serialize)]
pub struct FileValidation {
    /// Path relative to the docs root
    pub path: PathBuf,
    pub issues: Vec<ValidationIssue>,
}

/// Result of a validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub files_checked: usize,
    /// Only documents with at least one issue
    pub files: Vec<FileValidation>,
    pub counts: BTreeMap<IssueKind, usize>,
}

impl ValidationReport {
    fn record(&mut self, file: FileValidation) {
        self.files_checked += 1;
        if file.issues.is_empty() {
            return;
        }
        for issue in &file.issues {
            *self.counts.entry(issue.kind()).or_insert(0) += 1;
        }
        self.files.push(file);
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_issues(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_issues() == 0
    }
}

/// Translation validator
#[derive(Debug, Clone)]
pub struct TranslationValidator {
    root: PathBuf,
    mapper: PathMapper,
}

impl TranslationValidator {
    pub fn new<P: AsRef<Path>>(root: P, mapper: PathMapper) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mapper,
        }
    }

    /// Check every translated document matching `pattern`
    pub fn validate(&self, pattern: &str) -> Result<ValidationReport> {
        let glob = GlobPattern::new(pattern)?;
        let files = FileManager::find_matching_files(&self.root, &glob)?;
        let mut report = ValidationReport::default();

        for relative in files {
            let content = FileManager::read_to_string(self.root.join(&relative))
                .with_context(|| format!("Cannot validate {}", relative.display()))?;
            let issues = self.validate_content(&relative, &content);
            debug!("{}: {} issues", relative.display(), issues.len());
            report.record(FileValidation {
                path: relative,
                issues,
            });
        }

        Ok(report)
    }

    /// Check one document given its path relative to the root
    pub fn validate_content(&self, relative: &Path, content: &str) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        match self.mapper.to_source(relative) {
            Ok(source) if FileManager::file_exists(self.root.join(&source)) => {}
            Ok(source) => issues.push(ValidationIssue::MissingSource { expected: Some(source) }),
            Err(_) => issues.push(ValidationIssue::MissingSource { expected: None }),
        }

        if content.trim().is_empty() {
            issues.push(ValidationIssue::EmptyFile);
            return issues;
        }

        let count = count_hangul_syllables(content);
        if count > KOREAN_TEXT_THRESHOLD {
            issues.push(ValidationIssue::KoreanText { count });
        }

        issues.extend(
            YamlBlockValidator::malformed_blocks(content)
                .into_iter()
                .map(|m| ValidationIssue::MalformedYaml { block: m.block, line: m.line }),
        );

        let document_dir = self
            .root
            .join(relative)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        issues.extend(
            LinkValidator::broken_links(content, &document_dir)
                .into_iter()
                .map(|url| ValidationIssue::BrokenLink { url }),
        );

        issues
    }
}
