/*!
 * Validation of translated documents.
 *
 * - `links`: relative links must resolve
 * - `yaml`: fenced YAML blocks must keep their line structure
 * - `service`: runs every check, including leftover Korean text, empty files
 *   and translations without a source
 */

pub mod links;
pub mod service;
pub mod yaml;

// Re-export main types
pub use service::{IssueKind, TranslationValidator, ValidationIssue, ValidationReport};
