/*!
 * Markdown translation pipeline.
 *
 * - `document`: source documents, requests and outcomes
 * - `classifier`: per-line decisions on what may be translated
 * - `prompts`: messages sent to hosted backends
 * - `formatting`: post-processing of translated text
 * - `core`: the ordered backend chain
 * - `orchestrator`: whole-document and line-by-line fallback for one file
 * - `batch`: bounded concurrent translation of many files
 */

// Re-export main types for easier usage
pub use self::batch::{BatchDriver, BatchSummary};
pub use self::core::TranslationService;
pub use self::document::{SourceDocument, TranslationOutcome, TranslationRequest, TranslationTier};
pub use self::formatting::PostProcessor;
pub use self::orchestrator::FallbackOrchestrator;

// Submodules
pub mod batch;
pub mod classifier;
pub mod core;
pub mod document;
pub mod formatting;
pub mod orchestrator;
pub mod prompts;
