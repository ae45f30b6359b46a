/*!
 * # doctrans - Korean to English documentation translator
 *
 * A Rust library for translating markdown documentation trees with hosted AI
 * backends and local fallbacks.
 *
 * ## Features
 *
 * - Whole-document translation through chat-completion APIs:
 *   - OpenRouter
 *   - GitHub Models
 *   - OpenAI
 * - Anthropic Messages API as the last hosted backend
 * - Line-by-line fallback that never sends code, links, images or YAML keys
 * - Local `trans` (translate-shell) fallback and original text as last resort
 * - Post-processing of known AI output defects
 * - Bounded concurrent batch translation, watch mode and output validation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: the translation pipeline:
 *   - `translation::classifier`: per-line decisions
 *   - `translation::orchestrator`: backend fallback for one document
 *   - `translation::batch`: batch processing of documents
 *   - `translation::formatting`: post-processing
 * - `providers`: translation backends (hosted APIs, command line tool, mock)
 * - `validation`: checks over translated documents
 * - `watcher`: incremental translation on change
 * - `setup`: writes the `.env` file with credentials
 * - `file_utils`: file system operations, glob matching and path mapping
 * - `app_controller`: command implementations
 * - `language_utils`: Korean script detection and ISO language codes
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod setup;
pub mod translation;
pub mod validation;
pub mod watcher;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ProviderError, ToolError, TranslationError};
pub use language_utils::{contains_hangul, get_language_name};
pub use translation::{FallbackOrchestrator, TranslationService};
