/*!
 * Tests for error types
 */

use std::path::PathBuf;

use doctrans::errors::{AppError, ProviderError, ToolError, TranslationError};

/// Provider errors render their details
#[test]
fn test_provider_error_display_shouldIncludeDetails() {
    let err = ProviderError::UpstreamError {
        status_code: 429,
        body: "rate limited".to_string(),
    };
    assert_eq!(err.to_string(), "API responded with error: 429 - rate limited");

    let err = ProviderError::AuthMissing("OpenAI".to_string());
    assert!(err.to_string().contains("OpenAI"));
    assert!(err.is_auth_missing());
    assert!(!ProviderError::MalformedResponse("x".to_string()).is_auth_missing());
}

/// Provider errors convert into translation errors
#[test]
fn test_translation_error_from_shouldWrapProviderErrors() {
    let err: TranslationError = ProviderError::RequestFailed("timeout".to_string()).into();
    assert!(matches!(err, TranslationError::Provider(ProviderError::RequestFailed(_))));
}

/// Tool errors name the program or the failure
#[test]
fn test_tool_error_display_shouldDescribeFailure() {
    let err = ToolError::ToolUnavailable("trans".to_string());
    assert_eq!(err.to_string(), "Translation tool not available: trans");
}

/// File-level errors name the file and the mismatch
#[test]
fn test_translation_error_display_shouldDescribeFailure() {
    let err = TranslationError::FileNotFound(PathBuf::from("ko/missing.md"));
    assert_eq!(err.to_string(), "File not found: ko/missing.md");

    let err = TranslationError::StructureMismatch { expected: 4, found: 2 };
    assert!(err.to_string().contains("2 code fence lines"));
    assert!(err.to_string().contains("source has 4"));
}

/// I/O errors become string-carrying variants
#[test]
fn test_io_error_conversion_shouldKeepMessage() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: TranslationError = io.into();
    assert!(matches!(err, TranslationError::Io(ref message) if message == "denied"));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: AppError = io.into();
    assert_eq!(err.to_string(), "File error: gone");
}

/// Application errors wrap translation errors
#[test]
fn test_app_error_from_shouldWrapTranslationErrors() {
    let err: AppError = TranslationError::EmptyTranslationResult("OpenAI".to_string()).into();
    assert_eq!(err.to_string(), "Translation error: Empty translation result from OpenAI");
}
