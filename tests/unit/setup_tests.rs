/*!
 * Tests for first-run setup
 */

use anyhow::Result;
use std::collections::HashMap;

use doctrans::errors::AppError;
use doctrans::setup::{is_known_model, run_setup, EnvFileStatus, SetupOptions, KNOWN_MODELS};

use crate::common;

fn read_env(path: &std::path::Path) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        values.insert(key, value);
    }
    Ok(values)
}

/// A key and model end up in a .env that dotenvy reads back
#[test]
fn test_run_setup_withApiKey_shouldWriteLoadableEnvFile() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let options = SetupOptions {
        api_key: Some("sk-or-test".to_string()),
        model: Some("google/gemma-2-9b-it:free".to_string()),
        force: false,
    };

    let report = run_setup(temp_dir.path(), &options, common::MISSING_TOOL)?;

    assert_eq!(report.env_path, temp_dir.path().join(".env"));
    assert_eq!(report.env_file, EnvFileStatus::Created);
    assert_eq!(report.model.as_deref(), Some("google/gemma-2-9b-it:free"));
    assert!(!report.tool_available);

    let values = read_env(&report.env_path)?;
    assert_eq!(values.get("OPENROUTER_API_KEY").map(String::as_str), Some("sk-or-test"));
    assert_eq!(values.get("OPENROUTER_MODEL").map(String::as_str), Some("google/gemma-2-9b-it:free"));
    Ok(())
}

/// Without a key only commented placeholders are written
#[test]
fn test_run_setup_withoutApiKey_shouldWritePlaceholders() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let report = run_setup(temp_dir.path(), &SetupOptions::default(), common::MISSING_TOOL)?;

    assert_eq!(report.model, None);
    assert!(read_env(&report.env_path)?.is_empty());
    let content = common::read_test_file(temp_dir.path(), ".env")?;
    assert!(content.contains("# OPENROUTER_API_KEY=your_api_key_here"));
    assert!(content.contains(&format!("# OPENROUTER_MODEL={}", KNOWN_MODELS[0].id)));
    Ok(())
}

/// An existing .env is only replaced with force
#[test]
fn test_run_setup_withExistingEnv_shouldRequireForce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), ".env", "OPENAI_API_KEY=keep-me\n")?;
    let mut options = SetupOptions {
        api_key: Some("sk-or-new".to_string()),
        ..SetupOptions::default()
    };

    let report = run_setup(temp_dir.path(), &options, common::MISSING_TOOL)?;
    assert_eq!(report.env_file, EnvFileStatus::KeptExisting);
    assert_eq!(common::read_test_file(temp_dir.path(), ".env")?, "OPENAI_API_KEY=keep-me\n");

    options.force = true;
    let report = run_setup(temp_dir.path(), &options, common::MISSING_TOOL)?;
    assert_eq!(report.env_file, EnvFileStatus::Overwritten);
    assert_eq!(
        read_env(&report.env_path)?.get("OPENROUTER_API_KEY").map(String::as_str),
        Some("sk-or-new")
    );
    Ok(())
}

/// A blank key is a configuration error and nothing is written
#[test]
fn test_run_setup_withBlankApiKey_shouldFailWithConfigError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let options = SetupOptions {
        api_key: Some("   ".to_string()),
        ..SetupOptions::default()
    };

    let err = run_setup(temp_dir.path(), &options, common::MISSING_TOOL).unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert!(!temp_dir.path().join(".env").exists());
    Ok(())
}

/// A root that is a regular file cannot hold a .env
#[test]
fn test_run_setup_withFileAsRoot_shouldFailWithFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let not_a_dir = common::create_test_file(temp_dir.path(), "site", "")?;

    let err = run_setup(&not_a_dir, &SetupOptions::default(), common::MISSING_TOOL).unwrap_err();

    assert!(matches!(err, AppError::File(_)));
    Ok(())
}

/// The fallback translator is found on PATH
#[cfg(unix)]
#[test]
fn test_run_setup_withInstalledTool_shouldReportAvailable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let report = run_setup(temp_dir.path(), &SetupOptions::default(), "sh")?;
    assert!(report.tool_available);
    Ok(())
}

/// Unknown models are accepted but not listed
#[test]
fn test_is_known_model_shouldMatchListedIds() {
    assert!(is_known_model("mistralai/mistral-7b-instruct:free"));
    assert!(!is_known_model("some/other-model"));
}
