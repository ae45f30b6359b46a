/*!
 * First-run setup.
 *
 * Writes `<root>/.env` with the OpenRouter credential and model that the
 * other commands load through `dotenvy`, and reports whether the local
 * fallback translator is installed.
 */

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::HostedProvider;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::providers::cli_tool::CliTool;

/// An OpenRouter model offered during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownModel {
    pub id: &'static str,
    pub label: &'static str,
}

/// Models known to work for documentation translation, recommended first
pub const KNOWN_MODELS: [KnownModel; 5] = [
    KnownModel {
        id: "mistralai/mistral-7b-instruct:free",
        label: "Mistral 7B Instruct (free, recommended)",
    },
    KnownModel {
        id: "meta-llama/llama-3.1-8b-instruct:free",
        label: "Meta Llama 3.1 8B (free)",
    },
    KnownModel {
        id: "google/gemma-2-9b-it:free",
        label: "Google Gemma 2 9B (free)",
    },
    KnownModel {
        id: "openai/gpt-4-turbo",
        label: "OpenAI GPT-4 Turbo (paid)",
    },
    KnownModel {
        id: "anthropic/claude-3.5-sonnet",
        label: "Anthropic Claude 3.5 Sonnet (paid)",
    },
];

pub fn is_known_model(id: &str) -> bool {
    KNOWN_MODELS.iter().any(|model| model.id == id)
}

/// Answers to the setup questions
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// OpenRouter API key; without one the file holds commented placeholders
    pub api_key: Option<String>,
    /// Defaults to the first known model
    pub model: Option<String>,
    /// Replace an existing `.env`
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileStatus {
    Created,
    Overwritten,
    /// `.env` existed and `force` was not set
    KeptExisting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub env_path: PathBuf,
    pub env_file: EnvFileStatus,
    /// Model written to the file, if a key was given
    pub model: Option<String>,
    /// Whether the fallback translator was found
    pub tool_available: bool,
}

/// Contents of the `.env` file
pub fn render_env_file(api_key: Option<&str>, model: &str) -> String {
    let provider = HostedProvider::OpenRouter;
    let mut content = String::from("# doctrans translation environment\n\n");

    match api_key {
        Some(key) => {
            content.push_str(&format!("{}={}\n", provider.api_key_env(), key));
            content.push_str(&format!("{}={}\n", provider.model_env(), model));
        }
        None => {
            content.push_str(&format!("# {}=your_api_key_here\n", provider.api_key_env()));
            content.push_str(&format!("# {}={}\n", provider.model_env(), model));
        }
    }

    content.push_str("\n# CI runs read these from repository secrets instead\n");
    content
}

/// Write `<root>/.env` and check for the fallback translator
pub fn run_setup(root: &Path, options: &SetupOptions, tool_program: &str) -> Result<SetupReport, AppError> {
    let api_key = match options.api_key.as_deref().map(str::trim) {
        Some("") => return Err(AppError::Config("API key is required when --api-key is given".to_string())),
        other => other,
    };

    let model = options
        .model
        .clone()
        .unwrap_or_else(|| KNOWN_MODELS[0].id.to_string());
    if !is_known_model(&model) {
        warn!("{} is not one of the known models; make sure OpenRouter offers it", model);
    }
    if options.model.is_none() {
        info!("Known models (choose with --model):");
        for known in &KNOWN_MODELS {
            info!("  {:<40} {}", known.id, known.label);
        }
    }

    FileManager::ensure_dir(root).map_err(|e| AppError::File(format!("{:#}", e)))?;
    let env_path = root.join(".env");
    let existed = FileManager::file_exists(&env_path);

    let env_file = if existed && !options.force {
        warn!("{} already exists (use --force to overwrite)", env_path.display());
        EnvFileStatus::KeptExisting
    } else {
        FileManager::write_to_file(&env_path, &render_env_file(api_key, &model))
            .map_err(|e| AppError::File(format!("{:#}", e)))?;
        info!("Wrote {}", env_path.display());
        if existed {
            EnvFileStatus::Overwritten
        } else {
            EnvFileStatus::Created
        }
    };

    let tool_available = CliTool::new(tool_program, Vec::new()).is_available();
    if tool_available {
        info!("Fallback translator '{}' found", tool_program);
    } else {
        warn!("Fallback translator '{}' not found. To install translate-shell:", tool_program);
        warn!("  macOS:  brew install translate-shell");
        warn!("  Ubuntu: sudo apt-get install translate-shell");
        warn!("  Other:  https://github.com/soimort/translate-shell");
    }

    let written_model = api_key.map(|_| model);
    match (&written_model, env_file) {
        (_, EnvFileStatus::KeptExisting) => {}
        (Some(model), _) => info!("OpenRouter translation is ready, model {}", model),
        (None, _) => info!("Without an API key documents are translated line by line; get one at https://openrouter.ai"),
    }

    Ok(SetupReport {
        env_path,
        env_file,
        model: written_model,
        tool_available,
    })
}
