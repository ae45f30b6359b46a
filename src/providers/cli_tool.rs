/*!
 * Local command line translator.
 *
 * Runs a translator binary (translate-shell's `trans -brief ko:en` by default)
 * with the text on stdin and reads the translation from stdout. This is the
 * last backend in the chain, so `translate_or_original` never fails.
 */

use log::{debug, warn};
use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::app_config::CliToolConfig;
use crate::errors::ToolError;

/// Command line translator invocation
#[derive(Debug, Clone)]
pub struct CliTool {
    program: String,
    args: Vec<String>,
}

impl CliTool {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from config with language placeholders filled in
    pub fn from_config(config: &CliToolConfig, source_language: &str, target_language: &str) -> Self {
        Self::new(config.program.clone(), config.render_args(source_language, target_language))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the program can be found
    pub fn is_available(&self) -> bool {
        locate_program(&self.program).is_some()
    }

    /// Run the tool on `text`
    pub async fn translate(&self, text: &str) -> Result<String, ToolError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::ToolUnavailable(self.program.clone()),
                _ => ToolError::ToolExecutionError(format!("failed to start {}: {}", self.program, e)),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::ToolExecutionError("stdin not captured".to_string()))?;
        let input = text.to_string();
        let writer = tokio::spawn(async move {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ToolError::ToolExecutionError(format!("{}: {}", self.program, e)))?;

        match writer.await {
            Ok(Ok(())) => {}
            // A tool may exit without reading all of its input
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(ToolError::ToolExecutionError(format!("{}: {}", self.program, e))),
            Err(e) => return Err(ToolError::ToolExecutionError(format!("{}: {}", self.program, e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::ToolExecutionError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let translated = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        if translated.trim().is_empty() {
            return Err(ToolError::ToolExecutionError(format!("{} produced no output", self.program)));
        }

        Ok(translated)
    }

    /// Run the tool, returning `text` itself on any failure
    pub async fn translate_or_original(&self, text: &str) -> String {
        match self.translate(text).await {
            Ok(translated) => translated,
            Err(e @ ToolError::ToolUnavailable(_)) => {
                debug!("{}, keeping original text", e);
                text.to_string()
            }
            Err(e) => {
                warn!("{}, keeping original text", e);
                text.to_string()
            }
        }
    }
}

impl Default for CliTool {
    fn default() -> Self {
        Self::from_config(&CliToolConfig::default(), "ko", "en")
    }
}

fn locate_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|path| path.is_file())
    })
}
