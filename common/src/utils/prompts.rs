use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

/// The summary prompt file carries two YAML keys that are joined with a
/// blank line before the `{content}` substitution.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryPromptFile {
    pub message: String,
    pub prefix: String,
}

impl SummaryPromptFile {
    pub fn joined(&self) -> String {
        format!("{}\n\n{}", self.message, self.prefix)
    }
}

pub fn load_summary_prompt(path: &Path) -> Result<SummaryPromptFile, AppError> {
    let raw = read_prompt_file(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

pub fn load_prompt_text(path: &Path) -> Result<String, AppError> {
    read_prompt_file(path)
}

fn read_prompt_file(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|err| {
        AppError::NotFound(format!(
            "prompt file {} could not be read: {err}",
            path.display()
        ))
    })
}
