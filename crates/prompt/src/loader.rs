//! Loader for custom prompt templates stored as YAML.

use crate::builder::validate_template;
use crate::catalog::PromptCatalog;
use crate::types::PromptTemplate;
use faqbot_core::{AppError, AppResult};
use std::path::Path;

/// Load one prompt template file.
///
/// The file holds `name`, `system` and optionally `human`:
///
/// ```yaml
/// name: admissions
/// system: |
///   Answer admissions questions using: {{context}}
/// human: "{{question}}"
/// ```
pub fn load_prompt_file(path: &Path) -> AppResult<PromptTemplate> {
    tracing::debug!("Loading prompt from: {:?}", path);

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let template: PromptTemplate = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e)))?;

    validate_prompt(&template)?;

    Ok(template)
}

/// Register every `*.yml` / `*.yaml` template in `dir` into the catalog.
///
/// A missing directory registers nothing. Returns the number of templates
/// registered.
pub fn load_custom_prompts(catalog: &mut PromptCatalog, dir: &Path) -> AppResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|s| s.to_str()),
                    Some("yml") | Some("yaml")
                )
        })
        .collect();
    paths.sort();

    for path in &paths {
        let template = load_prompt_file(path)?;
        tracing::info!("Loaded prompt: {} from {:?}", template.name, path);
        catalog.insert(template);
    }

    Ok(paths.len())
}

fn validate_prompt(template: &PromptTemplate) -> AppResult<()> {
    if template.name.trim().is_empty() {
        return Err(AppError::Prompt("Prompt name cannot be empty".to_string()));
    }

    if template.system.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' has an empty system template",
            template.name
        )));
    }

    validate_template(&template.system)?;
    validate_template(&template.human)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "admissions.yml",
            "name: admissions\nsystem: \"Admissions desk. {{context}}\"\n",
        );

        let template = load_prompt_file(&temp_dir.path().join("admissions.yml")).unwrap();
        assert_eq!(template.name, "admissions");
        assert_eq!(template.human, "{{question}}");
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "bad.yml", "invalid: yaml: content:");
        assert!(load_prompt_file(&temp_dir.path().join("bad.yml")).is_err());
    }

    #[test]
    fn test_empty_system_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "empty.yml", "name: empty\nsystem: \"  \"\n");
        let err = load_prompt_file(&temp_dir.path().join("empty.yml")).unwrap_err();
        assert!(err.to_string().contains("empty system template"));
    }

    #[test]
    fn test_load_custom_prompts_registers_all() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "housing.yml",
            "name: housing\nsystem: \"Housing. {{context}}\"\n",
        );
        write_prompt(
            temp_dir.path(),
            "finance.yaml",
            "name: finance\nsystem: \"Finance. {{context}}\"\nhuman: \"Q: {{question}}\"\n",
        );
        write_prompt(temp_dir.path(), "notes.txt", "ignored");

        let mut catalog = PromptCatalog::new();
        let count = load_custom_prompts(&mut catalog, temp_dir.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            catalog.list(),
            vec!["concise", "finance", "housing", "strict"]
        );
        assert_eq!(catalog.get("finance").human, "Q: {{question}}");
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = PromptCatalog::new();
        let count = load_custom_prompts(&mut catalog, &temp_dir.path().join("prompts")).unwrap();
        assert_eq!(count, 0);
    }
}
