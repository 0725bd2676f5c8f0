use crate::cli::Args;
use anyhow::{Context, Result};
use sandbox::CaseSensitivity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the configuration file.
pub fn get_config_path() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home
        .join(".config")
        .join("sandboxed-fs")
        .join("config.json"))
}

/// Contents of `config.json`.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub allowed_directories: Vec<PathBuf>,
    #[serde(default)]
    pub case_sensitivity: Option<CaseSensitivity>,
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Start-up settings after merging the command line with the config file.
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub allowed_directories: Vec<PathBuf>,
    pub case_sensitivity: CaseSensitivity,
}

impl Settings {
    pub fn resolve(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => Some(load_config_file(path)?),
            None => {
                let default_path = get_config_path()?;
                if default_path.is_file() {
                    Some(load_config_file(&default_path)?)
                } else {
                    None
                }
            }
        };

        Self::merge(args.directories.clone(), args.case_sensitivity(), file)
    }

    /// Command-line directories come first, then the ones from the file.
    /// A case policy given on the command line wins over the file's.
    fn merge(
        cli_directories: Vec<PathBuf>,
        cli_case: Option<CaseSensitivity>,
        file: Option<ConfigFile>,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();

        let mut allowed_directories = cli_directories;
        allowed_directories.extend(file.allowed_directories);
        if allowed_directories.is_empty() {
            anyhow::bail!(
                "No allowed directories given. Pass them as arguments or list them in {}",
                get_config_path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            );
        }

        Ok(Self {
            allowed_directories,
            case_sensitivity: cli_case
                .or(file.case_sensitivity)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_directories_come_first() -> Result<()> {
        let file = ConfigFile {
            allowed_directories: vec![PathBuf::from("/from/file")],
            case_sensitivity: Some(CaseSensitivity::Insensitive),
        };
        let settings = Settings::merge(vec![PathBuf::from("/from/cli")], None, Some(file))?;

        assert_eq!(
            settings.allowed_directories,
            vec![PathBuf::from("/from/cli"), PathBuf::from("/from/file")]
        );
        assert_eq!(settings.case_sensitivity, CaseSensitivity::Insensitive);
        Ok(())
    }

    #[test]
    fn test_cli_case_policy_wins() -> Result<()> {
        let file = ConfigFile {
            allowed_directories: vec![],
            case_sensitivity: Some(CaseSensitivity::Insensitive),
        };
        let settings = Settings::merge(
            vec![PathBuf::from("/srv")],
            Some(CaseSensitivity::Sensitive),
            Some(file),
        )?;
        assert_eq!(settings.case_sensitivity, CaseSensitivity::Sensitive);
        Ok(())
    }

    #[test]
    fn test_platform_default_case_policy() -> Result<()> {
        let settings = Settings::merge(vec![PathBuf::from("/srv")], None, None)?;
        assert_eq!(settings.case_sensitivity, CaseSensitivity::platform_default());
        Ok(())
    }

    #[test]
    fn test_refuses_empty_directory_list() {
        let result = Settings::merge(vec![], None, Some(ConfigFile::default()));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("No allowed directories"));
    }

    #[test]
    fn test_load_config_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "allowed_directories": ["/data", "~/projects"], "case_sensitivity": "sensitive" }"#,
        )?;

        let config = load_config_file(&path)?;
        assert_eq!(
            config.allowed_directories,
            vec![PathBuf::from("/data"), PathBuf::from("~/projects")]
        );
        assert_eq!(config.case_sensitivity, Some(CaseSensitivity::Sensitive));
        Ok(())
    }

    #[test]
    fn test_load_config_file_reports_bad_json() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{ not json")?;

        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));
        Ok(())
    }
}
