use crate::config::schema::{ModConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read mod file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse mod file TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse mod file TOML: {}", source),
            },
            ConfigError::Validation { path, source } => {
                let summary = issue_summary(source);
                match path {
                    Some(path) => write!(
                        f,
                        "invalid mod file ({}), {}: {}",
                        path.display(),
                        summary,
                        source
                    ),
                    None => write!(f, "invalid mod file, {}: {}", summary, source),
                }
            }
        }
    }
}

/// `3 issues in 'a', 'b'`, naming the mods at fault when there are any.
fn issue_summary(error: &ValidationError) -> String {
    let count = error.issues.len();
    let noun = if count == 1 { "issue" } else { "issues" };
    let mods = error.failing_mods();
    if mods.is_empty() {
        return format!("{count} {noun}");
    }
    let names: Vec<String> = mods.iter().map(|id| format!("'{id}'")).collect();
    format!("{count} {noun} in {}", names.join(", "))
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse and validate a mod file.
pub fn load_from_str(input: &str) -> Result<ModConfig, ConfigError> {
    let config: ModConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ModConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = load_from_str(&contents).map_err(|error| error.with_path(path))?;
    tracing::debug!(path = %path.display(), mods = config.mods.len(), "loaded mod file");
    Ok(config)
}
