use crate::config::compile::{compile, CompileError};
use crate::config::schema::{RuleFile, ValidationError};
use crate::rules::CompiledRule;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    Compile {
        path: Option<PathBuf>,
        source: CompileError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Json { path: None, source } => ConfigError::Json {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            ConfigError::Compile { path: None, source } => ConfigError::Compile {
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
                    "failed to read rule file from {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Json { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse rule file JSON ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse rule file JSON: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid rule file ({}): {}", path.display(), source),
                None => write!(f, "invalid rule file: {}", source),
            },
            ConfigError::Compile { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to compile rule file ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to compile rule file: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::Compile { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<Vec<CompiledRule>, ConfigError> {
    let file: RuleFile = serde_json::from_str(input)
        .map_err(|source| ConfigError::Json { path: None, source })?;
    file.validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    compile(&file).map_err(|source| ConfigError::Compile { path: None, source })
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Vec<CompiledRule>, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_valid_rules() {
        let rules = load_from_str(
            r#"{"validation_rules": [
                {"rule_id": 1, "type": "check_syntax", "message": "must parse"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let error = load_from_str("{not json").unwrap_err();
        assert!(matches!(error, ConfigError::Json { path: None, .. }));
    }

    #[test]
    fn compile_failure_surfaces_as_compile_error() {
        let error = load_from_str(
            r#"{"validation_rules": [
                {"rule_id": 1, "type": "check_everything", "message": "m"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::Compile { path: None, .. }));
    }

    #[test]
    fn path_is_attached_when_loading_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{broken").unwrap();
        let error = load_from_path(file.path()).unwrap_err();
        match error {
            ConfigError::Json { path: Some(path), .. } => assert_eq!(path, file.path()),
            other => panic!("expected json error with path, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = load_from_path("/nonexistent/rules.json").unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }
}
