//! Config file loading.
//!
//! A config file is one flat JSON object. Keys come back exactly as the file
//! wrote them; matching them against field names and aliases is the merger's
//! job, because a file may mix both conventions.
//!
//! Reading and parsing are split so the resolve pipeline can be fed
//! pre-loaded content in tests.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::WryfigError;

/// Read the file at `path`.
///
/// A missing file is [`WryfigError::ConfigFileNotFound`]; every other I/O
/// failure is [`WryfigError::IoError`].
pub fn read_config_file(path: &Path) -> Result<String, WryfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => WryfigError::ConfigFileNotFound {
            path: path.to_path_buf(),
        },
        _ => WryfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Parse file content into a flat key/value map.
pub fn parse_config_file(path: &Path, content: &str) -> Result<Map<String, Value>, WryfigError> {
    let value: Value = serde_json::from_str(content).map_err(|e| WryfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(WryfigError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Read and parse a config file.
pub fn resolve_config_file(path: &Path) -> Result<Map<String, Value>, WryfigError> {
    let content = read_config_file(path)?;
    let map = parse_config_file(path, &content)?;
    tracing::debug!(path = %path.display(), keys = map.len(), "loaded config file");
    Ok(map)
}

/// A loaded config file: where it came from and what it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub values: Map<String, Value>,
}

impl ConfigFile {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, WryfigError> {
        let path = path.into();
        let values = resolve_config_file(&path)?;
        Ok(Self { path, values })
    }

    /// Build from already-parsed values. The path is only used in messages.
    pub fn from_values(path: impl Into<PathBuf>, values: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            values,
        }
    }
}
