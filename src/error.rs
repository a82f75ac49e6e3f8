use std::path::PathBuf;

use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum WryfigError {
    #[error("Configuration file not found: {}", path.display())]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(wryfig::config_file::not_found), help("check the path passed to --config"))
    )]
    ConfigFileNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(wryfig::io)))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(wryfig::config_file::parse), help("config files must be valid JSON"))
    )]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Config file {} must contain a JSON object at the top level", path.display())]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(wryfig::config_file::not_an_object)))]
    NotAnObject { path: PathBuf },

    #[error("Unknown keys in {}: {}", path.display(), keys.join(", "))]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(wryfig::config_file::unknown_keys), help("disable strict mode to ignore unknown keys"))
    )]
    UnknownKeys { path: PathBuf, keys: Vec<String> },

    #[error("Extra fields not allowed: {}", .0.join(", "))]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(wryfig::extra_fields)))]
    ExtraFields(Vec<String>),

    #[error("Invalid options for field '{field}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(wryfig::schema)))]
    InvalidFieldOptions { field: String, reason: String },

    #[error("Invalid value '{value}' for {param}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(wryfig::invalid_value)))]
    InvalidValue {
        param: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(wryfig::validation)))]
    Validation(#[from] ValidationErrors),

    #[error("Failed to serialize configuration: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(wryfig::serialize)))]
    Serialize(serde_json::Error),
}

impl WryfigError {
    /// True for errors raised while locating, reading or parsing a config file.
    ///
    /// The CLI adapter reports these as parameter errors on `--config`.
    pub fn is_config_file_error(&self) -> bool {
        matches!(
            self,
            WryfigError::ConfigFileNotFound { .. }
                | WryfigError::IoError { .. }
                | WryfigError::ParseError { .. }
                | WryfigError::NotAnObject { .. }
                | WryfigError::UnknownKeys { .. }
        )
    }
}
