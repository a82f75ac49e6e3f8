//! Writing configurations back to JSON config files.
//!
//! The output is a flat, pretty-printed JSON object that the config-file
//! resolver reads back unchanged. Creates parent directories as needed.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::WryfigError;

/// Pure function: render `config` as a pretty-printed JSON document.
pub fn render_json<T: Serialize + ?Sized>(config: &T) -> Result<String, WryfigError> {
    let mut out = serde_json::to_string_pretty(config).map_err(WryfigError::Serialize)?;
    out.push('\n');
    Ok(out)
}

/// I/O wrapper: render `config` and write it to `path`, replacing any
/// existing file. `config` must be a JSON object.
pub fn write_json_file(path: &Path, config: &Value) -> Result<(), WryfigError> {
    let content = render_object(config, path)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| WryfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, content).map_err(|e| WryfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "wrote config file");
    Ok(())
}

/// Render only when `value` is a JSON object; config files are flat objects.
pub fn render_object(value: &Value, path: &Path) -> Result<String, WryfigError> {
    match value {
        Value::Object(_) => render_json(value),
        _ => Err(WryfigError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}
