use std::fs;
use std::path::{Component, Path};

use dpsync_core::RESERVED_PREFIX;

use crate::error::Error;

pub fn path_to_string(path: &Path) -> Result<String, Error> {
    match path.to_str() {
        Some(value) => Ok(value.to_string()),
        None => Err(Error::PathCastingError(format!(
            "Fail to convert {:?} to String",
            path
        ))),
    }
}

pub fn canonicalize_to_string(path: &Path) -> Result<String, Error> {
    path_to_string(&fs::canonicalize(path)?)
}

pub fn file_name(path: &Path) -> Result<String, Error> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::PathCastingError(format!("Fail to extract file name from {:?}", path))
        })
}

/// Reserved-prefix artifacts (connection document, dated backups) and usual
/// editor temporary files must not trigger a sync.
pub fn ignore_path(relative_path: &Path) -> bool {
    for component in relative_path.components() {
        if let Component::Normal(part) = component {
            if let Some(part) = part.to_str() {
                if part.starts_with(RESERVED_PREFIX)
                    || part.starts_with('.')
                    || part.starts_with('~')
                    || part.ends_with('~')
                    || part.starts_with('#')
                {
                    return true;
                }
            }
        }
    }
    false
}
