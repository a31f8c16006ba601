use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_derive::{Deserialize, Serialize};

pub const CONNECTION_FILE_NAME: &str = "_dpsync-config.json";

/// Connection document persisted at the workspace root. Credentials are
/// stored in clear (the `authorization` field is only base64).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    pub socket: String,
    pub authorization: String,
}

impl ConnectionDetails {
    pub fn from_credentials(socket: &str, username: &str, password: &str) -> Self {
        Self {
            socket: socket.trim_end_matches('/').to_string(),
            authorization: BASE64.encode(format!("{}:{}", username, password)),
        }
    }

    pub fn load(workspace_folder_path: &Path) -> Result<Option<Self>> {
        let connection_file_path = workspace_folder_path.join(CONNECTION_FILE_NAME);
        if !connection_file_path.exists() {
            return Ok(None);
        }

        let raw_document = fs::read_to_string(&connection_file_path).context(format!(
            "Error when loading connection document at '{}'",
            connection_file_path.display()
        ))?;
        let details = serde_json::from_str(&raw_document).context(format!(
            "Error when parsing connection document at '{}'",
            connection_file_path.display()
        ))?;
        Ok(Some(details))
    }

    pub fn write(&self, workspace_folder_path: &Path) -> Result<()> {
        let connection_file_path = workspace_folder_path.join(CONNECTION_FILE_NAME);
        let raw_document = serde_json::to_string_pretty(self)?;
        fs::write(&connection_file_path, raw_document).context(format!(
            "Error when writing connection document at '{}'",
            connection_file_path.display()
        ))?;
        Ok(())
    }
}
