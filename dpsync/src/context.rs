use std::fmt;

use dpsync_core::client::DataPower;
use dpsync_core::config::ConnectionDetails;

use crate::error::Error;

#[derive(Clone)]
pub struct Context {
    pub connection: ConnectionDetails,
    pub folder_path: String,
    pub accept_invalid_certs: bool,
    pub debounce_ms: u64,
}

impl Context {
    pub fn new(
        connection: ConnectionDetails,
        folder_path: String,
        accept_invalid_certs: bool,
        debounce_ms: u64,
    ) -> Self {
        Self {
            connection,
            folder_path,
            accept_invalid_certs,
            debounce_ms,
        }
    }

    pub fn client(&self) -> Result<DataPower, Error> {
        Ok(DataPower::new(
            self.connection.clone(),
            self.accept_invalid_certs,
        )?)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("socket", &self.connection.socket)
            .field("folder_path", &self.folder_path)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("debounce_ms", &self.debounce_ms)
            .finish()
    }
}
