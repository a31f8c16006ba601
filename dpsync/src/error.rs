use std::io;

use thiserror::Error;

use dpsync_core::client::DataPowerClientError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Startup error: {0}")]
    StartupError(String),
    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
    #[error("Path casting error: {0}")]
    PathCastingError(String),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::UnexpectedError(format!("{:?}", error))
    }
}

impl From<notify::Error> for Error {
    fn from(error: notify::Error) -> Self {
        Error::UnexpectedError(format!("Notify error {:?}", error))
    }
}

impl From<DataPowerClientError> for Error {
    fn from(error: DataPowerClientError) -> Self {
        Error::UnexpectedError(format!("DataPower client error {}", error))
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::UnexpectedError(format!("{:#}", error))
    }
}
