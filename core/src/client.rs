use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mockall::automock;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_derive::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ConnectionDetails;
use crate::types::{DomainName, RemoteFolderPath};

pub const DEFAULT_CLIENT_TIMEOUT: u64 = 30;

#[derive(Debug, Clone, Error)]
pub enum DataPowerClientError {
    #[error("Connection error")]
    Connection,
    #[error("Timeout error")]
    Timeout,
    #[error("Authentication error")]
    Authentication,
    #[error("Invalid response: `{0}`")]
    InvalidResponse(String),
    #[error("Unexpected response status {0}: `{1}`")]
    UnexpectedResponse(u16, String),
    #[error("Unknown error: `{0}`")]
    Unknown(String),
}

impl From<reqwest::Error> for DataPowerClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            return Self::Connection;
        }

        if error.is_timeout() {
            return Self::Timeout;
        }

        Self::Unknown(error.to_string())
    }
}

/// Existence probe result. The third state of the probe is the transport
/// `Err` itself : only `NotFound` may route to a file creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileProbe {
    Found { content: Vec<u8> },
    NotFound,
}

/// The management API answers with a single object where one entry exists
/// and with an array where several do. Normalized into a `Vec` right after
/// deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct DomainsResponse {
    domain: OneOrMany<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    filestore: Locations,
}

#[derive(Debug, Deserialize)]
struct Locations {
    location: OneOrMany<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct DirectoryListingResponse {
    filestore: DirectoryListing,
}

#[derive(Debug, Deserialize)]
struct DirectoryListing {
    location: Option<DirectoryContainer>,
}

#[derive(Debug, Deserialize)]
struct DirectoryContainer {
    directory: Option<OneOrMany<NamedEntry>>,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    file: String,
}

fn decode_file_content(raw: &str) -> Result<Vec<u8>, DataPowerClientError> {
    BASE64.decode(raw.trim().as_bytes()).map_err(|error| {
        DataPowerClientError::InvalidResponse(format!(
            "Response file content is not valid base64 : {}",
            error
        ))
    })
}

fn file_body(file_name: &str, content: &[u8]) -> Value {
    json!({
        "file": {
            "name": file_name,
            "content": BASE64.encode(content),
        }
    })
}

#[automock]
pub trait DataPowerClient {
    fn check_connection(&self) -> Result<(), DataPowerClientError>;
    fn domains(&self) -> Result<Vec<DomainName>, DataPowerClientError>;
    fn locations(&self, domain: &DomainName) -> Result<Vec<String>, DataPowerClientError>;
    fn list_directory(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
    ) -> Result<Vec<String>, DataPowerClientError>;
    fn probe_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
    ) -> Result<FileProbe, DataPowerClientError>;
    fn create_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
        content: &[u8],
    ) -> Result<(), DataPowerClientError>;
    fn update_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
        content: &[u8],
    ) -> Result<(), DataPowerClientError>;
    fn delete_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
    ) -> Result<(), DataPowerClientError>;
}

pub struct DataPower {
    details: ConnectionDetails,
    client: reqwest::blocking::Client,
}

impl DataPower {
    pub fn new(
        details: ConnectionDetails,
        accept_invalid_certs: bool,
    ) -> Result<Self, DataPowerClientError> {
        // Appliances commonly expose the management interface with a
        // self-signed certificate
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(Duration::from_secs(DEFAULT_CLIENT_TIMEOUT))
            .build()?;
        Ok(Self { details, client })
    }

    fn mgmt_url(&self, suffix: &str) -> String {
        format!("{}/mgmt/{}", self.details.socket, suffix)
    }

    fn request(&self, method: Method, url: String) -> reqwest::blocking::RequestBuilder {
        self.client.request(method, url).header(
            AUTHORIZATION,
            format!("Basic {}", self.details.authorization),
        )
    }
}

impl DataPowerClient for DataPower {
    fn check_connection(&self) -> Result<(), DataPowerClientError> {
        let url = self.mgmt_url("config/default/Domain");
        log::debug!("Check connection with url {}", &url);
        let response = self.request(Method::GET, url).send()?;

        match response.status().as_u16() {
            200 => Ok(()),
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }

    fn domains(&self) -> Result<Vec<DomainName>, DataPowerClientError> {
        let url = self.mgmt_url("domains/config/");
        log::debug!("Fetch domains with url {}", &url);
        let response = self.request(Method::GET, url).send()?;

        match response.status().as_u16() {
            200 => {
                let domains = response.json::<DomainsResponse>()?;
                Ok(domains
                    .domain
                    .into_vec()
                    .into_iter()
                    .map(|entry| DomainName(entry.name))
                    .collect())
            }
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }

    fn locations(&self, domain: &DomainName) -> Result<Vec<String>, DataPowerClientError> {
        let url = self.mgmt_url(&format!("filestore/{}", domain));
        log::debug!("Fetch filestore locations with url {}", &url);
        let response = self.request(Method::GET, url).send()?;

        match response.status().as_u16() {
            200 => {
                let locations = response.json::<LocationsResponse>()?;
                Ok(locations
                    .filestore
                    .location
                    .into_vec()
                    .into_iter()
                    .map(|entry| entry.name)
                    .collect())
            }
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }

    fn list_directory(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
    ) -> Result<Vec<String>, DataPowerClientError> {
        let url = self.mgmt_url(&format!("filestore/{}/{}", domain, folder));
        log::debug!("List directory with url {}", &url);
        let response = self.request(Method::GET, url).send()?;

        match response.status().as_u16() {
            200 => {
                let listing = response.json::<DirectoryListingResponse>()?;
                Ok(listing
                    .filestore
                    .location
                    .and_then(|location| location.directory)
                    .map(|directory| directory.into_vec())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|entry| entry.name)
                    .collect())
            }
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }

    fn probe_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
    ) -> Result<FileProbe, DataPowerClientError> {
        let url = self.mgmt_url(&format!("filestore/{}/{}/{}", domain, folder, file_name));
        log::debug!("Probe remote file with url {}", &url);
        let response = self.request(Method::GET, url).send()?;

        match response.status().as_u16() {
            200 => {
                let file = response.json::<FileResponse>()?;
                Ok(FileProbe::Found {
                    content: decode_file_content(&file.file)?,
                })
            }
            404 => Ok(FileProbe::NotFound),
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }

    fn create_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
        content: &[u8],
    ) -> Result<(), DataPowerClientError> {
        let url = self.mgmt_url(&format!("filestore/{}/{}", domain, folder));
        log::debug!("Create file {} on remote with url {}", file_name, &url);
        let response = self
            .request(Method::POST, url)
            .json(&file_body(file_name, content))
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status.as_u16() {
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }

    fn update_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
        content: &[u8],
    ) -> Result<(), DataPowerClientError> {
        let url = self.mgmt_url(&format!("filestore/{}/{}/{}", domain, folder, file_name));
        log::debug!("Update file {} on remote with url {}", file_name, &url);
        let response = self
            .request(Method::PUT, url)
            .json(&file_body(file_name, content))
            .send()?;

        match response.status().as_u16() {
            200 => Ok(()),
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }

    fn delete_file(
        &self,
        domain: &DomainName,
        folder: &RemoteFolderPath,
        file_name: &str,
    ) -> Result<(), DataPowerClientError> {
        let url = self.mgmt_url(&format!("filestore/{}/{}/{}", domain, folder, file_name));
        log::debug!("Delete file {} on remote with url {}", file_name, &url);
        let response = self.request(Method::DELETE, url).send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status.as_u16() {
            401 | 403 => Err(DataPowerClientError::Authentication),
            status => {
                let text = response.text()?;
                Err(DataPowerClientError::UnexpectedResponse(status, text))
            }
        }
    }
}
