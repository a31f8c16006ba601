use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use dpsync_core::client::{DataPowerClient, FileProbe};
use dpsync_core::types::{DomainName, RemoteFolderPath};
use dpsync_core::RESERVED_PREFIX;

use crate::error::Error;
use crate::util;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SyncOutcome {
    Uploaded,
    Updated,
    Deleted,
    Failed(String),
}

/// Decides and executes exactly one remote operation per local change :
/// delete when the local file is unreadable, update (with a dated backup of
/// the remote state) when the remote file exists, create otherwise.
pub struct SyncEngine {
    client: Box<dyn DataPowerClient>,
    domain: DomainName,
    remote_folder: RemoteFolderPath,
    workspace_folder_path: PathBuf,
}

impl SyncEngine {
    pub fn new(
        client: Box<dyn DataPowerClient>,
        domain: DomainName,
        remote_folder: RemoteFolderPath,
        workspace_folder_path: PathBuf,
    ) -> Self {
        Self {
            client,
            domain,
            remote_folder,
            workspace_folder_path,
        }
    }

    pub fn sync(&self, relative_path: &Path) -> SyncOutcome {
        match self.sync_(relative_path) {
            Ok(outcome) => outcome,
            Err(error) => SyncOutcome::Failed(format!("{}", error)),
        }
    }

    fn sync_(&self, relative_path: &Path) -> Result<SyncOutcome, Error> {
        let file_name = util::file_name(relative_path)?;
        let absolute_path = self.workspace_folder_path.join(relative_path);

        // A deletion can reach us as a change notification : an unreadable
        // file is a delete intent
        let local_content = match fs::read(&absolute_path) {
            Ok(content) => content,
            Err(error) => {
                log::info!(
                    "Cannot read {} ('{}') : delete remote file",
                    absolute_path.display(),
                    error,
                );
                return Ok(self.delete(&file_name));
            }
        };

        match self
            .client
            .probe_file(&self.domain, &self.remote_folder, &file_name)
        {
            Ok(FileProbe::Found { content }) => {
                self.backup(&file_name, &content, Local::now().date_naive())?;
                Ok(self.update(&file_name, &local_content))
            }
            Ok(FileProbe::NotFound) => Ok(self.create(&file_name, &local_content)),
            Err(error) => Ok(SyncOutcome::Failed(format!(
                "Existence probe failed for {} : {}",
                file_name, error,
            ))),
        }
    }

    fn delete(&self, file_name: &str) -> SyncOutcome {
        match self
            .client
            .delete_file(&self.domain, &self.remote_folder, file_name)
        {
            Ok(()) => SyncOutcome::Deleted,
            Err(error) => SyncOutcome::Failed(format!(
                "Fail to delete remote file {} : {}",
                file_name, error,
            )),
        }
    }

    fn update(&self, file_name: &str, local_content: &[u8]) -> SyncOutcome {
        match self
            .client
            .update_file(&self.domain, &self.remote_folder, file_name, local_content)
        {
            Ok(()) => SyncOutcome::Updated,
            Err(error) => SyncOutcome::Failed(format!(
                "Fail to update remote file {} : {}",
                file_name, error,
            )),
        }
    }

    fn create(&self, file_name: &str, local_content: &[u8]) -> SyncOutcome {
        match self
            .client
            .create_file(&self.domain, &self.remote_folder, file_name, local_content)
        {
            Ok(()) => SyncOutcome::Uploaded,
            Err(error) => SyncOutcome::Failed(format!(
                "Fail to upload new remote file {} : {}",
                file_name, error,
            )),
        }
    }

    // Preserve the pre-update remote state at most once per file per day,
    // however many updates happen that day
    fn backup(&self, file_name: &str, remote_content: &[u8], day: NaiveDate) -> Result<(), Error> {
        let backup_folder_path = self
            .workspace_folder_path
            .join(format!("{}{}", RESERVED_PREFIX, day.format("%Y-%m-%d")));
        if !backup_folder_path.exists() {
            log::info!("Create backup folder {}", backup_folder_path.display());
            fs::create_dir_all(&backup_folder_path)?;
        }

        let backup_file_path = backup_folder_path.join(format!("{}{}", RESERVED_PREFIX, file_name));
        if !backup_file_path.exists() {
            log::info!("Create backup of {}", file_name);
            fs::write(&backup_file_path, remote_content)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpsync_core::client::{DataPowerClientError, MockDataPowerClient};
    use pretty_assertions::assert_eq;
    use testdir::testdir;

    fn engine(mock: MockDataPowerClient, workspace: &Path) -> SyncEngine {
        SyncEngine::new(
            Box::new(mock),
            DomainName("default".to_string()),
            RemoteFolderPath::new("local/configs"),
            workspace.to_path_buf(),
        )
    }

    fn todays_backup_folder(workspace: &Path) -> PathBuf {
        workspace.join(format!(
            "_{}",
            Local::now().date_naive().format("%Y-%m-%d"),
        ))
    }

    #[test]
    fn unreadable_file_triggers_exactly_one_delete() {
        let workspace = testdir!();
        let mut mock = MockDataPowerClient::new();
        // No probe/create/update expectation : any other call panics
        mock.expect_delete_file()
            .withf(|_, folder, file_name| {
                folder.as_str() == "local/configs" && file_name == "gone.xml"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = engine(mock, &workspace).sync(Path::new("gone.xml"));

        assert_eq!(SyncOutcome::Deleted, outcome)
    }

    #[test]
    fn failed_delete_is_reported() {
        let workspace = testdir!();
        let mut mock = MockDataPowerClient::new();
        mock.expect_delete_file()
            .times(1)
            .returning(|_, _, _| Err(DataPowerClientError::UnexpectedResponse(500, "".to_string())));

        let outcome = engine(mock, &workspace).sync(Path::new("gone.xml"));

        assert!(matches!(outcome, SyncOutcome::Failed(_)))
    }

    #[test]
    fn existing_remote_file_is_backed_up_then_updated() {
        let workspace = testdir!();
        fs::write(workspace.join("a.xml"), "<a>new</a>").unwrap();
        let mut mock = MockDataPowerClient::new();
        mock.expect_probe_file()
            .withf(|_, _, file_name| file_name == "a.xml")
            .times(1)
            .returning(|_, _, _| {
                Ok(FileProbe::Found {
                    content: b"<a></a>".to_vec(),
                })
            });
        mock.expect_update_file()
            .withf(|_, _, file_name, content| file_name == "a.xml" && content == b"<a>new</a>")
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let outcome = engine(mock, &workspace).sync(Path::new("a.xml"));

        assert_eq!(SyncOutcome::Updated, outcome);
        let backup_file_path = todays_backup_folder(&workspace).join("_a.xml");
        assert_eq!("<a></a>", fs::read_to_string(backup_file_path).unwrap())
    }

    #[test]
    fn todays_existing_backup_is_not_overwritten() {
        let workspace = testdir!();
        fs::write(workspace.join("a.xml"), "<a>new</a>").unwrap();
        let backup_folder_path = todays_backup_folder(&workspace);
        fs::create_dir_all(&backup_folder_path).unwrap();
        fs::write(backup_folder_path.join("_a.xml"), "<a>first</a>").unwrap();
        let mut mock = MockDataPowerClient::new();
        mock.expect_probe_file().times(1).returning(|_, _, _| {
            Ok(FileProbe::Found {
                content: b"<a>second</a>".to_vec(),
            })
        });
        mock.expect_update_file()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let outcome = engine(mock, &workspace).sync(Path::new("a.xml"));

        assert_eq!(SyncOutcome::Updated, outcome);
        assert_eq!(
            "<a>first</a>",
            fs::read_to_string(backup_folder_path.join("_a.xml")).unwrap(),
        )
    }

    #[test]
    fn absent_remote_file_is_created_without_backup() {
        let workspace = testdir!();
        fs::write(workspace.join("b.xml"), "<b/>").unwrap();
        let mut mock = MockDataPowerClient::new();
        mock.expect_probe_file()
            .times(1)
            .returning(|_, _, _| Ok(FileProbe::NotFound));
        // No update expectation : a PUT would panic
        mock.expect_create_file()
            .withf(|_, folder, file_name, content| {
                folder.as_str() == "local/configs" && file_name == "b.xml" && content == b"<b/>"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let outcome = engine(mock, &workspace).sync(Path::new("b.xml"));

        assert_eq!(SyncOutcome::Uploaded, outcome);
        assert!(!todays_backup_folder(&workspace).exists())
    }

    #[test]
    fn probe_error_is_surfaced_not_conflated_with_absence() {
        let workspace = testdir!();
        fs::write(workspace.join("c.xml"), "<c/>").unwrap();
        let mut mock = MockDataPowerClient::new();
        // No create/update expectation : routing the error to a creation
        // would panic
        mock.expect_probe_file()
            .times(1)
            .returning(|_, _, _| Err(DataPowerClientError::Timeout));

        let outcome = engine(mock, &workspace).sync(Path::new("c.xml"));

        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert!(!todays_backup_folder(&workspace).exists())
    }

    #[test]
    fn failed_update_is_reported_after_backup() {
        let workspace = testdir!();
        fs::write(workspace.join("a.xml"), "<a>new</a>").unwrap();
        let mut mock = MockDataPowerClient::new();
        mock.expect_probe_file().times(1).returning(|_, _, _| {
            Ok(FileProbe::Found {
                content: b"<a></a>".to_vec(),
            })
        });
        mock.expect_update_file()
            .times(1)
            .returning(|_, _, _, _| Err(DataPowerClientError::UnexpectedResponse(500, "".to_string())));

        let outcome = engine(mock, &workspace).sync(Path::new("a.xml"));

        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert!(todays_backup_folder(&workspace).join("_a.xml").exists())
    }
}
