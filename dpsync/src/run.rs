use std::fs;
use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver, Sender};

use dpsync_core::client::DataPowerClient;

use crate::context::Context;
use crate::error::Error;
use crate::event::DiskEvent;
use crate::navigator;
use crate::navigator::FolderSelector;
use crate::sync::{SyncEngine, SyncOutcome};
use crate::watcher;

pub fn run(context: Context, selector: &dyn FolderSelector) -> Result<(), Error> {
    log::info!("Prepare to sync {:?}", &context.folder_path);
    fs::create_dir_all(&context.folder_path)?;

    let client = context.client()?;

    // A connection failure here is fatal : no session without the appliance
    log::info!("Check connection to {}", &context.connection.socket);
    client.check_connection().map_err(|error| {
        Error::StartupError(format!(
            "Fail to connect to {} : {}",
            context.connection.socket, error,
        ))
    })?;

    // Connection works : persist details for the next session
    context.connection.write(Path::new(&context.folder_path))?;

    let domain = navigator::choose_domain(&client, selector)?;
    let start = navigator::choose_location(&client, selector, &domain)?;
    let remote_folder = navigator::resolve_folder(&client, selector, &domain, start);
    log::info!(
        "Synchronize {} with {}::{}",
        &context.folder_path,
        &domain,
        &remote_folder,
    );

    let (operational_sender, operational_receiver): (Sender<DiskEvent>, Receiver<DiskEvent>) =
        unbounded();

    log::info!("Start local watcher");
    let watcher_handle = watcher::start_local_watch(&context, &operational_sender)?;
    // The watcher thread owns the last sender clone : the operate loop ends
    // when it does
    drop(operational_sender);

    let engine = SyncEngine::new(
        Box::new(context.client()?),
        domain,
        remote_folder,
        PathBuf::from(&context.folder_path),
    );
    operate(&engine, &operational_receiver);

    watcher_handle.stop();
    watcher_handle.join()?;
    Ok(())
}

/// One sync evaluation per received event. Failures are reported and the
/// loop continues : the watcher outlives individual sync failures.
fn operate(engine: &SyncEngine, operational_receiver: &Receiver<DiskEvent>) {
    while let Ok(event) = operational_receiver.recv() {
        log::debug!("Disk event received: {:?}", &event);
        let relative_path = event.path().clone();
        match engine.sync(&relative_path) {
            SyncOutcome::Uploaded => {
                log::info!("Uploaded {} as new remote file", relative_path.display())
            }
            SyncOutcome::Updated => log::info!("Updated remote file {}", relative_path.display()),
            SyncOutcome::Deleted => log::info!("Deleted remote file {}", relative_path.display()),
            SyncOutcome::Failed(message) => log::error!(
                "Synchronization of {} failed : {}",
                relative_path.display(),
                message,
            ),
        }
    }
}
