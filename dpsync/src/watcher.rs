use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use notify::{watcher, DebouncedEvent, RecursiveMode, Watcher};

use crate::context::Context;
use crate::error::Error;
use crate::event::DiskEvent;
use crate::util;

pub struct LocalWatcher {
    workspace_folder_path: PathBuf,
    debounce: Duration,
    stop_signal: Arc<AtomicBool>,
    operational_sender: Sender<DiskEvent>,
}

impl LocalWatcher {
    pub fn new(
        workspace_folder_path: &str,
        debounce: Duration,
        stop_signal: Arc<AtomicBool>,
        operational_sender: Sender<DiskEvent>,
    ) -> Result<Self, Error> {
        Ok(Self {
            workspace_folder_path: fs::canonicalize(workspace_folder_path)?,
            debounce,
            stop_signal,
            operational_sender,
        })
    }

    pub fn listen(&mut self) -> Result<(), Error> {
        log::debug!(
            "Start listening for local changes in {}",
            self.workspace_folder_path.display(),
        );
        let (inotify_sender, inotify_receiver) = channel();
        let mut inotify_watcher = watcher(inotify_sender, self.debounce)?;
        inotify_watcher.watch(&self.workspace_folder_path, RecursiveMode::Recursive)?;

        loop {
            match inotify_receiver.recv_timeout(Duration::from_millis(250)) {
                Ok(event) => {
                    if let Err(error) = self.digest_event(&event) {
                        log::error!("Error when digest event {:?} : {:?}", &event, error)
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.stop_signal.load(Ordering::Relaxed) {
                        log::info!("Finished local listening (on stop signal)");
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log::error!("Finished local listening (on channel closed)");
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn digest_event(&self, event: &DebouncedEvent) -> Result<(), Error> {
        log::debug!("Local event received: {:?}", event);

        let messages: Vec<DiskEvent> = match event {
            DebouncedEvent::Create(absolute_path) | DebouncedEvent::Write(absolute_path) => {
                vec![DiskEvent::Changed(self.relative(absolute_path)?)]
            }
            DebouncedEvent::Remove(absolute_path) => {
                vec![DiskEvent::Removed(self.relative(absolute_path)?)]
            }
            DebouncedEvent::Rename(absolute_source_path, absolute_dest_path) => {
                vec![
                    DiskEvent::Removed(self.relative(absolute_source_path)?),
                    DiskEvent::Changed(self.relative(absolute_dest_path)?),
                ]
            }
            // Ignore these
            DebouncedEvent::NoticeWrite(_)
            | DebouncedEvent::NoticeRemove(_)
            | DebouncedEvent::Chmod(_)
            | DebouncedEvent::Rescan => {
                vec![]
            }
            // Consider Error as to log it
            DebouncedEvent::Error(err, path) => {
                log::error!("Error {} on {:?}", err, path);
                vec![]
            }
        };

        for message in messages {
            if util::ignore_path(message.path()) {
                log::debug!("Ignore local event on {}", message.path().display());
                continue;
            }
            if let Err(err) = self.operational_sender.send(message) {
                log::error!("Error when send disk event from local watcher : '{}'", err)
            }
        }

        Ok(())
    }

    fn relative(&self, absolute_path: &Path) -> Result<PathBuf, Error> {
        Ok(absolute_path
            .strip_prefix(&self.workspace_folder_path)
            .map_err(|error| {
                Error::UnexpectedError(format!(
                    "Strip path prefix {} from {} : {}",
                    self.workspace_folder_path.display(),
                    absolute_path.display(),
                    error,
                ))
            })?
            .to_path_buf())
    }
}

/// Owned handle on the single active watcher. Stopping and restarting go
/// through this handle, there is no process-wide watcher state.
pub struct WatcherHandle {
    stop_signal: Arc<AtomicBool>,
    thread: JoinHandle<Result<(), Error>>,
}

impl WatcherHandle {
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::Relaxed);
    }

    pub fn join(self) -> Result<(), Error> {
        self.thread
            .join()
            .map_err(|_| Error::UnexpectedError("Fail to join local watcher thread".to_string()))?
    }

    pub fn restart(
        self,
        context: &Context,
        operational_sender: &Sender<DiskEvent>,
    ) -> Result<WatcherHandle, Error> {
        self.stop();
        self.join()?;
        start_local_watch(context, operational_sender)
    }
}

pub fn start_local_watch(
    context: &Context,
    operational_sender: &Sender<DiskEvent>,
) -> Result<WatcherHandle, Error> {
    let stop_signal = Arc::new(AtomicBool::new(false));
    let mut local_watcher = LocalWatcher::new(
        &context.folder_path,
        Duration::from_millis(context.debounce_ms),
        stop_signal.clone(),
        operational_sender.clone(),
    )?;
    let thread = thread::spawn(move || local_watcher.listen());
    Ok(WatcherHandle {
        stop_signal,
        thread,
    })
}
