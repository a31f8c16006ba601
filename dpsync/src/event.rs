use std::path::PathBuf;

/// Local change collapsed to what the sync engine distinguishes. Paths are
/// relative to the watched workspace folder.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DiskEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

impl DiskEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            DiskEvent::Changed(path) | DiskEvent::Removed(path) => path,
        }
    }
}
