//! Snapshot transports

mod cloud;
mod file;

pub use cloud::{CloudFolderProvider, SNAPSHOT_OBJECT_NAME};
pub use file::{FileProvider, DEFAULT_FILE_PREFIX};
