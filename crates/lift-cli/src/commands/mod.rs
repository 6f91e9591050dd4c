pub mod common;
pub mod completions;
pub mod config;
pub mod conflicts;
pub mod exercise;
pub mod gc;
pub mod init;
pub mod status;
pub mod sync;
