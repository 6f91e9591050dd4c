//! Database layer for Lift

mod connection;
mod meta_repository;
mod migrations;
mod repository;
mod seed;

pub use connection::Database;
pub use meta_repository::{LastSync, MetaRepository, SqliteMetaRepository};
pub use repository::{RecordRepository, SqliteRecordRepository};
pub use seed::seed_defaults;
