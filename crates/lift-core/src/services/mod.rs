//! Async services shared by clients

mod database;

pub use database::{DatabaseService, TableCount};
