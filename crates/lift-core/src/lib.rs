//! lift-core - Core library for Lift
//!
//! This crate contains the record models, the local `SQLite` store and the
//! offline-first snapshot sync used by the Lift CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
