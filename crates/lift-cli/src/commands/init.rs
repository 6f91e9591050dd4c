use std::path::Path;

use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_init(seed: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let device_id = db.device_id().await?;
    println!("Database ready at {}", db_path.display());
    println!("Device ID: {device_id}");

    if seed {
        if db.seed_defaults().await? {
            println!("Seeded default settings, exercises and templates");
        } else {
            println!("Database already has data; skipped seeding");
        }
    }
    Ok(())
}
