use std::fs;
use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::models::NewDoctor;

#[derive(Deserialize)]
struct SeedFile {
    doctors: Vec<NewDoctor>,
}

/// Load the doctor roster from the seed file, but only into an empty table;
/// an already-populated database is left untouched.
pub fn load_if_empty(conn: &Connection, seed_path: &str) -> anyhow::Result<usize> {
    if queries::count_doctors(conn)? > 0 {
        return Ok(0);
    }

    let path = Path::new(seed_path);
    if !path.exists() {
        tracing::warn!(path = seed_path, "seed file not found, starting with no doctors");
        return Ok(0);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file: {seed_path}"))?;
    let seed: SeedFile =
        serde_json::from_str(&raw).with_context(|| format!("malformed seed file: {seed_path}"))?;

    let mut loaded = 0;
    for doctor in &seed.doctors {
        queries::insert_doctor(conn, doctor)?;
        loaded += 1;
    }

    tracing::info!(count = loaded, "seeded doctors");
    Ok(loaded)
}
