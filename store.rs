//! Library snapshot persistence.
//!
//! The whole entity graph is one JSON document, rewritten after every
//! mutation. Loading is deliberately tolerant: a missing file is a first
//! run, and an unreadable or unparsable file degrades to an empty library
//! with a logged warning rather than refusing to launch.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::Library;

pub fn load(path: &Path) -> Library {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No library at {}; starting empty", path.display());
            return Library::default();
        }
        Err(err) => {
            log::warn!(
                "Library read failed at {}: {}; starting empty",
                path.display(),
                err
            );
            return Library::default();
        }
    };

    match serde_json::from_slice::<Library>(&data) {
        Ok(mut library) => {
            let migrated = library.migrate();
            if migrated > 0 {
                log::info!("Migrated {} legacy entries", migrated);
            }
            log::info!(
                "Loaded {} walls from {}",
                library.walls.len(),
                path.display()
            );
            library
        }
        Err(err) => {
            log::warn!(
                "Library parse failed at {}: {}; starting empty",
                path.display(),
                err
            );
            Library::default()
        }
    }
}

/// Serializes the snapshot to a sibling temp file and renames it over the
/// target, so a crash mid-write never leaves a truncated library behind.
pub fn save(path: &Path, library: &Library) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(library)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
