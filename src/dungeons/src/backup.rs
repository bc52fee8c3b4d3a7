//! Timestamped backups and atomic save writes.
//!
//! Saving always copies the bytes the document was loaded from to
//! `<stem>.b<YYMMDDHHmmss>.dat` next to the destination before the
//! destination is touched. The destination itself is replaced through a
//! temporary file in the same directory, so a failed write leaves the
//! previous file in place.

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// strftime pattern for the timestamp part of a backup filename
pub const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// Extension given to backups regardless of the save's own extension
pub const BACKUP_EXTENSION: &str = "dat";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Backup filename for `save_path` taken at `timestamp`
pub fn backup_path(save_path: &Path, timestamp: NaiveDateTime) -> Result<PathBuf, BackupError> {
    let stem = save_path
        .file_stem()
        .ok_or_else(|| BackupError::NoFileName(save_path.to_path_buf()))?;

    let mut name = stem.to_os_string();
    name.push(format!(
        ".b{}.{}",
        timestamp.format(TIMESTAMP_FORMAT),
        BACKUP_EXTENSION
    ));
    Ok(save_path.with_file_name(name))
}

/// Write `original` to a fresh backup next to `save_path`
pub fn write_backup(save_path: &Path, original: &[u8]) -> Result<PathBuf, BackupError> {
    write_backup_at(save_path, original, Local::now().naive_local())
}

fn write_backup_at(
    save_path: &Path,
    original: &[u8],
    timestamp: NaiveDateTime,
) -> Result<PathBuf, BackupError> {
    let path = backup_path(save_path, timestamp)?;
    write_atomic(&path, original)?;
    debug!(backup = %path.display(), bytes = original.len(), "Wrote backup");
    Ok(path)
}

/// Replace `dest` with `bytes` all at once.
///
/// The data is written and synced to a temporary file in the destination's
/// directory, then renamed over `dest`.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), BackupError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if dest.file_name().is_none() {
        return Err(BackupError::NoFileName(dest.to_path_buf()));
    }

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| BackupError::Persist {
        path: dest.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Back up `original`, then write `encoded` to `dest`.
///
/// Returns the backup's path. If the backup fails, `dest` is not touched.
pub fn save_with_backup(
    dest: &Path,
    original: &[u8],
    encoded: &[u8],
) -> Result<PathBuf, BackupError> {
    save_with_backup_at(dest, original, encoded, Local::now().naive_local())
}

fn save_with_backup_at(
    dest: &Path,
    original: &[u8],
    encoded: &[u8],
    timestamp: NaiveDateTime,
) -> Result<PathBuf, BackupError> {
    let backup = write_backup_at(dest, original, timestamp)?;
    write_atomic(dest, encoded)?;
    info!(
        path = %dest.display(),
        backup = %backup.display(),
        bytes = encoded.len(),
        "Saved"
    );
    Ok(backup)
}

/// Backups of `save_path` found in its directory, oldest first
pub fn list_backups(save_path: &Path) -> Result<Vec<PathBuf>, BackupError> {
    let stem = save_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| BackupError::NoFileName(save_path.to_path_buf()))?;
    let dir = match save_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!("{}.b", stem);
    let suffix = format!(".{}", BACKUP_EXTENSION);

    let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(&prefix))
                .and_then(|rest| rest.strip_suffix(&suffix))
                .is_some_and(|stamp| {
                    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok()
                })
        })
        .collect();
    // Timestamps are fixed-width, so name order is time order
    backups.sort();
    Ok(backups)
}
