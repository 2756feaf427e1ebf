//! Size-triggered rotation of an append-only log file, plus helpers for the
//! backups it leaves behind.
//!
//! Backups sit next to the active file as `<name>.bak<YYYYMMDD_HHMM_SSfff>`.
//! Nothing here deletes them on its own; [`prune_backups`] is an explicit
//! operator action.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::{MylogError, Result};

const BACKUP_MARKER: &str = ".bak";
const BACKUP_TIME_FORMAT: &str = "%Y%m%d_%H%M_%S%3f";

/// An active log file that is archived and replaced once it reaches `max_size`.
///
/// Not synchronized: exactly one owner (the file sink's writer task) may use it.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_size: u64,
    /// `None` after a rotation failed between closing and reopening.
    file: Option<File>,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_size: u64) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            max_size,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archives the active file if its size is at least `max_size`.
    ///
    /// Returns `Ok(true)` when a rotation happened. On error the caller should
    /// drop the pending write; the next call retries from scratch.
    pub fn maybe_rotate(&mut self) -> Result<bool> {
        let file = match self.file.take() {
            Some(file) => file,
            None => open_append(&self.path)?,
        };

        let size = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                self.file = Some(file);
                return Err(e.into());
            }
        };
        if size < self.max_size {
            self.file = Some(file);
            return Ok(false);
        }

        // Close before renaming; some platforms refuse to rename open files.
        drop(file);
        let backup = backup_path(&self.path, Local::now());
        fs::rename(&self.path, &backup).map_err(|source| MylogError::Rename {
            from: self.path.clone(),
            to: backup.clone(),
            source,
        })?;
        self.file = Some(open_append(&self.path)?);

        info!(
            file = %self.path.display(),
            backup = %backup.display(),
            size,
            "Rotated log file"
        );
        Ok(true)
    }

    /// Rotates if needed, then appends `line` and a newline.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.maybe_rotate()?;
        let Some(file) = self.file.as_mut() else {
            return Err(MylogError::FileOpen {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no open handle"),
            });
        };
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| MylogError::FileOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// `<path>.bak<timestamp>`, with a `-<n>` suffix if that name is already taken.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut base = path.as_os_str().to_owned();
    base.push(BACKUP_MARKER);
    base.push(now.format(BACKUP_TIME_FORMAT).to_string());

    let candidate = PathBuf::from(&base);
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| {
            let mut name = base.clone();
            name.push(format!("-{n}"));
            PathBuf::from(name)
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

/// Backups of `<dir>/<name>`, oldest first.
pub fn list_backups(dir: &Path, name: &str) -> Result<Vec<BackupInfo>> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let prefix = format!("{name}{BACKUP_MARKER}");
    let mut backups = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if file_name.starts_with(&prefix) {
            backups.push(BackupInfo {
                path: entry.path(),
                size: entry.metadata()?.len(),
                name: file_name,
            });
        }
    }
    // The timestamp token sorts chronologically as text.
    backups.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(backups)
}

/// Backups that [`prune_backups`] would delete when keeping the newest `keep`.
pub fn prune_plan(dir: &Path, name: &str, keep: usize) -> Result<Vec<BackupInfo>> {
    let mut backups = list_backups(dir, name)?;
    let excess = backups.len().saturating_sub(keep);
    backups.truncate(excess);
    Ok(backups)
}

pub fn prune_backups(dir: &Path, name: &str, keep: usize) -> Result<Vec<BackupInfo>> {
    let doomed = prune_plan(dir, name, keep)?;
    for backup in &doomed {
        fs::remove_file(&backup.path)?;
    }
    Ok(doomed)
}
