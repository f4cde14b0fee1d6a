//! Size-based rotation of the activity log.
//!
//! When the log reaches `max_bytes` it is shifted into numbered backups:
//!   autom_update.log → autom_update.log.1 → … → autom_update.log.<max_files>
//! The oldest backup is dropped and a fresh empty log is created.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Rotate `log_path` if its size is at least `max_bytes`.
///
/// Returns `true` if rotation occurred, `false` if the file was under the
/// threshold or does not exist yet. With `max_files == 0` the log is
/// truncated and no backup is kept.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }

    if max_files > 0 {
        let oldest = numbered_path(log_path, max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..max_files).rev() {
            let src = numbered_path(log_path, n);
            if src.exists() {
                fs::rename(&src, numbered_path(log_path, n + 1))?;
            }
        }
        fs::rename(log_path, numbered_path(log_path, 1))?;
    }

    fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(log_path)?;
    Ok(true)
}

/// `autom_update.log` → `autom_update.log.<n>`.
pub fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("autom_update.log");
    base.with_file_name(format!("{name}.{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LIMIT: u64 = 64;

    fn write_log(dir: &TempDir, bytes: usize) -> PathBuf {
        let path = dir.path().join("autom_update.log");
        fs::write(&path, vec![b'x'; bytes]).unwrap();
        path
    }

    #[test]
    fn small_log_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let log = write_log(&dir, 10);
        assert!(!rotate_if_needed(&log, LIMIT, 5).unwrap());
        assert!(!numbered_path(&log, 1).exists());
        assert_eq!(fs::metadata(&log).unwrap().len(), 10);
    }

    #[test]
    fn missing_log_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("autom_update.log");
        assert!(!rotate_if_needed(&log, LIMIT, 5).unwrap());
    }

    #[test]
    fn oversized_log_moves_to_first_backup() {
        let dir = TempDir::new().unwrap();
        let log = write_log(&dir, LIMIT as usize);
        assert!(rotate_if_needed(&log, LIMIT, 5).unwrap());
        assert_eq!(fs::metadata(&log).unwrap().len(), 0);
        assert_eq!(fs::metadata(numbered_path(&log, 1)).unwrap().len(), LIMIT);
    }

    #[test]
    fn backups_are_capped_and_shifted() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("autom_update.log");
        for round in 1..=4u8 {
            fs::write(&log, vec![b'0' + round; LIMIT as usize]).unwrap();
            rotate_if_needed(&log, LIMIT, 3).unwrap();
        }
        // Newest round in .1, oldest surviving round (2) in .3, nothing past the cap.
        assert_eq!(fs::read(numbered_path(&log, 1)).unwrap()[0], b'4');
        assert_eq!(fs::read(numbered_path(&log, 3)).unwrap()[0], b'2');
        assert!(!numbered_path(&log, 4).exists());
    }

    #[test]
    fn zero_backups_truncates_in_place() {
        let dir = TempDir::new().unwrap();
        let log = write_log(&dir, LIMIT as usize * 2);
        assert!(rotate_if_needed(&log, LIMIT, 0).unwrap());
        assert_eq!(fs::metadata(&log).unwrap().len(), 0);
        assert!(!numbered_path(&log, 1).exists());
    }
}
