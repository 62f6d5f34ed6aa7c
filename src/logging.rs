//! Dedicated, serialized, size-rotated event log (`webserver.log`).
//!
//! This is distinct from the `tracing`-based ambient diagnostic logging set
//! up in `main.rs`: this logger is the one component the spec names
//! explicitly (job lifecycle events), with its own timestamp format and
//! rotation policy, mirroring the original implementation's
//! `RotatingFileHandler`. All writes are serialized through one mutex.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

const MAX_BYTES: u64 = 10 * 1024 * 1024;
const BACKUP_COUNT: u32 = 10;

struct LoggerInner {
    file: File,
    size: u64,
}

pub struct Logger {
    path: PathBuf,
    inner: Mutex<LoggerInner>,
}

impl Logger {
    /// Delete any existing `<path>*` files, then open a fresh log file.
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        delete_old_logs(&path)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let logger = Self {
            path,
            inner: Mutex::new(LoggerInner { file, size: 0 }),
        };
        logger.log_message("Server started");
        Ok(logger)
    }

    /// Append a timestamped line, rotating the file first if it has grown
    /// past `MAX_BYTES`.
    #[allow(clippy::unwrap_used)]
    pub fn log_message(&self, message: &str) {
        let mut inner = self.inner.lock().unwrap();
        let timestamp = format_time();
        let line = format!("{timestamp} {message}\n");

        if inner.size + line.len() as u64 > MAX_BYTES {
            if let Err(e) = self.rotate(&mut inner) {
                eprintln!("webserver.log rotation failed: {e}");
            }
        }

        if let Err(e) = inner.file.write_all(line.as_bytes()) {
            eprintln!("webserver.log write failed: {e}");
            return;
        }
        inner.size += line.len() as u64;
    }

    fn rotate(&self, inner: &mut LoggerInner) -> std::io::Result<()> {
        let oldest = backup_path(&self.path, BACKUP_COUNT);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for n in (1..BACKUP_COUNT).rev() {
            let src = backup_path(&self.path, n);
            if src.exists() {
                std::fs::rename(&src, backup_path(&self.path, n + 1))?;
            }
        }
        if self.path.exists() {
            std::fs::rename(&self.path, backup_path(&self.path, 1))?;
        }
        inner.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        inner.size = 0;
        Ok(())
    }
}

fn backup_path(base: &Path, n: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

fn delete_old_logs(base: &Path) -> std::io::Result<()> {
    let dir = base.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    let prefix = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn format_time() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_timestamped_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("webserver.log");
        let logger = Logger::new(&path).unwrap();
        logger.log_message("computed job 1");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Server started"));
        assert!(contents.contains("computed job 1"));
        assert!(contents.contains("GMT"));
    }

    #[test]
    fn deletes_preexisting_log_files_on_construction() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("webserver.log");
        std::fs::write(&path, b"stale\n").unwrap();
        std::fs::write(tmp.path().join("webserver.log.1"), b"stale backup\n").unwrap();

        let logger = Logger::new(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale"));
        assert!(!tmp.path().join("webserver.log.1").exists());
        logger.log_message("after reset");
    }

    #[test]
    fn rotates_when_the_size_threshold_is_exceeded() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("webserver.log");
        let logger = Logger::new(&path).unwrap();

        {
            let mut inner = logger.inner.lock().unwrap();
            inner.size = MAX_BYTES;
        }
        logger.log_message("triggers rotation");

        assert!(path.exists());
        assert!(backup_path(&path, 1).exists());
        let rotated = std::fs::read_to_string(backup_path(&path, 1)).unwrap();
        assert!(rotated.contains("Server started"));
        let current = std::fs::read_to_string(&path).unwrap();
        assert!(current.contains("triggers rotation"));
    }
}
