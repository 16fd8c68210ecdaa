//! Console transcript backing `logfile flush` and `logfile clear`.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gvd_platform::ConsoleLog;
use gvd_types::error::{GvdError, Result};

/// Lines kept in memory before the oldest unflushed ones are dropped.
const MAX_PENDING: usize = 4096;

/// Records console lines and writes the unflushed ones to a log file on
/// request.
///
/// The log file is truncated when the transcript is created, so each run
/// starts a fresh log.
pub struct ConsoleTranscript {
    path: PathBuf,
    file: Mutex<File>,
    pending: Mutex<Vec<String>>,
}

impl ConsoleTranscript {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        log::debug!("console log at {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
            pending: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record console text; it may span several lines.
    pub fn record(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        pending.extend(text.split_inclusive('\n').map(str::to_string));
        if pending.len() > MAX_PENDING {
            let excess = pending.len() - MAX_PENDING;
            pending.drain(..excess);
            log::debug!("console transcript dropped {excess} line(s)");
        }
    }
}

impl ConsoleLog for ConsoleTranscript {
    fn flush(&self) -> Result<()> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| GvdError::Command("console transcript poisoned".into()))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| GvdError::Command("console log poisoned".into()))?;
        for line in pending.iter() {
            file.write_all(line.as_bytes())?;
        }
        file.flush()?;
        log::info!("flushed {} console line(s) to {}", pending.len(), self.path.display());
        pending.clear();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| GvdError::Command("console log poisoned".into()))?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        log::info!("cleared {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> (tempfile::TempDir, ConsoleTranscript) {
        let dir = tempfile::tempdir().unwrap();
        let t = ConsoleTranscript::create(dir.path().join("gvd.log")).unwrap();
        (dir, t)
    }

    #[test]
    fn flush_writes_only_new_lines() {
        let (_dir, t) = transcript();
        t.record("router1#show time\n");
        t.record("Tue Mar 05 14:07:09 +00:00 2024\n");
        t.flush().unwrap();
        t.record("router1#quit\n");
        t.flush().unwrap();
        let text = std::fs::read_to_string(t.path()).unwrap();
        assert_eq!(
            text,
            "router1#show time\nTue Mar 05 14:07:09 +00:00 2024\nrouter1#quit\n"
        );
    }

    #[test]
    fn clear_truncates_file() {
        let (_dir, t) = transcript();
        t.record("one\ntwo\n");
        t.flush().unwrap();
        t.clear().unwrap();
        assert_eq!(std::fs::read_to_string(t.path()).unwrap(), "");
        t.record("three\n");
        t.flush().unwrap();
        assert_eq!(std::fs::read_to_string(t.path()).unwrap(), "three\n");
    }

    #[test]
    fn create_truncates_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvd.log");
        std::fs::write(&path, "stale\n").unwrap();
        let _t = ConsoleTranscript::create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn pending_is_bounded() {
        let (_dir, t) = transcript();
        for i in 0..MAX_PENDING + 10 {
            t.record(&format!("{i}\n"));
        }
        assert_eq!(t.pending.lock().unwrap().len(), MAX_PENDING);
        assert_eq!(t.pending.lock().unwrap()[0], "10\n");
    }
}
