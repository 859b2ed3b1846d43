use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::json;

use super::error::Result;
use super::session::{SessionId, SessionMetadata};

/// JSONL transcript of everything sent to and received from one shell
pub struct SessionLogger {
    session_id: SessionId,
    log_file: File,
    meta_path: PathBuf,
}

impl SessionLogger {
    /// Create a new session logger
    pub fn new(session_id: SessionId, log_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("session-{}.log", session_id));
        let meta_path = log_dir.join(format!("session-{}-meta.json", session_id));

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            session_id,
            log_file,
            meta_path,
        })
    }

    /// Log input written to the shell
    pub fn log_input(&mut self, data: &str) -> Result<()> {
        self.log_io("in", data)
    }

    /// Log output read from the shell
    pub fn log_output(&mut self, data: &str) -> Result<()> {
        self.log_io("out", data)
    }

    /// Log a lifecycle event such as open, timeout or close
    pub fn log_event(&mut self, event: &str, detail: &str) -> Result<()> {
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "session_id": self.session_id,
            "event": event,
            "detail": detail,
        });
        self.write_entry(&entry)
    }

    /// Overwrite the metadata file with the current session state
    pub fn write_metadata(&mut self, metadata: &SessionMetadata) -> Result<()> {
        let json_str = serde_json::to_string_pretty(metadata).map_err(std::io::Error::from)?;
        std::fs::write(&self.meta_path, json_str)?;
        Ok(())
    }

    fn log_io(&mut self, direction: &str, data: &str) -> Result<()> {
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "session_id": self.session_id,
            "direction": direction,
            "data": data,
        });
        self.write_entry(&entry)
    }

    fn write_entry(&mut self, entry: &serde_json::Value) -> Result<()> {
        writeln!(self.log_file, "{}", entry)?;
        self.log_file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use tempfile::TempDir;

    #[test]
    fn transcript_lines_are_json_events() {
        let dir = TempDir::new().unwrap();
        let mut logger = SessionLogger::new(7, dir.path()).unwrap();

        logger.log_input("echo hi\n").unwrap();
        logger.log_output("hi\r\n").unwrap();
        logger.log_event("close", "requested").unwrap();

        let contents = std::fs::read_to_string(dir.path().join("session-7.log")).unwrap();
        let entries: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["direction"], "in");
        assert_eq!(entries[0]["data"], "echo hi\n");
        assert_eq!(entries[1]["direction"], "out");
        assert_eq!(entries[2]["event"], "close");
        assert!(entries.iter().all(|e| e["session_id"] == 7));
    }

    #[test]
    fn metadata_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let mut logger = SessionLogger::new(3, dir.path()).unwrap();
        let mut metadata = SessionMetadata {
            id: 3,
            created_at: Utc::now(),
            shell: "/bin/bash".to_string(),
            working_dir: Some(PathBuf::from("/tmp")),
            status: SessionStatus::Running,
            pid: Some(42),
        };

        logger.write_metadata(&metadata).unwrap();
        metadata.status = SessionStatus::Stopped;
        logger.write_metadata(&metadata).unwrap();

        let meta_path = dir.path().join("session-3-meta.json");
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(meta_path).unwrap()).unwrap();
        assert_eq!(value["status"], "Stopped");
        assert_eq!(value["working_dir"], "/tmp");
        assert_eq!(value["pid"], 42);
    }
}
