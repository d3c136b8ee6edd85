use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::warn;

/// Severity of a panel log line, used for terminal colouring and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "OK",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp, self.level.label(), self.message)
    }
}

/// In-memory log of panel and service output, optionally mirrored to a
/// file on disk as lines arrive.
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    log_file: PathBuf,
    persist: bool,
}

impl LogBuffer {
    pub fn new(log_file: PathBuf, persist: bool) -> Self {
        Self {
            entries: Vec::new(),
            log_file,
            persist,
        }
    }

    pub fn set_persist(&mut self, persist: bool) {
        self.persist = persist;
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message);
        if self.persist {
            self.append_to_file(&entry);
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries matching the given level (or all when `level` is `None`)
    /// whose message contains `needle`, case-insensitively.
    pub fn filtered(&self, level: Option<LogLevel>, needle: &str) -> Vec<&LogEntry> {
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| level.map_or(true, |lv| entry.level == lv))
            .filter(|entry| {
                needle.is_empty() || entry.message.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Write the full buffer to `path`, one rendered line per entry.
    pub fn export(&self, path: &Path) -> Result<(), String> {
        let mut body = String::new();
        for entry in &self.entries {
            body.push_str(&entry.render());
            body.push('\n');
        }
        std::fs::write(path, body)
            .map_err(|err| format!("Failed to export logs to {}: {err}", path.display()))
    }

    fn append_to_file(&self, entry: &LogEntry) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .and_then(|mut file| writeln!(file, "{}", entry.render()));
        if let Err(err) = result {
            warn!("logview: failed to append to {}: {err}", self.log_file.display());
        }
    }
}
