use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use serde::{Deserialize, Serialize};

static SINK: Mutex<Option<Arc<Mutex<dyn Repository>>>> = Mutex::new(None);

/// Destination of recorded log entries.
pub trait Repository: Send + Sync + 'static {
    fn read_entries(&self) -> VecDeque<Entry>;
    fn write_entry(&mut self, entry: Entry);
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub time: String,
    #[serde(with = "LevelDef")]
    pub level: Level,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "Level")]
enum LevelDef {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

static RECORDER: Recorder = Recorder;

/// Record all log messages up to `max_level` in `repository`.
///
/// # Errors
///
/// Returns an error if a logger has already been installed.
pub fn init(
    repository: Arc<Mutex<dyn Repository>>,
    max_level: LevelFilter,
) -> Result<(), SetLoggerError> {
    if let Ok(mut sink) = SINK.lock() {
        *sink = Some(repository);
    }
    log::set_logger(&RECORDER).map(|()| log::set_max_level(max_level))
}

struct Recorder;

impl log::Log for Recorder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Ok(sink) = SINK.lock() else {
            return;
        };
        let Some(repository) = sink.as_ref() else {
            return;
        };
        if let Ok(mut repository) = repository.lock() {
            repository.write_entry(Entry {
                time: Local::now().format("%b %d %H:%M:%S").to_string(),
                level: record.level(),
                message: record.args().to_string(),
            });
        }
    }

    fn flush(&self) {}
}

/// Keeps the most recent log entries in memory, newest first.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: VecDeque<Entry>,
}

impl MemoryLog {
    pub const CAPACITY: usize = 100;
}

impl Repository for MemoryLog {
    fn read_entries(&self) -> VecDeque<Entry> {
        self.entries.clone()
    }

    fn write_entry(&mut self, entry: Entry) {
        self.entries.push_front(entry);
        self.entries.truncate(Self::CAPACITY);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn entry(message: &str) -> Entry {
        Entry {
            time: String::from("Mar 04 18:00:00"),
            level: Level::Info,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_memory_log_newest_first() {
        let mut log = MemoryLog::default();
        log.write_entry(entry("a"));
        log.write_entry(entry("b"));
        assert_eq!(
            log.read_entries(),
            VecDeque::from([entry("b"), entry("a")])
        );
    }

    #[test]
    fn test_memory_log_capacity() {
        let mut log = MemoryLog::default();
        for i in 0..=MemoryLog::CAPACITY {
            log.write_entry(entry(&i.to_string()));
        }
        let entries = log.read_entries();
        assert_eq!(entries.len(), MemoryLog::CAPACITY);
        assert_eq!(entries[0].message, MemoryLog::CAPACITY.to_string());
        assert_eq!(entries[MemoryLog::CAPACITY - 1].message, "1");
    }

    #[test]
    fn test_entry_serde() {
        let serialized = json!(Entry {
            level: Level::Warn,
            ..entry("a")
        });
        assert_eq!(serialized["level"], json!("Warn"));
        let deserialized: Entry = serde_json::from_value(serialized).unwrap();
        assert_eq!(deserialized.level, Level::Warn);
    }

    #[test]
    fn test_init() {
        let log = Arc::new(Mutex::new(MemoryLog::default()));
        init(log.clone(), LevelFilter::Debug).unwrap();

        log::warn!("replacing invalid weight -1 by 0");
        log::trace!("not recorded");

        let entries = log.lock().unwrap().read_entries();
        assert!(
            entries
                .iter()
                .any(|e| e.level == Level::Warn && e.message == "replacing invalid weight -1 by 0")
        );
        assert!(entries.iter().all(|e| e.message != "not recorded"));
    }
}
