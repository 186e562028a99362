use crate::storage::ExecutionResult;
use anyhow::{Context, Result};
use parking_lot::Mutex;

/// Append-only, insertion-ordered log of every attempt made through a toolkit.
///
/// Lives only as long as its owner; nothing is written to disk. Appends are
/// serialized through a single lock, so concurrent callers never observe a
/// half-written entry.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Mutex<Vec<ExecutionResult>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, result: ExecutionResult) {
        self.entries.lock().push(result);
    }

    /// Snapshot of every entry, oldest first.
    pub fn all(&self) -> Vec<ExecutionResult> {
        self.entries.lock().clone()
    }

    /// The newest `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<ExecutionResult> {
        let entries = self.entries.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    pub fn last(&self) -> Option<ExecutionResult> {
        self.entries.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        let entries = self.entries.lock();
        serde_json::to_string_pretty(&*entries).context("Failed to serialize history")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;

    fn record(command: &str) -> ExecutionResult {
        ExecutionResult::internal(command.to_string(), Ok(String::new()), PathBuf::from("/"))
    }

    #[test]
    fn preserves_insertion_order() {
        let log = HistoryLog::new();
        assert!(log.is_empty());
        for name in ["first", "second", "third"] {
            log.append(record(name));
        }

        let commands: Vec<String> = log.all().into_iter().map(|r| r.command).collect();
        assert_eq!(commands, vec!["first", "second", "third"]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().map(|r| r.command), Some("third".to_string()));
    }

    #[test]
    fn tail_returns_newest_oldest_first() {
        let log = HistoryLog::new();
        for i in 0..5 {
            log.append(record(&format!("cmd{}", i)));
        }
        let commands: Vec<String> = log.tail(2).into_iter().map(|r| r.command).collect();
        assert_eq!(commands, vec!["cmd3", "cmd4"]);
        assert_eq!(log.tail(10).len(), 5);
    }

    #[test]
    fn snapshot_is_not_affected_by_later_appends() {
        let log = HistoryLog::new();
        log.append(record("a"));
        let snapshot = log.all();
        log.append(record("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let log = Arc::new(HistoryLog::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..50 {
                        log.append(record(&format!("t{}-{}", t, i)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(log.len(), 400);

        // Per-thread order survives interleaving.
        let all = log.all();
        let t0: Vec<&str> = all
            .iter()
            .map(|r| r.command.as_str())
            .filter(|c| c.starts_with("t0-"))
            .collect();
        let expected: Vec<String> = (0..50).map(|i| format!("t0-{}", i)).collect();
        assert_eq!(t0, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn json_is_an_array_of_records() {
        let log = HistoryLog::new();
        log.append(record("pwd"));
        let value: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(1));
        assert_eq!(value[0]["command"], "pwd");
        assert_eq!(value[0]["returncode"], 0);
    }
}
