use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::info;

/// One-way operator log. Components receive it at construction and never read it back.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

const DEFAULT_CAPACITY: usize = 200;

/// Keeps the most recent operator messages for the console and mirrors them to tracing.
pub struct ActivityLog {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn recent(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }
}

impl LogSink for ActivityLog {
    fn log(&self, message: &str) {
        info!(target: "multitoon::activity", "{}", message);
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest_lines() {
        let log = ActivityLog::with_capacity(2);
        log.log("one");
        log.log("two");
        log.log("three");
        assert_eq!(log.recent(), vec!["two".to_string(), "three".to_string()]);
    }
}
