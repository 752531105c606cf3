//! Journal d'activité du dashboard : borné, plus récent en premier.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: OffsetDateTime,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self
            .at
            .format(format_description!("[hour]:[minute]:[second]"))
            .map_err(|_| fmt::Error)?;
        write!(f, "[{}] {}", clock, self.message)
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntryView {
    pub at: String, // RFC3339
    pub message: String,
    pub line: String,
}

impl LogEntry {
    pub fn to_view(&self) -> LogEntryView {
        LogEntryView {
            at: self.at.format(&Rfc3339).unwrap_or_default(),
            message: self.message.clone(),
            line: self.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insère en tête, horodaté maintenant ; la plus ancienne entrée saute au-delà de la capacité
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.push_at(OffsetDateTime::now_utc(), message);
    }

    pub fn push_at<S: Into<String>>(&mut self, at: OffsetDateTime, message: S) {
        self.entries.push_front(LogEntry { at, message: message.into() });
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
