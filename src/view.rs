//! Plain-text log table shown when the session is closed

use std::fmt;

use crate::persistence::LogRecord;

/// Snapshot of the log at the time it was taken
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogView {
    pub records: Vec<LogRecord>,
}

impl LogView {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for LogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.records.is_empty() {
            return writeln!(f, "No log entries.");
        }

        let seq_width = self
            .records
            .iter()
            .map(|r| r.sequence.to_string().len())
            .max()
            .unwrap_or(1)
            .max(1);
        let time_width = self
            .records
            .iter()
            .map(|r| r.local_time.len())
            .max()
            .unwrap_or(0)
            .max("Local time".len());

        writeln!(
            f,
            "{:>sw$}  {:<9}  {:<tw$}  Message",
            "#",
            "Type",
            "Local time",
            sw = seq_width,
            tw = time_width
        )?;
        for r in &self.records {
            writeln!(
                f,
                "{:>sw$}  {:<9}  {:<tw$}  {}",
                r.sequence,
                r.kind.as_str(),
                r.local_time,
                r.message,
                sw = seq_width,
                tw = time_width
            )?;
        }
        Ok(())
    }
}
