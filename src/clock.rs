//! Event sequencing and timestamps

use chrono::{DateTime, Local};

/// Hands out strictly increasing event sequence numbers, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    last: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after `count` already-issued numbers (next issued is `count + 1`)
    pub fn resume_at(count: u64) -> Self {
        Self { last: count }
    }

    /// Allocate the next sequence number
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// Last number handed out (0 if none)
    pub fn last(&self) -> u64 {
        self.last
    }
}

/// Source of human-readable timestamps for log records.
pub trait Clock {
    /// Client-side time of day, `HH:MM:SS.mmm`
    fn local_time(&self) -> String;
    /// Server-side full timestamp, `YYYY-MM-DD HH:MM:SS.mmm`
    fn server_time(&self) -> String;
}

/// Wall clock in the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_time(&self) -> String {
        format_local_time(&Local::now())
    }

    fn server_time(&self) -> String {
        format_server_time(&Local::now())
    }
}

/// Clock frozen at fixed strings (tests, replay)
#[derive(Debug, Clone)]
pub struct FixedClock {
    pub local: String,
    pub server: String,
}

impl FixedClock {
    pub fn new(local: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            server: server.into(),
        }
    }
}

impl Clock for FixedClock {
    fn local_time(&self) -> String {
        self.local.clone()
    }

    fn server_time(&self) -> String {
        self.server.clone()
    }
}

pub fn format_local_time(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S%.3f").to_string()
}

pub fn format_server_time(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sequencer_starts_at_one() {
        let mut seq = Sequencer::new();
        assert_eq!(seq.last(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.last(), 2);
    }

    #[test]
    fn test_sequencer_resume() {
        let mut seq = Sequencer::resume_at(41);
        assert_eq!(seq.next(), 42);
    }

    #[test]
    fn test_timestamp_formats() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 2)
            .single()
            .unwrap()
            + chrono::Duration::milliseconds(45);
        assert_eq!(format_local_time(&at), "07:05:02.045");
        assert_eq!(format_server_time(&at), "2024-03-09 07:05:02.045");
    }

    #[test]
    fn test_system_clock_shape() {
        let t = SystemClock.local_time();
        assert_eq!(t.len(), 12);
        assert_eq!(&t[2..3], ":");
        assert_eq!(&t[8..9], ".");
    }
}
