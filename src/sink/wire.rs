//! Pipe-delimited log line format
//!
//! `TYPE|SEQUENCE|LOCAL_TIME|SERVER_TIME|MESSAGE\n`. Messages lose embedded line
//! breaks on encode; they may contain `|` because the message is the last field.

use crate::persistence::{LogRecord, NO_SERVER_TIME, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),

    #[error("unknown record type '{0}'")]
    UnknownKind(String),

    #[error("invalid sequence '{0}'")]
    InvalidSequence(String),
}

/// Encode one record as a newline-terminated line
pub fn encode_line(record: &LogRecord) -> String {
    let message = record.message.replace(['\n', '\r'], " ");
    format!(
        "{}|{}|{}|{}|{}\n",
        record.kind.as_str(),
        record.sequence,
        record.local_time,
        record.server_time_or_placeholder(),
        message
    )
}

/// Parse one line (trailing newline optional)
pub fn parse_line(line: &str) -> Result<LogRecord, WireError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = line.splitn(5, '|').collect();
    if fields.len() != 5 {
        return Err(WireError::FieldCount(fields.len()));
    }

    let kind = RecordKind::from_str(fields[0])
        .ok_or_else(|| WireError::UnknownKind(fields[0].to_string()))?;
    let sequence = fields[1]
        .parse::<u64>()
        .map_err(|_| WireError::InvalidSequence(fields[1].to_string()))?;
    let server_time = match fields[3] {
        "" | NO_SERVER_TIME => None,
        t => Some(t.to_string()),
    };

    Ok(LogRecord {
        kind,
        sequence,
        local_time: fields[2].to_string(),
        server_time,
        message: fields[4].to_string(),
    })
}
