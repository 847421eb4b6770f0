// Split the runtime's multiplexed stdout/stderr byte stream into timestamped log entries.
//
// Frame layout (per line): [selector, 0, 0, 0, len_be32...] + payload. Lines are split on '\n';
// the length field is not trusted. Lines without a recognizable header are stdout payload.

use bytes::BytesMut;
use chrono::{DateTime, Utc};

use crate::models::{LogEntry, LogStream};

pub const HEADER_LEN: usize = 8;

/// Demultiplex a complete log buffer. Entries come out in stream order.
pub fn demux(raw: &[u8]) -> Vec<LogEntry> {
    let mut demuxer = LogDemuxer::new();
    let mut out = demuxer.push(raw);
    out.extend(demuxer.finish());
    out
}

/// Incremental demuxer: feed chunks with [`push`](Self::push), then call [`finish`](Self::finish)
/// once to flush a trailing line that has no newline.
#[derive(Debug, Default)]
pub struct LogDemuxer {
    buf: BytesMut,
}

impl LogDemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every entry whose line is now complete.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<LogEntry> {
        self.buf.extend_from_slice(chunk);
        self.drain(false)
    }

    pub fn finish(mut self) -> Vec<LogEntry> {
        self.drain(true)
    }

    fn drain(&mut self, eof: bool) -> Vec<LogEntry> {
        let mut out = Vec::new();
        while let Some((line_len, consumed)) = next_line(&self.buf, eof) {
            let line = self.buf.split_to(consumed);
            if let Some(entry) = parse_line(&line[..line_len]) {
                out.push(entry);
            }
        }
        out
    }
}

/// Byte 0 selects the stream; bytes 1..=3 are always zero.
fn is_header(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN && bytes[1..4] == [0, 0, 0]
}

/// True when `bytes` (shorter than a header) could still grow into one.
fn may_be_header_prefix(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes[1..bytes.len().min(4)].iter().all(|b| *b == 0)
}

/// Returns (line length without newline, bytes to consume), or None to wait for more input.
fn next_line(buf: &[u8], eof: bool) -> Option<(usize, usize)> {
    if buf.is_empty() {
        return None;
    }
    let scan_from = if is_header(buf) {
        HEADER_LEN
    } else if buf.len() < HEADER_LEN && !eof && may_be_header_prefix(buf) {
        return None;
    } else {
        0
    };
    match buf[scan_from..].iter().position(|b| *b == b'\n') {
        Some(i) => Some((scan_from + i, scan_from + i + 1)),
        None if eof => Some((buf.len(), buf.len())),
        None => None,
    }
}

fn parse_line(line: &[u8]) -> Option<LogEntry> {
    let (stream, payload) = if is_header(line) {
        (LogStream::from_selector(line[0]), &line[HEADER_LEN..])
    } else {
        (LogStream::Stdout, line)
    };
    let text = String::from_utf8_lossy(payload);
    let (timestamp, message) = split_timestamp(&text);
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    Some(LogEntry {
        timestamp,
        message: message.to_string(),
        stream,
    })
}

/// Strip a leading RFC-3339 token. Falls back to the processing time (not the emission
/// time) and the untouched text when there is no parsable token.
fn split_timestamp(text: &str) -> (DateTime<Utc>, &str) {
    let trimmed = text.trim_start();
    let (token, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    if looks_like_timestamp(token)
        && let Some(ts) = parse_timestamp(token)
    {
        return (ts, rest);
    }
    (Utc::now(), text)
}

fn looks_like_timestamp(token: &str) -> bool {
    token.contains('T') && (token.contains('Z') || token.contains('+'))
}

/// RFC-3339 with or without fractional seconds.
pub fn parse_timestamp(token: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(token)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
