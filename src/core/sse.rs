//! Line-oriented decoding of server-sent-event style response bodies.
//!
//! Both backends answer streaming requests with newline separated frames,
//! each optionally prefixed by `data:`. Bodies arrive in arbitrary chunks, so
//! [`LineDecoder`] carries the incomplete tail of one chunk over to the next
//! and only hands out complete lines. [`classify_line`] then sorts each line
//! into blank/terminator/data without ever failing.

use memchr::memchr;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Reassembles complete lines from a chunked byte stream.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, in order.
    ///
    /// Bytes after the last newline stay buffered. Splitting happens on raw
    /// bytes so a multi-byte character cut across chunks is decoded whole.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = memchr(b'\n', &self.buffer[start..]) {
            let end = start + offset;
            lines.push(String::from_utf8_lossy(&self.buffer[start..end]).into_owned());
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Flush a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Some(rest)
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Blank line or keep-alive; nothing to deliver.
    Skip,
    /// Explicit end-of-stream sentinel.
    Done,
    /// A payload that should hold one JSON record.
    Data(&'a str),
}

pub fn classify_line(line: &str) -> Frame<'_> {
    let trimmed = line.trim_start();
    let payload = trimmed.strip_prefix(DATA_PREFIX).unwrap_or(trimmed).trim();

    if payload.is_empty() || payload.starts_with(':') {
        Frame::Skip
    } else if payload == DONE_SENTINEL {
        Frame::Done
    } else {
        Frame::Data(payload)
    }
}

/// Parse a data payload into `T`, returning `None` for anything that is not
/// a complete record of that shape.
pub fn parse_payload<T>(payload: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned,
{
    match serde_json::from_str::<T>(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::trace!(error = %err, "skipping non-JSON stream frame");
            None
        }
    }
}

/// Run every complete data line through `extract`. Lines that are blank,
/// terminators, or fail to parse as `T` are skipped.
pub fn extract_records<T, R, F>(lines: &[String], extract: F) -> Vec<R>
where
    T: serde::de::DeserializeOwned,
    F: FnMut(T) -> Option<R>,
{
    lines
        .iter()
        .filter_map(|line| match classify_line(line) {
            Frame::Data(payload) => parse_payload::<T>(payload),
            Frame::Skip | Frame::Done => None,
        })
        .filter_map(extract)
        .collect()
}

/// Like [`extract_records`] for text deltas; empty deltas are dropped.
pub fn extract_deltas<T, F>(lines: &[String], extract: F) -> Vec<String>
where
    T: serde::de::DeserializeOwned,
    F: FnMut(T) -> Option<String>,
{
    extract_records(lines, extract)
        .into_iter()
        .filter(|delta: &String| !delta.is_empty())
        .collect()
}
