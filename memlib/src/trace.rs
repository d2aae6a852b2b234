use std::io::BufRead;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::TraceError;

/// Whether an access reads or writes. Writes mark the page dirty
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    #[default]
    Read,
    Write,
}

/// One line of a trace
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub address: u64,
    pub kind: AccessKind,
}

impl TraceEntry {
    pub fn read(address: u64) -> Self {
        Self { address, kind: AccessKind::Read }
    }

    pub fn write(address: u64) -> Self {
        Self { address, kind: AccessKind::Write }
    }
}

lazy_static! {
    static ref ACCESS_PATTERN: Regex =
        Regex::new(r"^(?:0[xX](?P<hex>[0-9a-fA-F]+)|(?P<dec>[0-9]+))(?:\s+(?P<kind>[rRwW]))?$").unwrap();
}

/// Parses a single trace line. Blank lines and `#` comments give `Ok(None)`
///
/// # Examples
///
/// ```
/// use memlib::trace::{parse_line, TraceEntry};
/// assert_eq!(parse_line("0x1000 W", 1).unwrap(), Some(TraceEntry::write(0x1000)));
/// assert_eq!(parse_line("64", 2).unwrap(), Some(TraceEntry::read(64)));
/// assert_eq!(parse_line("# warm up", 3).unwrap(), None);
/// ```
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<TraceEntry>, TraceError> {
    let content = match line.split_once('#') {
        Some((before, _)) => before.trim(),
        None => line.trim(),
    };
    if content.is_empty() {
        return Ok(None);
    }
    let syntax_error = || TraceError::Syntax { line: line_number, content: content.to_string() };
    let captures = ACCESS_PATTERN.captures(content).ok_or_else(syntax_error)?;
    let address = match (captures.name("hex"), captures.name("dec")) {
        (Some(hex), _) => u64::from_str_radix(hex.as_str(), 16),
        (_, Some(dec)) => dec.as_str().parse(),
        _ => return Err(syntax_error()),
    }
    .map_err(|_| syntax_error())?;
    let kind = match captures.name("kind").map(|k| k.as_str()) {
        Some("w") | Some("W") => AccessKind::Write,
        _ => AccessKind::Read,
    };
    Ok(Some(TraceEntry { address, kind }))
}

/// Reads a whole trace, stopping at the first malformed line
pub fn read_trace(reader: impl BufRead) -> Result<Vec<TraceEntry>, TraceError> {
    let mut entries = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        if let Some(entry) = parse_line(&line?, number + 1)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Turns bare addresses into a read-only trace
pub fn reads(addresses: &[u64]) -> Vec<TraceEntry> {
    addresses.iter().copied().map(TraceEntry::read).collect()
}
