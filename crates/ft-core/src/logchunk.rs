//! Split build logs into their embedded per-file sections.
//!
//! Build farm logs concatenate several files. Each file is introduced by
//! `MARKER name MARKER`; whatever precedes the first marker is the `head`
//! section.

use serde::Serialize;

/// Delimiter around embedded file names.
pub const LOG_MARKER: &str = "==~_~===-=-===~_~==";

/// Name of the section before the first marker.
pub const HEAD_CHUNK: &str = "head";

/// Characters kept from the end of each section by default.
pub const DEFAULT_TAIL_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogChunk<'a> {
    pub name: &'a str,
    pub text: &'a str,
}

/// Split `log` into named sections.
///
/// A marker with no closing marker after it names a section that has no
/// body; that section is dropped.
pub fn chunk_log(log: &str) -> Vec<LogChunk<'_>> {
    let mut chunks = Vec::new();
    let mut name = HEAD_CHUNK;
    let mut rest = log;

    loop {
        let Some(open) = rest.find(LOG_MARKER) else {
            chunks.push(LogChunk { name, text: rest });
            break;
        };
        chunks.push(LogChunk {
            name,
            text: &rest[..open],
        });
        rest = &rest[open + LOG_MARKER.len()..];

        let Some(close) = rest.find(LOG_MARKER) else {
            break;
        };
        name = &rest[..close];
        rest = &rest[close + LOG_MARKER.len()..];
    }

    chunks
}

/// The last `max_chars` characters of `text`, never splitting a UTF-8
/// sequence.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
