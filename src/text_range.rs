//! Text-range utility (spec §4.1, component C1).
//!
//! Maps the parser's `(line, col)` spans to byte offsets in the original
//! file content. This is the only place in the crate where tabs vs. spaces
//! matters (spec §9, "Parser coupling").

use crate::error::{ApiLevelError, Result};
use crate::model::{ByteRange, TextRange};

/// Convert a 3- or 4-element integer span into a [`TextRange`].
///
/// A 3-element span `[line, begin_col, end_col]` is a single-line range; a
/// 4-element span `[begin_line, begin_col, end_line, end_col]` may cross
/// lines.
pub fn span_to_text_range(span: &[i32]) -> Result<TextRange> {
    let as_u32 = |v: i32, what: &str| -> Result<u32> {
        u32::try_from(v).map_err(|_| ApiLevelError::InvalidRange(format!("negative {what}: {v}")))
    };

    match span.len() {
        3 => {
            let line = as_u32(span[0], "line")?;
            let begin_col = as_u32(span[1], "begin_col")?;
            let end_col = as_u32(span[2], "end_col")?;
            Ok(TextRange::new(line, begin_col, line, end_col))
        }
        4 => {
            let begin_line = as_u32(span[0], "begin_line")?;
            let begin_col = as_u32(span[1], "begin_col")?;
            let end_line = as_u32(span[2], "end_line")?;
            let end_col = as_u32(span[3], "end_col")?;
            Ok(TextRange::new(begin_line, begin_col, end_line, end_col))
        }
        n => Err(ApiLevelError::InvalidRange(format!(
            "span must have 3 or 4 elements, got {n}"
        ))),
    }
}

/// Byte offset of the start of each 1-based line in `bytes`, plus one
/// trailing sentinel equal to `bytes.len()`.
fn line_starts(bytes: &[u8]) -> Vec<usize> {
    let mut starts = vec![0usize];
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// The raw byte slice for 1-based line `line`, *excluding* its trailing
/// `\n` (and a preceding `\r`, if any).
fn line_slice(bytes: &[u8], starts: &[usize], line: u32) -> Option<&[u8]> {
    let idx = (line as usize).checked_sub(1)?;
    let begin = *starts.get(idx)?;
    let end = starts
        .get(idx + 1)
        .map(|&e| e.saturating_sub(1))
        .unwrap_or(bytes.len());
    let end = if end >= begin && bytes.get(end.wrapping_sub(1)) == Some(&b'\r') {
        end - 1
    } else {
        end
    };
    bytes.get(begin..end.max(begin))
}

/// Byte offset of the `col`-th code point (0-based) on 1-based `line`.
/// `col == line.chars().count()` is valid and refers to the end of the line.
fn column_to_byte_offset(bytes: &[u8], starts: &[usize], line: u32, col: u32) -> Result<usize> {
    let idx = (line as usize)
        .checked_sub(1)
        .ok_or_else(|| ApiLevelError::InvalidRange("line must be >= 1".into()))?;
    let line_begin = *starts
        .get(idx)
        .ok_or_else(|| ApiLevelError::InvalidRange(format!("line {line} out of bounds")))?;
    let line_bytes = line_slice(bytes, starts, line)
        .ok_or_else(|| ApiLevelError::InvalidRange(format!("line {line} out of bounds")))?;
    let line_str = std::str::from_utf8(line_bytes)
        .map_err(|e| ApiLevelError::InvalidRange(format!("invalid utf-8 on line {line}: {e}")))?;

    let mut seen = 0u32;
    for (byte_off, _) in line_str.char_indices() {
        if seen == col {
            return Ok(line_begin + byte_off);
        }
        seen += 1;
    }
    if seen == col {
        return Ok(line_begin + line_str.len());
    }
    Err(ApiLevelError::InvalidRange(format!(
        "column {col} past end of line {line} ({seen} code points)"
    )))
}

fn line_contains_tab(bytes: &[u8], starts: &[usize], line: u32) -> bool {
    line_slice(bytes, starts, line)
        .map(|s| s.contains(&b'\t'))
        .unwrap_or(false)
}

/// Convert a [`TextRange`] to a half-open `[begin, end)` byte range in
/// `bytes`.
///
/// Fails if any line the range covers contains a tab, if `end` precedes
/// `begin`, or if a column lies past the end of its line.
pub fn to_byte_range(range: TextRange, bytes: &[u8]) -> Result<ByteRange> {
    if (range.end_line, range.end_col) < (range.begin_line, range.begin_col) {
        return Err(ApiLevelError::InvalidRange(
            "end position precedes begin position".into(),
        ));
    }

    let starts = line_starts(bytes);

    for line in range.begin_line..=range.end_line {
        if line_contains_tab(bytes, &starts, line) {
            return Err(ApiLevelError::TabInRange);
        }
    }

    let begin = column_to_byte_offset(bytes, &starts, range.begin_line, range.begin_col)?;
    let end = column_to_byte_offset(bytes, &starts, range.end_line, range.end_col)?;
    Ok(ByteRange::new(begin, end))
}

/// If the option covered by `range` lives on a single line, and the rest of
/// that line after it is whitespace followed by `//`, extend the end of the
/// returned byte range to swallow that end-of-line comment (and its
/// terminating newline, if any).
pub fn byte_range_with_eol_comment(range: TextRange, bytes: &[u8]) -> Result<ByteRange> {
    let base = to_byte_range(range, bytes)?;

    if range.begin_line != range.end_line {
        return Ok(base);
    }

    let starts = line_starts(bytes);
    let line = range.end_line;
    let idx = match (line as usize).checked_sub(1) {
        Some(i) => i,
        None => return Ok(base),
    };
    let line_begin = match starts.get(idx) {
        Some(&s) => s,
        None => return Ok(base),
    };
    let next_line_start = starts.get(idx + 1).copied().unwrap_or(bytes.len());

    let tail = &bytes[base.end..next_line_start];
    let trimmed = tail
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .map(|p| &tail[p..])
        .unwrap_or(&[]);

    if trimmed.starts_with(b"//") {
        let _ = line_begin;
        Ok(ByteRange::new(base.begin, next_line_start))
    } else {
        Ok(base)
    }
}
