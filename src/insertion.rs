//! Shared insertion-position heuristic (spec §4.4.1), used by both the
//! file-level editor's option insert and cleanup pass 3's import insert.

use crate::error::{ApiLevelError, Result};
use crate::parser::{line_start_byte_offset, InsertionAnchors};

/// Ladder for inserting a new file-level `option` statement: last
/// file-level option, then last import, then package, then syntax/edition.
pub fn option_insertion_line(anchors: &InsertionAnchors) -> Result<u32> {
    anchors
        .last_file_option_line
        .or(anchors.last_import_line)
        .or(anchors.package_line)
        .or(anchors.syntax_or_edition_line)
        .ok_or(ApiLevelError::NoInsertionPoint)
}

/// Ladder for inserting the features `import` statement (spec §4.6 pass 3):
/// last import, then package, then syntax/edition. Never anchors after a
/// file-level option; an import belongs above those.
pub fn import_insertion_line(anchors: &InsertionAnchors) -> Result<u32> {
    anchors
        .last_import_line
        .or(anchors.package_line)
        .or(anchors.syntax_or_edition_line)
        .ok_or(ApiLevelError::NoInsertionPoint)
}

/// Byte offset immediately after the chosen anchor line, where a
/// newly-inserted line should begin.
pub fn option_insertion_offset(anchors: &InsertionAnchors, bytes: &[u8]) -> Result<usize> {
    let line = option_insertion_line(anchors)?;
    Ok(line_start_byte_offset(bytes, line + 1))
}

pub fn import_insertion_offset(anchors: &InsertionAnchors, bytes: &[u8]) -> Result<usize> {
    let line = import_insertion_line(anchors)?;
    Ok(line_start_byte_offset(bytes, line + 1))
}
