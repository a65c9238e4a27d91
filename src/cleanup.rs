//! Cleanup engine (spec §4.6, component C6): three passes, each re-parsing
//! the file so text ranges reflect every prior pass's edits.

use std::collections::HashSet;

use crate::defaults::DefaultLevelOracle;
use crate::edit::{self, Patch};
use crate::error::{ApiLevelError, Result};
use crate::file_editor;
use crate::insertion;
use crate::model::{ByteRange, Syntax, TextRange};
use crate::parser;
use crate::text_range;

/// Run all three cleanup passes over `bytes` in sequence.
pub fn cleanup(path: &str, bytes: &[u8], oracle: &dyn DefaultLevelOracle) -> Result<Vec<u8>> {
    let out = pass1_uniform_messages_to_file(path, bytes, oracle)?;
    let out = pass2_same_as_parent(path, &out, oracle)?;
    pass3_features_import_sync(path, &out, oracle)
}

/// Pass 1: if every message shares one effective level and it differs from
/// the file's, push that level up to the file and let it imply the
/// messages (which pass 2 then strips as redundant).
fn pass1_uniform_messages_to_file(path: &str, bytes: &[u8], oracle: &dyn DefaultLevelOracle) -> Result<Vec<u8>> {
    let parsed = parser::parse(bytes, path, oracle)?;
    let fo = &parsed.file_opt;
    if fo.messages.is_empty() {
        return Ok(bytes.to_vec());
    }
    let levels: HashSet<_> = fo.iter_messages().map(|id| fo.message(id).effective_api).collect();
    if levels.len() == 1 {
        let uniform = *levels.iter().next().expect("non-empty set");
        if uniform != fo.effective_api {
            return file_editor::set_file_api(path, bytes, uniform, oracle, false, false);
        }
    }
    Ok(bytes.to_vec())
}

/// Pass 2: delete every explicit, non-exempt option whose effective level
/// already equals its parent's (spec I3).
fn pass2_same_as_parent(path: &str, bytes: &[u8], oracle: &dyn DefaultLevelOracle) -> Result<Vec<u8>> {
    let parsed = parser::parse(bytes, path, oracle)?;
    let fo = &parsed.file_opt;

    let mut patches = Vec::new();
    for id in fo.iter_messages() {
        let node = fo.message(id);
        if !node.is_explicit {
            continue;
        }
        let info = node.api_info.as_ref().expect("is_explicit implies api_info");
        if info.has_leading_comment {
            continue;
        }
        if node.effective_api == fo.parent_effective_api(id) {
            let range = text_range::byte_range_with_eol_comment(info.range, bytes)?;
            patches.push(Patch::Delete(range));
        }
    }

    if patches.is_empty() {
        return Ok(bytes.to_vec());
    }
    edit::assert_disjoint(&patches)?;
    Ok(edit::apply_patches_descending(bytes, patches))
}

/// Pass 3: the file must import the features schema iff it's actually used
/// (spec I4).
fn pass3_features_import_sync(path: &str, bytes: &[u8], oracle: &dyn DefaultLevelOracle) -> Result<Vec<u8>> {
    let parsed = parser::parse(bytes, path, oracle)?;
    let fo = &parsed.file_opt;

    let uses_features = fo.syntax == Syntax::Editions
        && (fo.is_explicit || fo.iter_messages().any(|id| fo.message(id).is_explicit));

    if uses_features && !fo.imports_features {
        let offset = insertion::import_insertion_offset(&parsed.anchors, bytes)?;
        let line = format!("import \"{}\";\n", parser::FEATURES_IMPORT_PATH);
        return Ok(edit::insert_at(bytes, offset, line.as_bytes()));
    }

    if !uses_features && fo.imports_features {
        let range = fo
            .features_import_range
            .ok_or(ApiLevelError::InternalMissingImport)?;
        let byte_range = extend_through_line(range, bytes)?;
        return Ok(edit::delete_range(bytes, byte_range));
    }

    Ok(bytes.to_vec())
}

/// Extend an import statement's byte range through its trailing newline, so
/// deleting it removes the whole line rather than leaving a blank one.
fn extend_through_line(range: TextRange, bytes: &[u8]) -> Result<ByteRange> {
    let base = text_range::to_byte_range(range, bytes)?;
    let next_line_start = parser::line_start_byte_offset(bytes, range.end_line + 1);
    if next_line_start > base.end {
        Ok(ByteRange::new(base.begin, next_line_start))
    } else {
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::TestDefaultOracle;
    use crate::model::APILevel;

    fn oracle() -> TestDefaultOracle {
        TestDefaultOracle::new(APILevel::Opaque)
    }

    #[test]
    fn promotes_uniform_message_levels_to_file() {
        let src = b"edition = \"2023\";\nmessage A {\n  option features.(pb.go).api_level = API_OPEN;\n}\nmessage B {\n  option features.(pb.go).api_level = API_OPEN;\n}\n";
        let out = cleanup("f.proto", src, &oracle()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("option features.(pb.go).api_level = API_OPEN;"));
        assert_eq!(text.matches("api_level").count(), 1);
    }

    #[test]
    fn does_not_add_file_option_when_uniform_level_is_default() {
        let src = b"edition = \"2023\";\nmessage A {\n  option features.(pb.go).api_level = API_OPAQUE;\n}\nmessage B {\n  option features.(pb.go).api_level = API_OPAQUE;\n}\n";
        let out = cleanup("f.proto", src, &oracle()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("api_level"));
    }

    #[test]
    fn removes_message_option_matching_parent() {
        let src = b"edition = \"2023\";\noption features.(pb.go).api_level = API_HYBRID;\nmessage A {\n  option features.(pb.go).api_level = API_HYBRID;\n}\n";
        let out = cleanup("f.proto", src, &oracle()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("api_level").count(), 1);
    }

    #[test]
    fn keeps_message_option_protected_by_leading_comment() {
        let src = b"edition = \"2023\";\noption features.(pb.go).api_level = API_HYBRID;\nmessage A {\n  // keep explicit\n  option features.(pb.go).api_level = API_HYBRID;\n}\n";
        let out = cleanup("f.proto", src, &oracle()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("api_level").count(), 2);
    }

    #[test]
    fn inserts_features_import_when_used_but_missing() {
        let src = b"edition = \"2023\";\npackage pkg;\noption features.(pb.go).api_level = API_HYBRID;\n";
        let out = cleanup("f.proto", src, &oracle()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("import \"google/protobuf/go_features.proto\";"));
    }

    #[test]
    fn removes_features_import_when_no_longer_used() {
        let src = b"edition = \"2023\";\nimport \"google/protobuf/go_features.proto\";\npackage pkg;\nmessage A {}\n";
        let out = cleanup("f.proto", src, &oracle()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("go_features.proto"));
    }

    #[test]
    fn leaves_correctly_synced_import_alone() {
        let src = b"edition = \"2023\";\nimport \"google/protobuf/go_features.proto\";\noption features.(pb.go).api_level = API_HYBRID;\n";
        let out = cleanup("f.proto", src, &oracle()).unwrap();
        assert_eq!(out, src.to_vec());
    }
}
