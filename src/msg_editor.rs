//! Message-level editor (spec §4.5, component C5).

use crate::defaults::DefaultLevelOracle;
use crate::edit::{self, Patch};
use crate::error::{ApiLevelError, Result};
use crate::model::{APILevel, FileOpt, NodeId, Syntax};
use crate::parser;
use crate::text_range;

fn bare_option_statement(syntax: Syntax, target: APILevel) -> String {
    match syntax {
        Syntax::Editions => format!("option features.(pb.go).api_level = {};", target.editions_ident()),
        _ => format!(
            "option go_api_flag = \"{}\";",
            // `set_msg_api` rejects `APILevel::Unspecified` before any call
            // reaches here, so `target` is always OPEN/HYBRID/OPAQUE.
            target
                .legacy_ident()
                .expect("target validated as non-Unspecified by set_msg_api")
        ),
    }
}

/// Text for a brand-new option line inserted right after a message's
/// opening `{`: a leading newline (the brace itself gains no trailing
/// newline of its own) followed by a two-space indented statement.
fn message_insert_text(syntax: Syntax, target: APILevel) -> String {
    format!("\n  {}", bare_option_statement(syntax, target))
}

pub(crate) fn strip_package_prefix(msg_name: &str, package: &str) -> String {
    if !package.is_empty() {
        let prefix = format!("{package}.");
        if let Some(stripped) = msg_name.strip_prefix(&prefix) {
            return stripped.to_string();
        }
    }
    msg_name.to_string()
}

/// Queue an insertion, at each non-explicit direct child of `id`, of an
/// explicit option pinning it to `old_level`. Preserves I1 before `id`'s
/// own effective level changes (spec §4.5, "recursively re-stamped").
fn collect_restamp_patches(
    fo: &FileOpt,
    id: NodeId,
    old_level: APILevel,
    bytes: &[u8],
    patches: &mut Vec<Patch>,
) -> Result<()> {
    for &child_id in &fo.message(id).children {
        let child = fo.message(child_id);
        if !child.is_explicit {
            let offset = text_range::to_byte_range(child.body_open_brace, bytes)?.end;
            patches.push(Patch::Insert(offset, message_insert_text(fo.syntax, old_level)));
        }
    }
    Ok(())
}

/// `setMsgAPI(path, bytes, msgName, parentAPI, target, skipCleanup) -> bytes'`.
///
/// `errorOnExempt` is deliberately not a parameter here: per spec §4.5 the
/// leading-comment exemption always surfaces as an error at this layer; the
/// task driver (C7) is the one that may swallow it.
pub fn set_msg_api(
    path: &str,
    bytes: &[u8],
    msg_name: &str,
    parent_api: APILevel,
    target: APILevel,
    oracle: &dyn DefaultLevelOracle,
    skip_cleanup: bool,
) -> Result<Vec<u8>> {
    if target == APILevel::Unspecified {
        return Err(ApiLevelError::InvalidTargetLevel);
    }

    let parsed = parser::parse(bytes, path, oracle)?;
    let fo = &parsed.file_opt;
    let normalized = strip_package_prefix(msg_name, &fo.package);
    let id = fo
        .find_by_name(&normalized)
        .ok_or_else(|| ApiLevelError::UnknownSymbol(msg_name.to_string()))?;
    let node = fo.message(id);

    if parent_api == target {
        // Case A: the message should inherit.
        if !node.is_explicit {
            return Ok(bytes.to_vec());
        }
        let info = node.api_info.as_ref().expect("is_explicit implies api_info");
        if info.has_leading_comment {
            return if node.effective_api == target {
                Ok(bytes.to_vec())
            } else {
                Err(ApiLevelError::ExemptByComment {
                    path: path.to_string(),
                })
            };
        }
        if node.effective_api == target {
            if skip_cleanup {
                return Ok(bytes.to_vec());
            }
            let range = text_range::byte_range_with_eol_comment(info.range, bytes)?;
            return Ok(edit::delete_range(bytes, range));
        }
        let old_level = node.effective_api;
        let mut patches = Vec::new();
        if fo.syntax == Syntax::Editions {
            collect_restamp_patches(fo, id, old_level, bytes, &mut patches)?;
        }
        let range = text_range::byte_range_with_eol_comment(info.range, bytes)?;
        patches.push(Patch::Delete(range));
        edit::assert_disjoint(&patches)?;
        Ok(edit::apply_patches_descending(bytes, patches))
    } else {
        // Case B: the message should diverge from its parent.
        if !node.is_explicit {
            let old_level = node.effective_api;
            let mut patches = Vec::new();
            if fo.syntax == Syntax::Editions {
                collect_restamp_patches(fo, id, old_level, bytes, &mut patches)?;
            }
            let offset = text_range::to_byte_range(node.body_open_brace, bytes)?.end;
            patches.push(Patch::Insert(offset, message_insert_text(fo.syntax, target)));
            edit::assert_disjoint(&patches)?;
            return Ok(edit::apply_patches_descending(bytes, patches));
        }
        if node.effective_api == target {
            return Ok(bytes.to_vec());
        }
        let info = node.api_info.as_ref().expect("is_explicit implies api_info");
        if info.has_leading_comment {
            return Err(ApiLevelError::ExemptByComment {
                path: path.to_string(),
            });
        }
        let old_level = node.effective_api;
        let mut patches = Vec::new();
        if fo.syntax == Syntax::Editions {
            collect_restamp_patches(fo, id, old_level, bytes, &mut patches)?;
        }
        let range = text_range::to_byte_range(info.range, bytes)?;
        patches.push(Patch::Replace(range, bare_option_statement(fo.syntax, target)));
        edit::assert_disjoint(&patches)?;
        Ok(edit::apply_patches_descending(bytes, patches))
    }
}
