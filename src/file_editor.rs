//! File-level editor (spec §4.4, component C4).

use crate::defaults::DefaultLevelOracle;
use crate::edit;
use crate::error::{ApiLevelError, Result};
use crate::insertion;
use crate::model::{APILevel, Syntax};
use crate::parser;
use crate::text_range;

fn bare_option_statement(target: APILevel) -> String {
    format!("option features.(pb.go).api_level = {};", target.editions_ident())
}

/// `setFileAPI(path, bytes, target, skipCleanup, errorOnExempt) -> bytes'`.
///
/// Only `editions` syntax carries a file-level API option; any other
/// syntax fails `UnsupportedSyntax` outright.
pub fn set_file_api(
    path: &str,
    bytes: &[u8],
    target: APILevel,
    oracle: &dyn DefaultLevelOracle,
    skip_cleanup: bool,
    error_on_exempt: bool,
) -> Result<Vec<u8>> {
    if target == APILevel::Unspecified {
        return Err(ApiLevelError::InvalidTargetLevel);
    }

    let parsed = parser::parse_file_only(bytes, path, oracle)?;
    let fo = &parsed.file_opt;

    if fo.syntax != Syntax::Editions {
        return Err(ApiLevelError::UnsupportedSyntax);
    }

    let default_level = oracle.default_for(path);
    let explicit = fo.is_explicit;
    let effective = fo.effective_api;
    let has_leading_comment = fo
        .api_info
        .as_ref()
        .map(|info| info.has_leading_comment)
        .unwrap_or(false);

    if target == default_level {
        if !explicit {
            return Ok(bytes.to_vec());
        }
        if has_leading_comment {
            return if error_on_exempt {
                Err(ApiLevelError::ExemptByComment {
                    path: path.to_string(),
                })
            } else {
                Ok(bytes.to_vec())
            };
        }
        if effective == target && skip_cleanup {
            return Ok(bytes.to_vec());
        }
        let info = fo.api_info.as_ref().expect("explicit implies api_info");
        let range = text_range::byte_range_with_eol_comment(info.range, bytes)?;
        Ok(edit::delete_range(bytes, range))
    } else {
        if !explicit {
            let offset = insertion::option_insertion_offset(&parsed.anchors, bytes)?;
            let line = format!("{}\n", bare_option_statement(target));
            return Ok(edit::insert_at(bytes, offset, line.as_bytes()));
        }
        if effective == target {
            return Ok(bytes.to_vec());
        }
        if has_leading_comment {
            return if error_on_exempt {
                Err(ApiLevelError::ExemptByComment {
                    path: path.to_string(),
                })
            } else {
                Ok(bytes.to_vec())
            };
        }
        let info = fo.api_info.as_ref().expect("explicit implies api_info");
        let range = text_range::to_byte_range(info.range, bytes)?;
        Ok(edit::replace_range(bytes, range, bare_option_statement(target).as_bytes()))
    }
}
