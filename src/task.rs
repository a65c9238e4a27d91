//! Task driver (spec §4.7, component C7).

use crate::cleanup;
use crate::defaults::DefaultLevelOracle;
use crate::error::{ApiLevelError, Result};
use crate::file_editor;
use crate::formatter::{CancellationToken, Formatter};
use crate::model::{APILevel, Task};
use crate::msg_editor;
use crate::parser;

/// Result of running one [`Task`] through [`process_task`].
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub path: String,
    pub content: Vec<u8>,
}

/// Run one task end to end: validate, edit, clean up, format.
///
/// Per I5, `task.content` is never mutated; every intermediate buffer is a
/// fresh copy.
pub fn process_task(
    task: &Task,
    oracle: &dyn DefaultLevelOracle,
    formatter: &dyn Formatter,
    cancel: &CancellationToken,
) -> Result<TaskOutcome> {
    if task.path.is_empty() || task.content.is_empty() {
        return Err(ApiLevelError::EmptyInput);
    }

    let original = task.content.clone();
    let mut bytes = original.clone();

    if task.is_file_level() {
        bytes = file_editor::set_file_api(
            &task.path,
            &bytes,
            task.target_api,
            oracle,
            task.skip_cleanup,
            task.error_on_exempt,
        )?;
    } else {
        let parent_api = parent_effective_api(&task.path, &bytes, &task.symbol, oracle)?;
        match msg_editor::set_msg_api(
            &task.path,
            &bytes,
            &task.symbol,
            parent_api,
            task.target_api,
            oracle,
            task.skip_cleanup,
        ) {
            Ok(edited) => bytes = edited,
            Err(ApiLevelError::ExemptByComment { .. }) if !task.error_on_exempt => {
                bytes = original.clone();
            }
            Err(e) => return Err(e),
        }
    }

    if !task.skip_cleanup {
        bytes = cleanup::cleanup(&task.path, &bytes, oracle)?;
    }

    let formatted = formatter.format(&bytes, cancel)?;

    Ok(TaskOutcome {
        path: task.path.clone(),
        content: formatted,
    })
}

/// The effective level that governs the *parent* of the named message: the
/// containing message's effective level for `editions` syntax, else the
/// file's (spec §4.7 step 3).
fn parent_effective_api(
    path: &str,
    bytes: &[u8],
    symbol: &str,
    oracle: &dyn DefaultLevelOracle,
) -> Result<APILevel> {
    let parsed = parser::parse(bytes, path, oracle)?;
    let fo = &parsed.file_opt;
    let normalized = msg_editor::strip_package_prefix(symbol, &fo.package);
    let id = fo
        .find_by_name(&normalized)
        .ok_or_else(|| ApiLevelError::UnknownSymbol(symbol.to_string()))?;
    Ok(fo.parent_effective_api(id))
}
