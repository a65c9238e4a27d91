//! Edits the API-level annotation (`OPEN`/`HYBRID`/`OPAQUE`) on a schema
//! file or one of its messages, then normalizes redundant annotations and
//! keeps the features import in sync.
//!
//! The crate is a pure, synchronous, single-file transformation: callers
//! own reading schema bytes from disk, fanning work out across files, and
//! writing results back. See [`process_task`] for the single entry point
//! that ties parsing, editing, cleanup, and formatting together.

mod cleanup;
mod defaults;
mod edit;
mod error;
mod file_editor;
mod formatter;
mod insertion;
mod model;
mod msg_editor;
mod parser;
mod task;
mod text_range;

pub use defaults::{DefaultLevelOracle, TestDefaultOracle, TESTONLY_OPAQUE_DEFAULT_DUMMY_PATH};
pub use error::{ApiLevelError, Result};
pub use file_editor::set_file_api;
pub use formatter::{CancellationToken, ExternalProcessFormatter, Formatter, IdentityFormatter};
pub use model::{APIInfo, APILevel, ByteRange, FileOpt, MessageOpt, NodeId, Syntax, Task, TextRange};
pub use msg_editor::set_msg_api;
pub use parser::FEATURES_IMPORT_PATH;
pub use task::{process_task, TaskOutcome};

/// Parse `content` into a [`FileOpt`] without applying any edit. Exposed for
/// callers that only need to inspect a schema file (e.g. to compute the
/// `parentAPI` argument to [`set_msg_api`] themselves, or to build their own
/// batch driver around [`process_task`]).
pub fn parse(content: &[u8], file_name: &str, oracle: &dyn DefaultLevelOracle) -> Result<FileOpt> {
    parser::parse(content, file_name, oracle).map(|p| p.file_opt)
}

/// Same as [`parse`] but skips descending into message bodies, for callers
/// that only need file-level information.
pub fn parse_file_only(content: &[u8], file_name: &str, oracle: &dyn DefaultLevelOracle) -> Result<FileOpt> {
    parser::parse_file_only(content, file_name, oracle).map(|p| p.file_opt)
}

/// Run the three-pass cleanup engine (spec §4.6) over `bytes` directly,
/// without going through a [`Task`]. [`process_task`] calls this internally
/// unless `skip_cleanup` is set.
pub fn cleanup(path: &str, bytes: &[u8], oracle: &dyn DefaultLevelOracle) -> Result<Vec<u8>> {
    cleanup::cleanup(path, bytes, oracle)
}
