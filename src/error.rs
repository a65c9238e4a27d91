//! Error type for the API-level editor (spec §7).

use thiserror::Error;

/// Everything that can cause a [`crate::task::process_task`] call, or one of
/// the lower-level editor/cleanup entry points, to fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiLevelError {
    #[error("task path or content is empty")]
    EmptyInput,

    #[error("failed to parse schema file: {0}")]
    ParseFailure(String),

    #[error("file-level API option is only supported for editions syntax")]
    UnsupportedSyntax,

    #[error("unknown message symbol: {0}")]
    UnknownSymbol(String),

    #[error("target API level must be OPEN, HYBRID, or OPAQUE, not UNSPECIFIED")]
    InvalidTargetLevel,

    #[error("option at {path} is protected by a leading comment")]
    ExemptByComment { path: String },

    #[error("text range spans a line containing a tab character")]
    TabInRange,

    #[error("no suitable insertion point found in file")]
    NoInsertionPoint,

    #[error("cleanup produced overlapping byte ranges")]
    InternalOverlap,

    #[error("dependency list claims the features import but source-code info doesn't locate it")]
    InternalMissingImport,

    #[error("external formatter failed: {0}")]
    FormatterFailure(String),

    #[error("invalid text range: {0}")]
    InvalidRange(String),
}

pub type Result<T> = std::result::Result<T, ApiLevelError>;
