//! Data model (spec §3).

use serde::{Deserialize, Serialize};

/// The API generation flavor selected by a file or message-level option.
///
/// `Unspecified` is a parse-time sentinel only; no edit in this crate ever
/// produces it as an output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum APILevel {
    Unspecified,
    Open,
    Hybrid,
    Opaque,
}

impl APILevel {
    /// The editions-form identifier, e.g. `API_HYBRID`.
    pub fn editions_ident(self) -> &'static str {
        match self {
            APILevel::Open => "API_OPEN",
            APILevel::Hybrid => "API_HYBRID",
            APILevel::Opaque => "API_OPAQUE",
            APILevel::Unspecified => "API_UNSPECIFIED",
        }
    }

    /// The legacy (non-editions) message-level identifier, e.g. `OPEN_V1`.
    pub fn legacy_ident(self) -> Option<&'static str> {
        match self {
            APILevel::Open => Some("OPEN_V1"),
            APILevel::Hybrid => Some("OPEN_TO_OPAQUE_HYBRID"),
            APILevel::Opaque => Some("OPAQUE_V0"),
            APILevel::Unspecified => None,
        }
    }

    pub fn from_editions_ident(ident: &str) -> Option<Self> {
        match ident {
            "API_OPEN" => Some(APILevel::Open),
            "API_HYBRID" => Some(APILevel::Hybrid),
            "API_OPAQUE" => Some(APILevel::Opaque),
            _ => None,
        }
    }

    pub fn from_legacy_ident(ident: &str) -> Option<Self> {
        match ident {
            "OPEN_V1" => Some(APILevel::Open),
            "OPEN_TO_OPAQUE_HYBRID" => Some(APILevel::Hybrid),
            "OPAQUE_V0" => Some(APILevel::Opaque),
            _ => None,
        }
    }
}

/// The schema-syntax dialect of a file (GLOSSARY "Editions").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Syntax {
    Proto2,
    Proto3,
    Editions,
}

impl Syntax {
    /// Whether feature options propagate through nested message scopes
    /// instead of always being inherited from the file.
    pub fn inherits_from_parent_message(self) -> bool {
        matches!(self, Syntax::Editions)
    }
}

/// A half-open `[begin, end)` span in 1-based line / 0-based code-point-column
/// form, as emitted by the upstream parser (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub begin_line: u32,
    pub begin_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl TextRange {
    pub fn new(begin_line: u32, begin_col: u32, end_line: u32, end_col: u32) -> Self {
        TextRange {
            begin_line,
            begin_col,
            end_line,
            end_col,
        }
    }
}

/// A half-open `[begin, end)` byte-offset span into the original content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub begin: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(begin: usize, end: usize) -> Self {
        ByteRange { begin, end }
    }

    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.begin < other.end && other.begin < self.end
    }
}

/// Information attached to an explicitly-set API-level option (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct APIInfo {
    pub range: TextRange,
    pub has_leading_comment: bool,
    /// The descriptor path used to find this option (spec §4.2): for a file
    /// option, `[8, 999, idx]`; for a message option, `msg_path ++ [7, 999, idx]`.
    pub loc_path: Vec<i32>,
}

/// An arena index into [`FileOpt::messages`].
pub type NodeId = usize;

/// One message declaration (spec §3). Forms a tree via `parent`/`children`
/// arena indices rather than owned references, so the tree can be built
/// bottom-up and parent pointers assigned in a second pass without
/// introducing ownership cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageOpt {
    /// Dot-joined package-local name, e.g. `A.A1.A2`.
    pub name: String,
    pub effective_api: APILevel,
    pub is_explicit: bool,
    pub api_info: Option<APIInfo>,
    /// The parser path to this message's descriptor, e.g. `[4, 0]` for the
    /// first top-level message, `[4, 0, 3, 0]` for its first nested message
    /// (field 3 = `DescriptorProto.nested_type`).
    pub loc_path: Vec<i32>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// True for the message synthesized for a `map<K, V>` field; such nodes
    /// are never linked into `FileOpt::roots` or any parent's `children`, but
    /// are recorded here so locPath bookkeeping stays consistent if future
    /// code ever needs to find them.
    pub is_map_entry: bool,
    /// Range of the `{` that opens this message's body. Insertion for a
    /// previously-implicit message happens at the byte immediately after
    /// this brace (spec §4.5, Case B).
    pub body_open_brace: TextRange,
}

impl MessageOpt {
    /// The message's own local name, i.e. the last dot-separated component.
    pub fn local_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// One parsed schema file (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOpt {
    pub file_name: String,
    pub package: String,
    pub syntax: Syntax,
    pub effective_api: APILevel,
    pub is_explicit: bool,
    pub api_info: Option<APIInfo>,
    /// Arena of every (non-map-entry) message declared in the file, in
    /// depth-first declaration order.
    pub messages: Vec<MessageOpt>,
    /// Indices into `messages` for the top-level message declarations.
    pub roots: Vec<NodeId>,
    /// `true` iff the file imports the features schema
    /// (`google/protobuf/go_features.proto`).
    pub imports_features: bool,
    /// Byte range of the import statement for the features schema, if
    /// present; used by cleanup pass 3 to remove it precisely.
    pub features_import_range: Option<TextRange>,
}

impl FileOpt {
    pub fn message(&self, id: NodeId) -> &MessageOpt {
        &self.messages[id]
    }

    pub fn message_mut(&mut self, id: NodeId) -> &mut MessageOpt {
        &mut self.messages[id]
    }

    /// Depth-first iterator over every message id in the tree.
    pub fn iter_messages(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            for &child in self.messages[id].children.iter().rev() {
                stack.push(child);
            }
            Some(id)
        })
    }

    /// Find a message by its dot-joined package-local name, after the caller
    /// has already stripped the package prefix if present.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.iter_messages().find(|&id| self.messages[id].name == name)
    }

    /// The effective level that governs `id`, given its parent: the
    /// containing message for `editions` syntax, else the file.
    pub fn parent_effective_api(&self, id: NodeId) -> APILevel {
        let node = &self.messages[id];
        match node.parent {
            Some(parent_id) if self.syntax.inherits_from_parent_message() => {
                self.messages[parent_id].effective_api
            }
            Some(_) => self.effective_api,
            None => self.effective_api,
        }
    }
}

/// One edit unit (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub path: String,
    pub content: Vec<u8>,
    /// Empty string means a file-level edit.
    #[serde(default)]
    pub symbol: String,
    pub target_api: APILevel,
    #[serde(default)]
    pub skip_cleanup: bool,
    #[serde(default)]
    pub error_on_exempt: bool,
}

impl Task {
    pub fn is_file_level(&self) -> bool {
        self.symbol.is_empty()
    }
}
