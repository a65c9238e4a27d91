//! Schema parser wrapper (spec §4.2, component C2).
//!
//! This crate owns its own minimal recursive-descent scanner over the
//! schema's textual option/import/message grammar:
//! `syntax`/`edition`, `package`, `import`, file- and message-scoped
//! `option` statements, and (possibly nested) `message { ... }` blocks.
//! Everything else (fields, `enum`, `service`, `oneof`, `extend`,
//! `reserved`, and so on) is skipped structurally so line/column tracking
//! stays correct without this crate needing to understand it.
//!
//! Downstream code (C4/C5/C6) only ever consumes the resulting [`FileOpt`],
//! so a caller with a real descriptor-pool-backed parser can swap this
//! module out entirely as long as they produce the same tree.

use crate::defaults::DefaultLevelOracle;
use crate::error::{ApiLevelError, Result};
use crate::model::{APIInfo, APILevel, FileOpt, MessageOpt, NodeId, Syntax, TextRange};

/// The import literal that must be present whenever any editions feature
/// option is used anywhere in the file (spec §6, GLOSSARY "Features import").
pub const FEATURES_IMPORT_PATH: &str = "google/protobuf/go_features.proto";

const FILE_OPTIONS_FIELD: i32 = 8;
const UNINTERPRETED_OPTION_FIELD: i32 = 999;
const MESSAGE_TYPE_FIELD: i32 = 4;
const NESTED_TYPE_FIELD: i32 = 3;
const MESSAGE_OPTIONS_FIELD: i32 = 7;

const API_LEVEL_OPTION_NAME: &str = "features.(pb.go).api_level";
const LEGACY_API_OPTION_NAME: &str = "go_api_flag";
const MAP_ENTRY_OPTION_NAME: &str = "map_entry";

/// Anchors available to the insertion heuristic (spec §4.4.1), collected
/// while scanning the file top to bottom.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionAnchors {
    pub last_file_option_line: Option<u32>,
    pub last_import_line: Option<u32>,
    pub package_line: Option<u32>,
    /// `syntax = "...";` or `edition = "...";`. In real schema files these
    /// are mutually exclusive, so the ladder's "syntax, then edition, then
    /// deprecated editions field" rungs collapse to one anchor; see
    /// DESIGN.md.
    pub syntax_or_edition_line: Option<u32>,
}

/// A fully parsed schema file, plus the anchors the insertion heuristic and
/// cleanup pass 3 need.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file_opt: FileOpt,
    pub anchors: InsertionAnchors,
}

/// Parse `content` into a [`FileOpt`], descending into every message.
pub fn parse(content: &[u8], file_name: &str, oracle: &dyn DefaultLevelOracle) -> Result<ParsedFile> {
    parse_impl(content, file_name, oracle, false)
}

/// Parse `content` into a [`FileOpt`] without descending into message
/// bodies, for callers that only need file-level information (spec §4.2,
/// "fast file-only queries"). `messages`/`roots` are always empty.
pub fn parse_file_only(
    content: &[u8],
    file_name: &str,
    oracle: &dyn DefaultLevelOracle,
) -> Result<ParsedFile> {
    parse_impl(content, file_name, oracle, true)
}

fn parse_impl(
    content: &[u8],
    file_name: &str,
    oracle: &dyn DefaultLevelOracle,
    skip_messages: bool,
) -> Result<ParsedFile> {
    let text = std::str::from_utf8(content)
        .map_err(|e| ApiLevelError::ParseFailure(format!("invalid utf-8: {e}")))?;
    let comment_only_line = compute_comment_only_lines(text);

    let mut sc = Scanner::new(text, &comment_only_line);
    let raw = parse_file_scope(&mut sc, skip_messages)?;

    let file_effective = raw
        .file_explicit_level
        .unwrap_or_else(|| oracle.default_for(file_name));

    let mut effective = vec![APILevel::Unspecified; raw.messages.len()];
    for i in 0..raw.messages.len() {
        let parent = raw.messages[i].parent;
        let inherited = if raw.syntax.inherits_from_parent_message() {
            parent.map(|p| effective[p]).unwrap_or(file_effective)
        } else {
            file_effective
        };
        effective[i] = raw.messages[i].explicit_level.unwrap_or(inherited);
    }

    let messages = raw
        .messages
        .into_iter()
        .enumerate()
        .map(|(i, m)| MessageOpt {
            name: m.name,
            effective_api: effective[i],
            is_explicit: m.explicit_level.is_some(),
            api_info: m.api_info,
            loc_path: m.loc_path,
            parent: m.parent,
            children: m.children,
            is_map_entry: m.is_map_entry,
            body_open_brace: m.body_open_brace,
        })
        .collect();

    let file_opt = FileOpt {
        file_name: file_name.to_string(),
        package: raw.package,
        syntax: raw.syntax,
        effective_api: file_effective,
        is_explicit: raw.file_explicit_level.is_some(),
        api_info: raw.file_api_info,
        messages,
        roots: raw.roots,
        imports_features: raw.imports_features,
        features_import_range: raw.features_import_range,
    };

    Ok(ParsedFile {
        file_opt,
        anchors: raw.anchors,
    })
}

/// Mutable bookkeeping for one message node while its body is being parsed;
/// converted to [`MessageOpt`] once the oracle has resolved effective
/// levels (see `parse_impl`).
#[derive(Debug, Clone)]
struct RawMessage {
    name: String,
    explicit_level: Option<APILevel>,
    api_info: Option<APIInfo>,
    loc_path: Vec<i32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    is_map_entry: bool,
    body_open_brace: TextRange,
}

impl RawMessage {
    fn placeholder(loc_path: Vec<i32>, parent: Option<NodeId>) -> Self {
        RawMessage {
            name: String::new(),
            explicit_level: None,
            api_info: None,
            loc_path,
            parent,
            children: Vec::new(),
            is_map_entry: false,
            body_open_brace: TextRange::new(0, 0, 0, 0),
        }
    }
}

struct RawFile {
    package: String,
    syntax: Syntax,
    file_explicit_level: Option<APILevel>,
    file_api_info: Option<APIInfo>,
    messages: Vec<RawMessage>,
    roots: Vec<NodeId>,
    imports_features: bool,
    features_import_range: Option<TextRange>,
    anchors: InsertionAnchors,
}

fn parse_file_scope(sc: &mut Scanner, skip_messages: bool) -> Result<RawFile> {
    let mut package = String::new();
    let mut syntax = Syntax::Proto2;
    let mut file_explicit_level = None;
    let mut file_api_info = None;
    let mut messages: Vec<RawMessage> = Vec::new();
    let mut roots: Vec<NodeId> = Vec::new();
    let mut imports_features = false;
    let mut features_import_range = None;
    let mut anchors = InsertionAnchors::default();
    let mut file_option_idx: i32 = 0;
    let mut top_message_idx: i32 = 0;

    loop {
        sc.skip_ws_and_comments();
        if sc.eof() {
            break;
        }
        let kw_start = sc.pos();
        let word = match sc.consume_word() {
            Some((w, _)) => w,
            None => {
                // Stray punctuation at file scope; skip one char defensively
                // rather than looping forever.
                sc.bump();
                continue;
            }
        };

        match word.as_str() {
            "syntax" => {
                sc.expect_char('=')?;
                let (value, _) = sc.consume_quoted_string()?;
                let end = sc.expect_char(';')?.end_line;
                syntax = match value.as_str() {
                    "proto2" => Syntax::Proto2,
                    "proto3" => Syntax::Proto3,
                    other => {
                        return Err(ApiLevelError::ParseFailure(format!(
                            "unknown syntax: {other}"
                        )))
                    }
                };
                anchors.syntax_or_edition_line = Some(end);
            }
            "edition" => {
                sc.expect_char('=')?;
                let (_value, _) = sc.consume_quoted_string()?;
                let end = sc.expect_char(';')?.end_line;
                syntax = Syntax::Editions;
                anchors.syntax_or_edition_line = Some(end);
            }
            "package" => {
                let (name, _) = sc.consume_dotted_name()?;
                let end = sc.expect_char(';')?.end_line;
                package = name;
                anchors.package_line = Some(end);
            }
            "import" => {
                sc.skip_ws_and_comments();
                if matches!(sc.peek_word_str().as_deref(), Some("public") | Some("weak")) {
                    sc.consume_word();
                }
                let (dep, _) = sc.consume_quoted_string()?;
                let end_range = sc.expect_char(';')?;
                let stmt_range = TextRange::new(kw_start.0, kw_start.1, end_range.end_line, end_range.end_col);
                anchors.last_import_line = Some(stmt_range.end_line);
                if dep == FEATURES_IMPORT_PATH {
                    imports_features = true;
                    features_import_range = Some(stmt_range);
                }
            }
            "option" => {
                let (name_raw, value_raw, stmt_range) = sc.parse_option_statement(kw_start)?;
                anchors.last_file_option_line = Some(stmt_range.end_line);
                let normalized_name = normalize(&name_raw);
                if normalized_name == API_LEVEL_OPTION_NAME {
                    let level = APILevel::from_editions_ident(value_raw.trim())
                        .ok_or_else(|| {
                            ApiLevelError::ParseFailure(format!(
                                "unrecognized api_level identifier: {value_raw}"
                            ))
                        })?;
                    let has_leading_comment = sc.has_leading_comment(stmt_range.begin_line);
                    file_explicit_level = Some(level);
                    file_api_info = Some(APIInfo {
                        range: stmt_range,
                        has_leading_comment,
                        loc_path: vec![FILE_OPTIONS_FIELD, UNINTERPRETED_OPTION_FIELD, file_option_idx],
                    });
                }
                file_option_idx += 1;
            }
            "message" => {
                let (name_tok, _) = sc
                    .consume_word()
                    .ok_or_else(|| ApiLevelError::ParseFailure("expected message name".into()))?;
                if skip_messages {
                    sc.skip_statement_or_block()?;
                } else {
                    let msg_path = vec![MESSAGE_TYPE_FIELD, top_message_idx];
                    let id = parse_message(sc, &name_tok, msg_path, None, &mut messages)?;
                    if !messages[id].is_map_entry {
                        roots.push(id);
                    }
                }
                top_message_idx += 1;
            }
            _ => {
                sc.skip_statement_or_block()?;
            }
        }
    }

    Ok(RawFile {
        package,
        syntax,
        file_explicit_level,
        file_api_info,
        messages,
        roots,
        imports_features,
        features_import_range,
        anchors,
    })
}

/// Parse one `message Name { ... }` body, recursing into nested messages.
/// Returns the arena id assigned to this message (map-entry messages still
/// get an id so nested-message arena bookkeeping stays simple; callers
/// exclude them from `roots`/parent `children` instead, which is sufficient
/// to keep them out of every tree traversal).
fn parse_message(
    sc: &mut Scanner,
    local_name: &str,
    msg_path: Vec<i32>,
    parent: Option<NodeId>,
    messages: &mut Vec<RawMessage>,
) -> Result<NodeId> {
    let id = messages.len();
    messages.push(RawMessage::placeholder(msg_path.clone(), parent));

    let full_name = match parent {
        Some(p) => format!("{}.{}", messages[p].name, local_name),
        None => local_name.to_string(),
    };

    let body_open_brace = sc.expect_char('{')?;

    let mut explicit_level = None;
    let mut api_info = None;
    let mut is_map_entry = false;
    let mut option_idx: i32 = 0;
    let mut nested_idx: i32 = 0;
    let mut children: Vec<NodeId> = Vec::new();

    loop {
        sc.skip_ws_and_comments();
        match sc.peek() {
            None => return Err(ApiLevelError::ParseFailure(format!("unterminated message {full_name}"))),
            Some('}') => {
                sc.bump();
                break;
            }
            _ => {}
        }

        let kw_start = sc.pos();
        let word = match sc.consume_word() {
            Some((w, _)) => w,
            None => {
                sc.bump();
                continue;
            }
        };

        match word.as_str() {
            "option" => {
                let (name_raw, value_raw, stmt_range) = sc.parse_option_statement(kw_start)?;
                let normalized_name = normalize(&name_raw);
                if normalized_name == MAP_ENTRY_OPTION_NAME && value_raw.trim() == "true" {
                    is_map_entry = true;
                } else if normalized_name == API_LEVEL_OPTION_NAME {
                    let level = APILevel::from_editions_ident(value_raw.trim()).ok_or_else(|| {
                        ApiLevelError::ParseFailure(format!(
                            "unrecognized api_level identifier: {value_raw}"
                        ))
                    })?;
                    explicit_level = Some(level);
                    api_info = Some(APIInfo {
                        range: stmt_range,
                        has_leading_comment: sc.has_leading_comment(stmt_range.begin_line),
                        loc_path: {
                            let mut p = msg_path.clone();
                            p.push(MESSAGE_OPTIONS_FIELD);
                            p.push(UNINTERPRETED_OPTION_FIELD);
                            p.push(option_idx);
                            p
                        },
                    });
                } else if normalized_name == LEGACY_API_OPTION_NAME {
                    let quoted = strip_quotes(value_raw.trim());
                    let level = APILevel::from_legacy_ident(&quoted).ok_or_else(|| {
                        ApiLevelError::ParseFailure(format!(
                            "unrecognized go_api_flag value: {value_raw}"
                        ))
                    })?;
                    explicit_level = Some(level);
                    api_info = Some(APIInfo {
                        range: stmt_range,
                        has_leading_comment: sc.has_leading_comment(stmt_range.begin_line),
                        loc_path: {
                            let mut p = msg_path.clone();
                            p.push(MESSAGE_OPTIONS_FIELD);
                            p.push(UNINTERPRETED_OPTION_FIELD);
                            p.push(option_idx);
                            p
                        },
                    });
                }
                option_idx += 1;
            }
            "message" => {
                let (name_tok, _) = sc
                    .consume_word()
                    .ok_or_else(|| ApiLevelError::ParseFailure("expected message name".into()))?;
                let mut child_path = msg_path.clone();
                child_path.push(NESTED_TYPE_FIELD);
                child_path.push(nested_idx);
                let child_id = parse_message(sc, &name_tok, child_path, Some(id), messages)?;
                if !messages[child_id].is_map_entry {
                    children.push(child_id);
                }
                nested_idx += 1;
            }
            _ => {
                sc.skip_statement_or_block()?;
            }
        }
    }

    messages[id] = RawMessage {
        name: full_name,
        explicit_level,
        api_info,
        loc_path: msg_path,
        parent,
        children,
        is_map_entry,
        body_open_brace,
    };

    Ok(id)
}

fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && (s.starts_with('"') || s.starts_with('\'')) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Lines that consist entirely of a comment (after trimming whitespace),
/// used to detect a leading comment on the line immediately above a
/// declaration. Block comments are only recognized when they open and
/// close on the same line; a multi-line block comment is treated like code
/// (spec §9, open question 1 covers the symmetric EOL case; this is its
/// leading-side counterpart, and is a similarly deliberate simplification).
fn compute_comment_only_lines(text: &str) -> Vec<bool> {
    text.lines()
        .map(|line| {
            let t = line.trim();
            !t.is_empty()
                && (t.starts_with("//") || (t.starts_with("/*") && t.ends_with("*/") && t.len() >= 4))
        })
        .collect()
}

struct Scanner<'a> {
    chars: Vec<char>,
    idx: usize,
    line: u32,
    col: u32,
    comment_only_line: &'a [bool],
}

impl<'a> Scanner<'a> {
    fn new(text: &str, comment_only_line: &'a [bool]) -> Self {
        Scanner {
            chars: text.chars().collect(),
            idx: 0,
            line: 1,
            col: 0,
            comment_only_line,
        }
    }

    fn pos(&self) -> (u32, u32) {
        (self.line, self.col)
    }

    fn eof(&self) -> bool {
        self.idx >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    while !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        if self.bump().is_none() {
                            break;
                        }
                    }
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
    }

    /// True iff the line immediately above `line` (1-based) is a
    /// comment-only line (spec §3, `hasLeadingComment`).
    fn has_leading_comment(&self, line: u32) -> bool {
        if line < 2 {
            return false;
        }
        self.comment_only_line
            .get((line - 2) as usize)
            .copied()
            .unwrap_or(false)
    }

    fn consume_word(&mut self) -> Option<(String, TextRange)> {
        let (l, c) = self.pos();
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                s.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if s.is_empty() {
            None
        } else {
            let (el, ec) = self.pos();
            Some((s, TextRange::new(l, c, el, ec)))
        }
    }

    /// Non-consuming lookahead used to recognize `public`/`weak` after
    /// `import`.
    fn peek_word_str(&self) -> Option<String> {
        let mut idx = self.idx;
        let mut s = String::new();
        while let Some(&ch) = self.chars.get(idx) {
            if ch.is_alphanumeric() || ch == '_' {
                s.push(ch);
                idx += 1;
            } else {
                break;
            }
        }
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }

    fn consume_quoted_string(&mut self) -> Result<(String, TextRange)> {
        self.skip_ws_and_comments();
        let (l, c) = self.pos();
        let quote = self
            .peek()
            .ok_or_else(|| ApiLevelError::ParseFailure("expected string literal".into()))?;
        if quote != '"' && quote != '\'' {
            return Err(ApiLevelError::ParseFailure(format!(
                "expected string literal, found '{quote}'"
            )));
        }
        self.bump();
        let mut s = String::new();
        loop {
            match self.peek() {
                None => return Err(ApiLevelError::ParseFailure("unterminated string literal".into())),
                Some(ch) if ch == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    if let Some(escaped) = self.peek() {
                        s.push(escaped);
                        self.bump();
                    }
                }
                Some(ch) => {
                    s.push(ch);
                    self.bump();
                }
            }
        }
        let (el, ec) = self.pos();
        Ok((s, TextRange::new(l, c, el, ec)))
    }

    /// Same as [`Scanner::consume_quoted_string`] but keeps the surrounding
    /// quotes and escape sequences verbatim, for embedding raw option value
    /// text.
    fn consume_quoted_string_raw(&mut self) -> Result<String> {
        let quote = self
            .peek()
            .ok_or_else(|| ApiLevelError::ParseFailure("expected string literal".into()))?;
        let mut s = String::new();
        s.push(quote);
        self.bump();
        loop {
            match self.peek() {
                None => return Err(ApiLevelError::ParseFailure("unterminated string literal".into())),
                Some(ch) if ch == quote => {
                    s.push(ch);
                    self.bump();
                    break;
                }
                Some('\\') => {
                    s.push('\\');
                    self.bump();
                    if let Some(escaped) = self.peek() {
                        s.push(escaped);
                        self.bump();
                    }
                }
                Some(ch) => {
                    s.push(ch);
                    self.bump();
                }
            }
        }
        Ok(s)
    }

    fn consume_dotted_name(&mut self) -> Result<(String, TextRange)> {
        self.skip_ws_and_comments();
        let (l, c) = self.pos();
        let mut s = String::new();
        loop {
            self.skip_ws_and_comments();
            match self.peek() {
                Some(ch) if ch.is_alphanumeric() || ch == '_' => {
                    let (w, _) = self.consume_word().unwrap();
                    s.push_str(&w);
                }
                Some('.') => {
                    s.push('.');
                    self.bump();
                }
                _ => break,
            }
        }
        if s.is_empty() {
            return Err(ApiLevelError::ParseFailure("expected a dotted name".into()));
        }
        let (el, ec) = self.pos();
        Ok((s, TextRange::new(l, c, el, ec)))
    }

    fn expect_char(&mut self, expected: char) -> Result<TextRange> {
        self.skip_ws_and_comments();
        let (l, c) = self.pos();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                let (el, ec) = self.pos();
                Ok(TextRange::new(l, c, el, ec))
            }
            Some(other) => Err(ApiLevelError::ParseFailure(format!(
                "expected '{expected}', found '{other}' at {l}:{c}"
            ))),
            None => Err(ApiLevelError::ParseFailure(format!(
                "expected '{expected}', found eof"
            ))),
        }
    }

    /// Read raw source text (preserving string literals and `()`/`[]`/`{}`
    /// nesting verbatim) until one of `stops` is seen at depth 0. Leaves the
    /// scanner positioned at the stop character, not consuming it. Tracking
    /// `{}` matters for aggregate option values like `option (x) = { a: 1; };`,
    /// whose inner `;` must not be mistaken for the statement terminator.
    fn read_raw_until(&mut self, stops: &[char]) -> Result<String> {
        let mut depth: i32 = 0;
        let mut s = String::new();
        loop {
            match self.peek() {
                None => return Err(ApiLevelError::ParseFailure("unexpected eof".into())),
                Some(c) if depth == 0 && stops.contains(&c) => return Ok(s),
                Some('"') | Some('\'') => {
                    let lit = self.consume_quoted_string_raw()?;
                    s.push_str(&lit);
                }
                Some(c @ ('(' | '[' | '{')) => {
                    depth += 1;
                    s.push(c);
                    self.bump();
                }
                Some(c @ (')' | ']' | '}')) => {
                    depth -= 1;
                    s.push(c);
                    self.bump();
                }
                Some(c) => {
                    s.push(c);
                    self.bump();
                }
            }
        }
    }

    /// Parse `<name> = <value>;` starting right after the `option` keyword
    /// (whose start position is `kw_start`), returning the raw name text,
    /// raw value text, and the [`TextRange`] of the whole statement.
    fn parse_option_statement(&mut self, kw_start: (u32, u32)) -> Result<(String, String, TextRange)> {
        self.skip_ws_and_comments();
        let name_raw = self.read_raw_until(&['='])?;
        self.expect_char('=')?;
        self.skip_ws_and_comments();
        let value_raw = self.read_raw_until(&[';'])?;
        let end = self.expect_char(';')?;
        Ok((
            name_raw.trim().to_string(),
            value_raw.trim().to_string(),
            TextRange::new(kw_start.0, kw_start.1, end.end_line, end.end_col),
        ))
    }

    /// Skip a field/enum/service/oneof/extend/reserved/etc. declaration
    /// generically: consume up to a top-level `;`, or, if a top-level `{`
    /// is seen first, the whole balanced-brace block that follows (plus an
    /// optional trailing `;`).
    fn skip_statement_or_block(&mut self) -> Result<()> {
        let mut depth: i32 = 0;
        loop {
            match self.peek() {
                None => return Err(ApiLevelError::ParseFailure("unexpected eof while skipping".into())),
                Some('"') | Some('\'') => {
                    self.consume_quoted_string_raw()?;
                }
                Some(c @ ('{' | '(' | '[')) => {
                    let _ = c;
                    depth += 1;
                    self.bump();
                }
                Some(c @ ('}' | ')' | ']')) => {
                    let _ = c;
                    if depth == 0 {
                        // Unbalanced input; let the caller (one level up)
                        // see this closer.
                        return Ok(());
                    }
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        self.skip_ws_and_comments();
                        if self.peek() == Some(';') {
                            self.bump();
                        }
                        return Ok(());
                    }
                }
                Some(';') if depth == 0 => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }
}

/// Byte offset of the start of 1-based `line` in `bytes`, or `bytes.len()`
/// if `line` is past the last line (used by the insertion heuristic to
/// place a new line at end-of-file).
pub fn line_start_byte_offset(bytes: &[u8], line: u32) -> usize {
    if line <= 1 {
        return 0;
    }
    let mut seen = 1u32;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            seen += 1;
            if seen == line {
                return i + 1;
            }
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::TestDefaultOracle;

    fn oracle(default: APILevel) -> TestDefaultOracle {
        TestDefaultOracle::new(default)
    }

    #[test]
    fn parses_editions_file_with_no_explicit_option() {
        let src = b"edition = \"2023\";\npackage pkg;\nmessage M {}\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Opaque)).unwrap();
        let fo = parsed.file_opt;
        assert_eq!(fo.syntax, Syntax::Editions);
        assert_eq!(fo.package, "pkg");
        assert!(!fo.is_explicit);
        assert_eq!(fo.effective_api, APILevel::Opaque);
        assert_eq!(fo.roots.len(), 1);
        assert_eq!(fo.messages[fo.roots[0]].name, "M");
        assert_eq!(fo.messages[fo.roots[0]].effective_api, APILevel::Opaque);
    }

    #[test]
    fn parses_explicit_file_option() {
        let src = b"edition = \"2023\";\noption features.(pb.go).api_level = API_HYBRID;\npackage pkg;\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Opaque)).unwrap();
        let fo = parsed.file_opt;
        assert!(fo.is_explicit);
        assert_eq!(fo.effective_api, APILevel::Hybrid);
        assert!(fo.api_info.is_some());
        assert_eq!(
            fo.api_info.as_ref().unwrap().loc_path,
            vec![FILE_OPTIONS_FIELD, UNINTERPRETED_OPTION_FIELD, 0]
        );
    }

    #[test]
    fn detects_leading_comment() {
        let src = b"edition = \"2023\";\n// keep at hybrid\noption features.(pb.go).api_level = API_HYBRID;\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Opaque)).unwrap();
        assert!(parsed.file_opt.api_info.unwrap().has_leading_comment);
    }

    #[test]
    fn nested_messages_inherit_in_editions() {
        let src = b"edition = \"2023\";\nmessage A {\n  option features.(pb.go).api_level = API_HYBRID;\n  message A1 {\n    message A2 {}\n  }\n}\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Opaque)).unwrap();
        let fo = parsed.file_opt;
        let a = fo.find_by_name("A").unwrap();
        let a1 = fo.find_by_name("A.A1").unwrap();
        let a2 = fo.find_by_name("A.A1.A2").unwrap();
        assert_eq!(fo.messages[a].effective_api, APILevel::Hybrid);
        assert_eq!(fo.messages[a1].effective_api, APILevel::Hybrid);
        assert_eq!(fo.messages[a2].effective_api, APILevel::Hybrid);
    }

    #[test]
    fn proto3_messages_inherit_from_file_not_parent() {
        let src = b"syntax = \"proto3\";\noption features.(pb.go).api_level = API_HYBRID;\nmessage A {\n  message A1 {}\n}\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        let fo = parsed.file_opt;
        let a1 = fo.find_by_name("A.A1").unwrap();
        assert_eq!(fo.messages[a1].effective_api, APILevel::Hybrid);
    }

    #[test]
    fn map_entry_message_excluded_from_tree() {
        let src = b"edition = \"2023\";\nmessage Outer {\n  message MapFieldEntry {\n    option map_entry = true;\n  }\n}\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        let fo = parsed.file_opt;
        let outer = fo.find_by_name("Outer").unwrap();
        assert!(fo.messages[outer].children.is_empty());
        assert!(fo.find_by_name("Outer.MapFieldEntry").is_none());
    }

    #[test]
    fn legacy_message_option_parses() {
        let src = b"syntax = \"proto2\";\nmessage A {\n  option go_api_flag = \"OPEN_TO_OPAQUE_HYBRID\";\n}\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        let fo = parsed.file_opt;
        let a = fo.find_by_name("A").unwrap();
        assert!(fo.messages[a].is_explicit);
        assert_eq!(fo.messages[a].effective_api, APILevel::Hybrid);
    }

    #[test]
    fn tracks_insertion_anchors() {
        let src = b"syntax = \"proto3\";\npackage pkg;\nimport \"a.proto\";\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        assert_eq!(parsed.anchors.syntax_or_edition_line, Some(1));
        assert_eq!(parsed.anchors.package_line, Some(2));
        assert_eq!(parsed.anchors.last_import_line, Some(3));
    }

    #[test]
    fn features_import_detected() {
        let src = b"edition = \"2023\";\nimport \"google/protobuf/go_features.proto\";\noption features.(pb.go).api_level = API_OPAQUE;\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        assert!(parsed.file_opt.imports_features);
        assert!(parsed.file_opt.features_import_range.is_some());
    }

    #[test]
    fn skip_messages_mode_leaves_tree_empty() {
        let src = b"edition = \"2023\";\nmessage A { message B {} }\n";
        let parsed = parse_file_only(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        assert!(parsed.file_opt.messages.is_empty());
        assert!(parsed.file_opt.roots.is_empty());
    }

    #[test]
    fn skips_unrelated_constructs() {
        let src = b"syntax = \"proto3\";\nenum E { A = 0; B = 1; }\nmessage M {\n  int32 x = 1;\n  repeated string y = 2 [deprecated = true];\n}\nservice S { rpc Foo(M) returns (M); }\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        let fo = parsed.file_opt;
        assert_eq!(fo.roots.len(), 1);
        assert_eq!(fo.messages[fo.roots[0]].name, "M");
    }

    #[test]
    fn aggregate_option_value_does_not_truncate_on_inner_semicolon() {
        let src = b"edition = \"2023\";\noption (custom.opt) = { sub: 1; };\noption features.(pb.go).api_level = API_HYBRID;\nmessage M {}\n";
        let parsed = parse(src, "f.proto", &oracle(APILevel::Open)).unwrap();
        let fo = parsed.file_opt;
        assert!(fo.is_explicit);
        assert_eq!(fo.effective_api, APILevel::Hybrid);
    }
}
