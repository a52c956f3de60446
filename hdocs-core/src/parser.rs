//! Tree-sitter parsing with strict syntax error detection
//!
//! Tree-sitter recovers from almost any input, so "unparsable" has to be
//! decided here. In strict mode an `ERROR` or `MISSING` node fails the file
//! unless it comes from constructs tree-sitter cannot see through without a
//! preprocessor: braces split across `#ifdef` branches, directives inside a
//! recovered region, and annotation macros in front of a declaration.

use crate::constants::{ANNOTATED_KINDS, PREPROC_CONDITIONAL_KINDS};
use crate::{Error, Result, SourceLanguage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// A parsed source file
pub struct ParsedSource {
    pub path: PathBuf,
    pub language: SourceLanguage,
    pub source: String,
    /// Original bytes when the file was not valid UTF-8
    pub raw: Option<RawSource>,
    pub tree: Tree,
}

impl std::fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedSource")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("bytes", &self.source.len())
            .field("lossy", &self.raw.is_some())
            .finish_non_exhaustive()
    }
}

/// Bytes of a file that was not valid UTF-8
///
/// Rewrites go through this so that bytes outside the edited ranges are
/// written back unchanged instead of as U+FFFD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSource {
    bytes: Vec<u8>,
    /// (decoded, original) offsets just after each replaced sequence
    shifts: Vec<(usize, usize)>,
}

impl RawSource {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Map an offset in the decoded text to the same position in the original bytes
    ///
    /// Offsets inside a replacement character have no exact counterpart.
    pub fn original_offset(&self, decoded: usize) -> usize {
        let index = self.shifts.partition_point(|&(d, _)| d <= decoded);
        match index.checked_sub(1).map(|i| self.shifts[i]) {
            Some((d, original)) => original + (decoded - d),
            None => decoded,
        }
    }
}

/// Decode like `String::from_utf8_lossy`, keeping the bytes when anything was replaced
pub fn decode_lossy(bytes: Vec<u8>) -> (String, Option<RawSource>) {
    let bytes = match String::from_utf8(bytes) {
        Ok(text) => return (text, None),
        Err(e) => e.into_bytes(),
    };

    let mut text = String::with_capacity(bytes.len() + 16);
    let mut shifts = Vec::new();
    let mut consumed = 0;
    let mut rest = &bytes[..];

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, invalid) = rest.split_at(e.valid_up_to());
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                text.push(char::REPLACEMENT_CHARACTER);

                let skipped = e.error_len().unwrap_or(invalid.len());
                consumed += valid.len() + skipped;
                shifts.push((text.len(), consumed));
                rest = &invalid[skipped..];
            }
        }
    }

    (text, Some(RawSource { bytes, shifts }))
}

/// Parser holding one tree-sitter parser per language
pub struct SourceParser {
    parsers: HashMap<SourceLanguage, Parser>,
    strict: bool,
}

impl SourceParser {
    /// Create a parser with C and C++ grammars loaded
    pub fn new(strict: bool) -> Result<Self> {
        let mut parsers = HashMap::new();

        for lang in [SourceLanguage::C, SourceLanguage::Cpp] {
            let mut parser = Parser::new();
            parser
                .set_language(lang.tree_sitter_language())
                .map_err(|e| Error::Language(format!("Failed to set language for {}: {}", lang, e)))?;
            parsers.insert(lang, parser);
        }

        Ok(Self { parsers, strict })
    }

    /// Read and parse a file
    ///
    /// Invalid UTF-8 is replaced rather than rejected; the original bytes are
    /// kept in [`ParsedSource::raw`].
    pub fn parse_file(&mut self, path: &Path, language: Option<SourceLanguage>) -> Result<ParsedSource> {
        let language = language
            .or_else(|| SourceLanguage::from_path(path))
            .ok_or_else(|| Error::UnsupportedLanguage(path.to_path_buf()))?;

        let bytes = std::fs::read(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("Failed to read {}: {}", path.display(), e))
        })?;
        let (source, raw) = decode_lossy(bytes);
        if raw.is_some() {
            tracing::warn!("{} is not valid UTF-8, invalid bytes are shown as U+FFFD", path.display());
        }

        let mut parsed = self.parse_source(path, source, language)?;
        parsed.raw = raw;
        Ok(parsed)
    }

    /// Parse source text that was already loaded
    pub fn parse_source(
        &mut self,
        path: &Path,
        source: String,
        language: SourceLanguage,
    ) -> Result<ParsedSource> {
        let parser = self
            .parsers
            .get_mut(&language)
            .ok_or_else(|| Error::Language(format!("No parser available for {}", language)))?;

        let tree = parser.parse(&source, None).ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            message: "parser produced no syntax tree".to_string(),
        })?;

        let errors = syntax_errors(tree.root_node());
        let blocking = errors
            .iter()
            .find(|node| !self.strict || !is_tolerated(**node, &source));

        if let Some(&node) = blocking {
            let position = node.start_position();
            let message = describe_syntax_error(node, &source);

            if self.strict {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    line: position.row + 1,
                    column: position.column + 1,
                    message,
                });
            }
            tracing::warn!(
                "{}:{}:{}: {} (continuing in lenient mode)",
                path.display(),
                position.row + 1,
                position.column + 1,
                message
            );
        } else if !errors.is_empty() {
            tracing::debug!(
                "{}: {} recovered syntax errors around preprocessor constructs",
                path.display(),
                errors.len()
            );
        }

        tracing::debug!("Parsed {} as {} ({} bytes)", path.display(), language, source.len());

        Ok(ParsedSource {
            path: path.to_path_buf(),
            language,
            source,
            raw: None,
            tree,
        })
    }
}

/// Every `ERROR` and `MISSING` node in document order; errors inside an
/// `ERROR` node are not listed separately
pub fn syntax_errors(root: Node<'_>) -> Vec<Node<'_>> {
    let mut errors = Vec::new();
    if !root.has_error() {
        return errors;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            errors.push(node);
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node
            .children(&mut cursor)
            .filter(|child| child.has_error() || child.is_missing())
            .collect();
        stack.extend(children.into_iter().rev());
    }
    errors
}

/// Whether a syntax error is an artefact of unexpanded preprocessor use
fn is_tolerated(node: Node<'_>, source: &str) -> bool {
    in_conditional_region(node)
        || (node.is_missing() && node.kind().starts_with('#'))
        || (node.is_error() && spans_directive(node, source))
        || (node.is_error() && is_annotation_word(node, source))
}

fn in_conditional_region(node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if PREPROC_CONDITIONAL_KINDS.contains(&parent.kind()) {
            return true;
        }
        current = parent.parent();
    }
    false
}

fn spans_directive(node: Node<'_>, source: &str) -> bool {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .lines()
        .any(|line| line.trim_start().starts_with('#'))
}

/// A run of words on one line right before or inside a declaration
fn is_annotation_word(node: Node<'_>, source: &str) -> bool {
    let text = source.get(node.start_byte()..node.end_byte()).unwrap_or("").trim();
    let words_only = !text.is_empty()
        && !text.contains('\n')
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace());
    if !words_only {
        return false;
    }

    [node.parent(), node.next_named_sibling()]
        .into_iter()
        .flatten()
        .any(|n| ANNOTATED_KINDS.contains(&n.kind()))
}

fn describe_syntax_error(node: Node<'_>, source: &str) -> String {
    if node.is_missing() {
        return format!("missing `{}`", node.kind());
    }

    let text = source.get(node.start_byte()..node.end_byte()).unwrap_or("");
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        "syntax error".to_string()
    } else {
        let shown: String = first_line.chars().take(40).collect();
        format!("syntax error near `{}`", shown)
    }
}
