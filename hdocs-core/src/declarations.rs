//! Declaration extraction driven by tree-sitter queries
//!
//! The bundled `declarations.scm` queries over-approximate: they capture every
//! function, declaration, type body, typedef and macro. This module then keeps
//! the ones that sit directly in a documentable scope, classifies them and
//! decides whether a documentation comment is already attached.

use crate::constants::{is_std_type, ANCHOR_WRAPPER_KINDS, MEMBER_SCOPE_KIND, SCOPE_KINDS};
use crate::{DeclKind, Declaration, Error, ParsedSource, Result, SourceLanguage};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tree_sitter::{Node, Query, QueryCursor};

const C_DECLARATIONS_QUERY: &str = include_str!("../queries/c/declarations.scm");
const CPP_DECLARATIONS_QUERY: &str = include_str!("../queries/cpp/declarations.scm");

/// Which comments count as existing documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocCommentStyle {
    /// Any comment directly above the declaration
    #[default]
    Any,
    /// Only `/** */`, `/*! */`, `///` and `//!` comments
    Doxygen,
}

/// Configuration for parsing and extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fail on any syntax error instead of working on a recovered tree
    pub strict_parse: bool,
    /// Force a language instead of detecting it from the extension
    pub language: Option<SourceLanguage>,
    pub doc_comment_style: DocCommentStyle,
    /// Never report standard type aliases such as `size_t`
    pub skip_std_types: bool,
    /// Maximum lines of a declaration sent as the snippet
    pub max_snippet_lines: usize,
    /// Maximum lines of each related definition sent as context
    pub context_lines: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strict_parse: true,
            language: None,
            doc_comment_style: DocCommentStyle::Any,
            skip_std_types: true,
            max_snippet_lines: 40,
            context_lines: 5,
        }
    }
}

/// Extracts documentable declarations from parsed sources
pub struct DeclarationExtractor {
    queries: HashMap<SourceLanguage, Query>,
    config: ExtractionConfig,
}

impl DeclarationExtractor {
    /// Compile the bundled queries for every language
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let mut queries = HashMap::new();

        for (lang, source) in [
            (SourceLanguage::C, C_DECLARATIONS_QUERY),
            (SourceLanguage::Cpp, CPP_DECLARATIONS_QUERY),
        ] {
            let query = Query::new(lang.tree_sitter_language(), source).map_err(|e| {
                Error::Query(format!("Failed to compile {} declarations query: {}", lang, e))
            })?;
            queries.insert(lang, query);
        }

        Ok(Self { queries, config })
    }

    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract declarations in source order
    pub fn extract(&self, parsed: &ParsedSource) -> Result<Vec<Declaration>> {
        let query = self
            .queries
            .get(&parsed.language)
            .ok_or_else(|| Error::Query(format!("No declarations query for {}", parsed.language)))?;

        let mut cursor = QueryCursor::new();
        // Set reasonable limits to prevent runaway matching on huge files
        cursor.set_match_limit(5000);

        let mut seen = HashSet::new();
        let mut declarations = Vec::new();

        for m in cursor.matches(query, parsed.tree.root_node(), parsed.source.as_bytes()) {
            for capture in m.captures {
                if !seen.insert(capture.node.id()) {
                    continue;
                }
                let capture_name = &query.capture_names()[capture.index as usize];
                if let Some(declaration) = self.build_declaration(capture_name, capture.node, parsed) {
                    declarations.push(declaration);
                }
            }
        }

        declarations.sort_by_key(|d| d.start_byte);
        tracing::debug!(
            "Extracted {} declarations from {}",
            declarations.len(),
            parsed.path.display()
        );
        Ok(declarations)
    }

    fn build_declaration(&self, capture_name: &str, node: Node<'_>, parsed: &ParsedSource) -> Option<Declaration> {
        let source = parsed.source.as_str();
        let anchor = anchor_of(node);
        if !in_documentable_scope(anchor, parsed.language) {
            return None;
        }

        let (kind, raw_name, is_definition) = match capture_name {
            "definition.function" => {
                let declarator = node.child_by_field_name("declarator")?;
                let name = declarator_name(declarator, source)?;
                (callable_kind(anchor, &name), name, true)
            }
            "declaration" => classify_declaration(node, anchor, source, false)?,
            "declaration.member" => classify_declaration(node, anchor, source, true)?,
            "definition.type" => {
                let name = node.child_by_field_name("name")?;
                (specifier_kind(node.kind())?, node_text(name, source).to_string(), true)
            }
            "definition.typedef" => {
                let name = if node.kind() == "alias_declaration" {
                    node_text(node.child_by_field_name("name")?, source).to_string()
                } else {
                    declarator_name(node.child_by_field_name("declarator")?, source)?
                };
                (DeclKind::Typedef, name, true)
            }
            "definition.macro" => {
                if is_include_guard(node, source) {
                    return None;
                }
                let name = node_text(node.child_by_field_name("name")?, source).to_string();
                (DeclKind::Macro, name, node.child_by_field_name("value").is_some())
            }
            _ => return None,
        };

        let qualified_tail: String = raw_name.split_whitespace().collect();
        let name = qualified_tail
            .rsplit("::")
            .next()
            .unwrap_or(qualified_tail.as_str())
            .to_string();
        if name.is_empty() || (self.config.skip_std_types && is_std_type(&name)) {
            return None;
        }

        let scope = scope_prefix(anchor, source);
        let qualified_name = if scope.is_empty() {
            qualified_tail
        } else {
            format!("{}::{}", scope, qualified_tail)
        };

        let doc_comment_start = self.doc_comment_start(anchor, source);
        let start = anchor.start_position();
        let start_byte = anchor.start_byte();
        let line_start_byte = start_byte.saturating_sub(start.column);
        let indent: String = source
            .get(line_start_byte..)
            .unwrap_or("")
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();

        Some(Declaration {
            name,
            qualified_name,
            kind,
            language: parsed.language,
            file: parsed.path.clone(),
            line: start.row + 1,
            column: start.column + 1,
            start_byte,
            end_byte: anchor.end_byte(),
            line_start_byte,
            indent,
            text: node_text(anchor, source).trim_end().to_string(),
            is_definition,
            documented: doc_comment_start.is_some(),
            doc_comment_start,
        })
    }

    /// Start of the line holding the documentation comment attached to `anchor`
    ///
    /// A comment is attached when it sits on the line right above the anchor
    /// (or on the same line) and does not trail the previous item. Runs of
    /// comments on consecutive lines, such as `///` blocks, are one comment.
    fn doc_comment_start(&self, anchor: Node<'_>, source: &str) -> Option<usize> {
        let comment = anchor.prev_named_sibling()?;
        if comment.kind() != "comment" || comment.end_position().row + 1 < anchor.start_position().row {
            return None;
        }
        if trails_previous_item(comment) {
            return None;
        }
        if self.config.doc_comment_style == DocCommentStyle::Doxygen
            && !is_doxygen_comment(node_text(comment, source))
        {
            return None;
        }

        let mut first = comment;
        while let Some(previous) = first.prev_named_sibling() {
            if previous.kind() != "comment"
                || last_row(previous) + 1 != first.start_position().row
                || trails_previous_item(previous)
            {
                break;
            }
            first = previous;
        }

        Some(first.start_byte() - first.start_position().column)
    }
}

/// A comment written after code on the same line
fn trails_previous_item(comment: Node<'_>) -> bool {
    comment
        .prev_sibling()
        .is_some_and(|before| last_row(before) == comment.start_position().row)
}

/// Returns true for `/** */`, `/*! */`, `///` and `//!` comments
pub fn is_doxygen_comment(text: &str) -> bool {
    (text.starts_with("/**") && !text.starts_with("/**/"))
        || text.starts_with("/*!")
        || text.starts_with("///")
        || text.starts_with("//!")
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Last row holding text of the node; preprocessor directives end after their newline
fn last_row(node: Node<'_>) -> usize {
    let start = node.start_position();
    let end = node.end_position();
    if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    }
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    node.named_child_count()
        .checked_sub(1)
        .and_then(|i| node.named_child(i))
}

/// Lift a node through `template<...>` and `extern "C"` wrappers
fn anchor_of(node: Node<'_>) -> Node<'_> {
    let mut anchor = node;
    while let Some(parent) = anchor.parent() {
        if ANCHOR_WRAPPER_KINDS.contains(&parent.kind()) {
            anchor = parent;
        } else {
            break;
        }
    }
    anchor
}

fn in_documentable_scope(anchor: Node<'_>, language: SourceLanguage) -> bool {
    anchor.parent().is_some_and(|parent| {
        SCOPE_KINDS.contains(&parent.kind())
            || (language == SourceLanguage::Cpp && parent.kind() == MEMBER_SCOPE_KIND)
    })
}

fn in_class_body(anchor: Node<'_>) -> bool {
    anchor.parent().is_some_and(|p| p.kind() == MEMBER_SCOPE_KIND)
}

fn callable_kind(anchor: Node<'_>, name: &str) -> DeclKind {
    if in_class_body(anchor) || name.contains("::") {
        DeclKind::Method
    } else {
        DeclKind::Function
    }
}

fn specifier_kind(kind: &str) -> Option<DeclKind> {
    match kind {
        "struct_specifier" => Some(DeclKind::Struct),
        "union_specifier" => Some(DeclKind::Union),
        "enum_specifier" => Some(DeclKind::Enum),
        "class_specifier" => Some(DeclKind::Class),
        _ => None,
    }
}

/// Prototypes become functions or methods; a declaration that defines a named
/// type body becomes that type. Variables and data members are skipped.
fn classify_declaration(
    node: Node<'_>,
    anchor: Node<'_>,
    source: &str,
    member: bool,
) -> Option<(DeclKind, String, bool)> {
    if let Some(function) = node
        .child_by_field_name("declarator")
        .and_then(function_declarator_of)
    {
        let name = declarator_name(function.child_by_field_name("declarator")?, source)?;
        let kind = if member {
            DeclKind::Method
        } else {
            callable_kind(anchor, &name)
        };
        return Some((kind, name, false));
    }

    if member {
        return None;
    }

    let ty = node.child_by_field_name("type")?;
    let kind = specifier_kind(ty.kind())?;
    ty.child_by_field_name("body")?;
    let name = ty.child_by_field_name("name")?;
    Some((kind, node_text(name, source).to_string(), true))
}

/// Follow pointer and reference declarators to a function declarator.
/// Function pointers (`int (*fp)(int)`) do not count.
fn function_declarator_of(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        match current.kind() {
            "function_declarator" => {
                let inner = current.child_by_field_name("declarator")?;
                return (inner.kind() != "parenthesized_declarator").then_some(current);
            }
            "pointer_declarator" | "reference_declarator" | "attributed_declarator" => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| last_named_child(current))?;
            }
            _ => return None,
        }
    }
}

/// Name introduced by a declarator chain
fn declarator_name(node: Node<'_>, source: &str) -> Option<String> {
    let mut current = node;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "primitive_type"
            | "qualified_identifier" | "destructor_name" | "operator_name"
            | "template_function" => return Some(node_text(current, source).to_string()),
            _ => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| last_named_child(current))?;
            }
        }
    }
}

/// `#define FOO_H` directly inside `#ifndef FOO_H`
fn is_include_guard(node: Node<'_>, source: &str) -> bool {
    if node.kind() != "preproc_def" || node.child_by_field_name("value").is_some() {
        return false;
    }
    let Some(parent) = node.parent() else {
        return false;
    };
    if parent.kind() != "preproc_ifdef" {
        return false;
    }
    match (node.child_by_field_name("name"), parent.child_by_field_name("name")) {
        (Some(defined), Some(tested)) => node_text(defined, source) == node_text(tested, source),
        _ => false,
    }
}

/// Enclosing named namespaces and classes, outermost first
fn scope_prefix(anchor: Node<'_>, source: &str) -> String {
    let mut parts = Vec::new();
    let mut current = anchor.parent();

    while let Some(node) = current {
        match node.kind() {
            "namespace_definition" | "class_specifier" | "struct_specifier" | "union_specifier" => {
                if let Some(name) = node.child_by_field_name("name") {
                    parts.push(node_text(name, source).split_whitespace().collect::<String>());
                }
            }
            _ => {}
        }
        current = node.parent();
    }

    parts.reverse();
    parts.join("::")
}
