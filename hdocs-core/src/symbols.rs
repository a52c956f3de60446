//! Cross-file symbol table and prompt context
//!
//! Every declaration from every input is registered so that a prompt for one
//! declaration can carry the definitions of the types, enums and macros its
//! code mentions.

use crate::Declaration;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap();
}

/// Symbols of all analysed files
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    declarations: Vec<Declaration>,
    by_qualified: HashMap<String, usize>,
    /// Unqualified names of context-providing kinds
    by_name: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from declarations in order; the first definition of a name wins
    pub fn from_declarations<'a, I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = &'a Declaration>,
    {
        let mut table = Self::new();
        for declaration in declarations {
            table.insert(declaration.clone());
        }
        table
    }

    pub fn insert(&mut self, declaration: Declaration) {
        let index = self.declarations.len();
        if self.by_qualified.contains_key(&declaration.qualified_name) {
            return;
        }
        self.by_qualified.insert(declaration.qualified_name.clone(), index);
        if declaration.kind.provides_context() {
            self.by_name.entry(declaration.name.clone()).or_insert(index);
        }
        self.declarations.push(declaration);
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Definitions of the types, enums, typedefs and macros mentioned in the
    /// declaration's snippet, in order of first mention
    pub fn context_for(&self, declaration: &Declaration, snippet: &str, context_lines: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut context = Vec::new();

        for token in IDENTIFIER.find_iter(snippet).map(|m| m.as_str()) {
            if token == declaration.name || !seen.insert(token) {
                continue;
            }
            let Some(&index) = self.by_name.get(token) else {
                continue;
            };
            let related = &self.declarations[index];
            if related.qualified_name == declaration.qualified_name {
                continue;
            }
            context.push(truncate_lines(&related.text, context_lines));
        }

        context
    }
}

/// Declaration text limited to `max_lines` lines
pub fn snippet_of(declaration: &Declaration, max_lines: usize) -> String {
    truncate_lines(&declaration.text, max_lines)
}

/// Keep the first `max_lines` lines, marking the cut
pub fn truncate_lines(text: &str, max_lines: usize) -> String {
    let total = text.lines().count();
    if total <= max_lines {
        return text.to_string();
    }

    let mut kept: Vec<&str> = text.lines().take(max_lines).collect();
    let marker = format!("/* ... {} more lines ... */", total - max_lines);
    kept.push(&marker);
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeclKind, SourceLanguage};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn decl(name: &str, qualified: &str, kind: DeclKind, text: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            qualified_name: qualified.to_string(),
            kind,
            language: SourceLanguage::C,
            file: PathBuf::from("lib.h"),
            line: 1,
            column: 1,
            start_byte: 0,
            end_byte: text.len(),
            line_start_byte: 0,
            indent: String::new(),
            text: text.to_string(),
            is_definition: true,
            documented: false,
            doc_comment_start: None,
        }
    }

    fn table() -> SymbolTable {
        let decls = vec![
            decl("MAX_ITEMS", "MAX_ITEMS", DeclKind::Macro, "#define MAX_ITEMS 64"),
            decl("item_t", "item_t", DeclKind::Typedef, "typedef struct item {\n  int id;\n  int weight;\n} item_t;"),
            decl("color", "color", DeclKind::Enum, "enum color { RED, GREEN }"),
            decl("helper", "helper", DeclKind::Function, "int helper(void) { return 1; }"),
        ];
        SymbolTable::from_declarations(&decls)
    }

    #[test]
    fn test_context_collects_referenced_definitions_in_order() {
        let table = table();
        let target = decl("fill", "fill", DeclKind::Function, "");
        let snippet = "void fill(item_t items[MAX_ITEMS]) { helper(); item_t x; }";

        let context = table.context_for(&target, snippet, 5);
        assert_eq!(context.len(), 2);
        assert!(context[0].starts_with("typedef struct item"));
        assert_eq!(context[1], "#define MAX_ITEMS 64");
    }

    #[test]
    fn test_context_truncates_definitions() {
        let table = table();
        let target = decl("use", "use", DeclKind::Function, "");
        let context = table.context_for(&target, "item_t value;", 2);
        assert_eq!(context[0], "typedef struct item {\n  int id;\n/* ... 2 more lines ... */");
    }

    #[test]
    fn test_context_skips_self() {
        let table = table();
        let target = decl("item_t", "item_t", DeclKind::Typedef, "typedef struct item { int id; } item_t;");
        assert!(table.context_for(&target, &target.text, 5).is_empty());
    }

    #[test]
    fn test_first_registration_wins() {
        let mut table = table();
        table.insert(decl("MAX_ITEMS", "MAX_ITEMS", DeclKind::Macro, "#define MAX_ITEMS 128"));
        assert_eq!(table.len(), 4);

        let target = decl("fill", "fill", DeclKind::Function, "");
        assert_eq!(table.context_for(&target, "MAX_ITEMS", 5), vec!["#define MAX_ITEMS 64"]);
    }

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_limit(lines in 0usize..50, limit in 1usize..20) {
            let text = (0..lines).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
            let out = truncate_lines(&text, limit);
            prop_assert!(out.lines().count() <= limit + 1);
            if lines <= limit {
                prop_assert_eq!(out, text);
            }
        }
    }
}
