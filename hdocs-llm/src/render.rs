//! Rendering generated documentation as text, comments, HTML or JSON

use crate::generator::GeneratedDoc;
use crate::prompt::PromptStyle;
use crate::LlmResult;
use hdocs_core::{DeclKind, RawSource, SourceLanguage};
use serde::Serialize;
use std::path::Path;

/// Wrap documentation text in a `/** ... */` block at the given indentation
///
/// `*/` inside the text is escaped so the block cannot end early.
pub fn format_doc_comment(text: &str, indent: &str, disclaimer: Option<&str>) -> String {
    let mut out = format!("{}/**\n", indent);

    let mut push_line = |line: &str| {
        let line = line.trim_end().replace("*/", "*\\/");
        if line.is_empty() {
            out.push_str(&format!("{} *\n", indent));
        } else {
            out.push_str(&format!("{} * {}\n", indent, line));
        }
    };

    for line in text.lines() {
        push_line(line);
    }
    if let Some(disclaimer) = disclaimer.filter(|d| !d.trim().is_empty()) {
        push_line("");
        push_line(disclaimer);
    }

    out.push_str(&format!("{} */\n", indent));
    out
}

/// Replacement of `start..end` in a decoded source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Edits placing a comment above each documented declaration of `path`
///
/// A declaration that already had a comment gets it replaced, so regenerated
/// docs never stack. Edits come back last first, ready to apply in order.
pub fn comment_edits(source: &str, path: &Path, docs: &[GeneratedDoc], disclaimer: Option<&str>) -> Vec<SourceEdit> {
    let mut edits: Vec<SourceEdit> = Vec::new();

    for doc in docs.iter().filter(|doc| doc.declaration.file == path) {
        let declaration = &doc.declaration;
        let comment = format_doc_comment(&doc.text, &declaration.indent, disclaimer);
        let edit = match declaration.doc_comment_start {
            Some(start) => SourceEdit {
                start,
                end: declaration.start_byte,
                text: comment + &declaration.indent,
            },
            None => SourceEdit {
                start: declaration.line_start_byte,
                end: declaration.line_start_byte,
                text: comment,
            },
        };

        let valid = edit.start <= edit.end
            && edit.end <= source.len()
            && source.is_char_boundary(edit.start)
            && source.is_char_boundary(edit.end);
        if !valid {
            log::warn!(
                "Cannot place documentation for {} at bytes {}..{}, skipping",
                declaration.qualified_name,
                edit.start,
                edit.end
            );
            continue;
        }
        edits.push(edit);
    }

    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    // Declarations sharing a line share its comment; only one of them rewrites it.
    let mut kept: Vec<SourceEdit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if kept.last().is_some_and(|next| edit.end > next.start) {
            log::warn!("Overlapping documentation at bytes {}..{}, skipping", edit.start, edit.end);
            continue;
        }
        kept.push(edit);
    }
    kept
}

/// `source` with a comment above each documented declaration of `path`
pub fn insert_comments(source: &str, path: &Path, docs: &[GeneratedDoc], disclaimer: Option<&str>) -> String {
    let mut output = source.to_string();
    for edit in comment_edits(source, path, docs, disclaimer) {
        output.replace_range(edit.start..edit.end, &edit.text);
    }
    output
}

/// Apply edits made against the decoded text to the original bytes
pub fn apply_edits_to_raw(raw: &RawSource, edits: &[SourceEdit]) -> Vec<u8> {
    let mut output = raw.bytes().to_vec();
    for edit in edits {
        let start = raw.original_offset(edit.start);
        let end = raw.original_offset(edit.end);
        output.splice(start..end, edit.text.bytes());
    }
    output
}

/// Plain listing: a header line per declaration followed by its text
pub fn render_print(docs: &[GeneratedDoc]) -> String {
    let mut out = String::new();
    for doc in docs {
        out.push_str(&format!(
            "== {} ({}) at {} ==\n{}\n\n",
            doc.declaration.qualified_name,
            doc.declaration.kind,
            doc.declaration.location(),
            doc.text
        ));
    }
    out
}

/// Standalone HTML document with one `<section>` per declaration
pub fn render_html(docs: &[GeneratedDoc], disclaimer: Option<&str>) -> String {
    let mut sections = String::new();
    for doc in docs {
        match doc.style {
            PromptStyle::Html => sections.push_str(&doc.text),
            PromptStyle::Comment => sections.push_str(&format!(
                "<section>\n<h2><code>{}</code></h2>\n<p class='location'>{} in {}</p>\n<pre>{}</pre>\n</section>",
                escape_html(&doc.declaration.qualified_name),
                doc.declaration.kind,
                escape_html(&doc.declaration.location()),
                escape_html(&doc.text)
            )),
        }
        sections.push('\n');
    }

    let note = disclaimer
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!("<p class='note'>{}</p>\n", escape_html(d)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>
<html lang='en'>
<head>
    <meta charset='UTF-8'>
    <title>API Documentation</title>
    <style>
        body {{ font-family: sans-serif; padding: 2em; background: #f9f9f9; }}
        h2 {{ border-bottom: 1px solid #ccc; padding-bottom: 0.3em; }}
        code {{ background: #eee; padding: 2px 4px; border-radius: 3px; }}
        section {{ margin-bottom: 2em; background: #fff; padding: 1em; border: 1px solid #ccc; border-radius: 6px; }}
        .note, .location {{ color: #666; font-size: 0.9em; }}
    </style>
</head>
<body>
<p class='note'>Generated {}</p>
{}{}</body>
</html>
",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        note,
        sections
    )
}

#[derive(Serialize)]
struct DocRecord<'a> {
    name: &'a str,
    qualified_name: &'a str,
    kind: DeclKind,
    language: SourceLanguage,
    file: &'a Path,
    line: usize,
    column: usize,
    definition: bool,
    previously_documented: bool,
    style: PromptStyle,
    documentation: &'a str,
}

/// Pretty JSON array with one record per generated doc
pub fn render_json(docs: &[GeneratedDoc]) -> LlmResult<String> {
    let records: Vec<DocRecord<'_>> = docs
        .iter()
        .map(|doc| DocRecord {
            name: &doc.declaration.name,
            qualified_name: &doc.declaration.qualified_name,
            kind: doc.declaration.kind,
            language: doc.declaration.language,
            file: &doc.declaration.file,
            line: doc.declaration.line,
            column: doc.declaration.column,
            definition: doc.declaration.is_definition,
            previously_documented: doc.declaration.documented,
            style: doc.style,
            documentation: &doc.text,
        })
        .collect();

    let mut json = serde_json::to_string_pretty(&records)?;
    json.push('\n');
    Ok(json)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdocs_core::Declaration;
    use proptest::prelude::*;
    use std::path::PathBuf;

    const SOURCE: &str = "#include <stdio.h>\n\nint add(int a, int b);\n\nstruct point {\n    int x;\n    int y;\n};\n";

    fn doc(name: &str, kind: DeclKind, line: usize, text: &str) -> GeneratedDoc {
        let needle = match kind {
            DeclKind::Struct => "struct point",
            _ => "int add",
        };
        let start = SOURCE.find(needle).unwrap();
        GeneratedDoc {
            declaration: Declaration {
                name: name.to_string(),
                qualified_name: name.to_string(),
                kind,
                language: SourceLanguage::C,
                file: PathBuf::from("math.c"),
                line,
                column: 1,
                start_byte: start,
                end_byte: start,
                line_start_byte: start,
                indent: String::new(),
                text: String::new(),
                is_definition: false,
                documented: false,
                doc_comment_start: None,
            },
            text: text.to_string(),
            style: PromptStyle::Comment,
        }
    }

    #[test]
    fn test_format_doc_comment() {
        let comment = format_doc_comment("Adds numbers.\n\n@return the sum", "    ", Some("Generated by hdocs."));
        assert_eq!(
            comment,
            "    /**\n     * Adds numbers.\n     *\n     * @return the sum\n     *\n     * Generated by hdocs.\n     */\n"
        );
    }

    #[test]
    fn test_comment_terminator_escaped() {
        let comment = format_doc_comment("Ends early */ not really", "", None);
        assert!(comment.contains("Ends early *\\/ not really"));
        assert_eq!(comment.matches("*/").count(), 1);
    }

    #[test]
    fn test_insert_comments_above_declarations() {
        let docs = vec![
            doc("add", DeclKind::Function, 3, "Adds two integers."),
            doc("point", DeclKind::Struct, 5, "A 2D point."),
        ];
        let output = insert_comments(SOURCE, Path::new("math.c"), &docs, None);

        assert_eq!(
            output,
            "#include <stdio.h>\n\n/**\n * Adds two integers.\n */\nint add(int a, int b);\n\n\
             /**\n * A 2D point.\n */\nstruct point {\n    int x;\n    int y;\n};\n"
        );
    }

    #[test]
    fn test_insert_ignores_other_files() {
        let docs = vec![doc("add", DeclKind::Function, 3, "Adds two integers.")];
        assert_eq!(insert_comments(SOURCE, Path::new("other.c"), &docs, None), SOURCE);
    }

    fn doc_in(source: &str, needle: &str, comment: Option<&str>, text: &str) -> GeneratedDoc {
        let start = source.find(needle).unwrap();
        let mut generated = doc("f", DeclKind::Function, 1, text);
        generated.declaration.start_byte = start;
        generated.declaration.line_start_byte = start;
        generated.declaration.documented = comment.is_some();
        generated.declaration.doc_comment_start = comment.map(|c| source.find(c).unwrap());
        generated
    }

    #[test]
    fn test_regenerated_doc_replaces_old_comment() {
        let source = "int g(void);\n\n/** Old doc. */\nint f(void);\n";
        let docs = vec![doc_in(source, "int f", Some("/** Old"), "New doc.")];
        assert_eq!(
            insert_comments(source, Path::new("math.c"), &docs, None),
            "int g(void);\n\n/**\n * New doc.\n */\nint f(void);\n"
        );
    }

    #[test]
    fn test_replacement_keeps_indentation() {
        let source = "    // Old.\n    // Still old.\n    int f(void);\n";
        let mut generated = doc_in(source, "int f", Some("    // Old"), "New.");
        generated.declaration.line_start_byte = source.find("    int f").unwrap();
        generated.declaration.indent = "    ".to_string();
        assert_eq!(
            insert_comments(source, Path::new("math.c"), &[generated], None),
            "    /**\n     * New.\n     */\n    int f(void);\n"
        );
    }

    #[test]
    fn test_raw_edits_keep_undecodable_bytes() {
        let (text, raw) = hdocs_core::decode_lossy(b"/* caf\xe9 */\n\nint f(void);\n".to_vec());
        let raw = raw.unwrap();
        let docs = vec![doc_in(&text, "int f", None, "New doc.")];

        let edits = comment_edits(&text, Path::new("math.c"), &docs, None);
        assert_eq!(
            apply_edits_to_raw(&raw, &edits),
            b"/* caf\xe9 */\n\n/**\n * New doc.\n */\nint f(void);\n".to_vec()
        );
    }

    #[test]
    fn test_out_of_range_doc_is_skipped() {
        let mut generated = doc("add", DeclKind::Function, 3, "Adds.");
        generated.declaration.line_start_byte = SOURCE.len() + 10;
        assert!(comment_edits(SOURCE, Path::new("math.c"), &[generated], None).is_empty());
    }

    #[test]
    fn test_render_print() {
        let docs = vec![doc("add", DeclKind::Function, 3, "Adds two integers.")];
        assert_eq!(render_print(&docs), "== add (function) at math.c:3 ==\nAdds two integers.\n\n");
    }

    #[test]
    fn test_render_html_escapes_comment_text() {
        let docs = vec![doc("add", DeclKind::Function, 3, "Returns a < b")];
        let html = render_html(&docs, Some("Heuristic output"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<pre>Returns a &lt; b</pre>"));
        assert!(html.contains("<p class='note'>Heuristic output</p>"));
    }

    #[test]
    fn test_render_html_keeps_html_sections() {
        let mut generated = doc("add", DeclKind::Function, 3, "<section><h2>add</h2></section>");
        generated.style = PromptStyle::Html;
        let html = render_html(&[generated], None);
        assert!(html.contains("<section><h2>add</h2></section>"));
    }

    #[test]
    fn test_render_json() {
        let docs = vec![doc("add", DeclKind::Function, 3, "Adds two integers.")];
        let json: serde_json::Value = serde_json::from_str(&render_json(&docs).unwrap()).unwrap();
        assert_eq!(json[0]["qualified_name"], "add");
        assert_eq!(json[0]["kind"], "function");
        assert_eq!(json[0]["language"], "c");
        assert_eq!(json[0]["definition"], false);
        assert_eq!(json[0]["documentation"], "Adds two integers.");
    }

    proptest! {
        #[test]
        fn prop_comment_block_is_well_formed(text in "[a-z */\n]{0,120}", indent in "[ \t]{0,8}") {
            let comment = format_doc_comment(&text, &indent, None);
            let opening = format!("{}/**\n", indent);
            let closing = format!("{} */\n", indent);
            prop_assert!(comment.starts_with(&opening));
            prop_assert!(comment.ends_with(&closing));
            prop_assert_eq!(comment.matches("*/").count(), 1);
        }
    }
}
