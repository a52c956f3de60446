//! Cleanup of model output before it is emitted

use crate::prompt::PromptStyle;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCE_LINE: Regex = Regex::new(r"^\s*```[\w+\-]*\s*$").unwrap();
    static ref EXTRA_BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Clean raw model output; `None` when nothing usable is left
pub fn clean_response(raw: &str, style: PromptStyle) -> Option<String> {
    let unfenced: Vec<&str> = raw.lines().filter(|line| !FENCE_LINE.is_match(line)).collect();
    let mut text = unfenced.join("\n").replace("```", "");

    text = cut_trailing_note(&text);

    let text = match style {
        PromptStyle::Comment => strip_comment_markers(&text),
        PromptStyle::Html => cut_after_section(&text),
    };

    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    let text = EXTRA_BLANK_LINES.replace_all(&trimmed.join("\n"), "\n\n").trim().to_string();

    if text.is_empty() {
        return None;
    }

    match style {
        PromptStyle::Html if !text.starts_with("<section") => Some(format!("<section>\n{}\n</section>", text)),
        _ => Some(text),
    }
}

/// Drop a closing "Note that ..." paragraph and everything after it
fn cut_trailing_note(text: &str) -> String {
    let mut kept = Vec::new();
    let mut previous_blank = true;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if previous_blank && !kept.is_empty() && trimmed.starts_with("Note that") {
            break;
        }
        previous_blank = trimmed.is_empty();
        kept.push(line);
    }

    kept.join("\n")
}

/// Anything after the last `</section>` is commentary
fn cut_after_section(text: &str) -> String {
    match text.rfind("</section>") {
        Some(end) => text[..end + "</section>".len()].to_string(),
        None => text.to_string(),
    }
}

/// Remove `/** */`, `*` and `//` decoration the model added anyway
fn strip_comment_markers(text: &str) -> String {
    let trimmed = text.trim();
    let block = trimmed.starts_with("/*");

    let mut body = trimmed;
    if block {
        body = body
            .trim_start_matches("/**")
            .trim_start_matches("/*!")
            .trim_start_matches("/*");
        body = body.strip_suffix("*/").unwrap_or(body);
    }

    let lines: Vec<&str> = body.lines().collect();
    let non_empty = || lines.iter().map(|l| l.trim_start()).filter(|l| !l.is_empty());
    let all_line_comments = non_empty().next().is_some() && non_empty().all(|l| l.starts_with("//"));
    let all_stars = non_empty().next().is_some() && non_empty().all(|l| l.starts_with('*'));

    lines
        .iter()
        .map(|line| {
            let stripped = line.trim_start();
            if all_line_comments {
                let rest = stripped
                    .trim_start_matches("///")
                    .trim_start_matches("//!")
                    .trim_start_matches("//");
                rest.strip_prefix(' ').unwrap_or(rest)
            } else if block || all_stars {
                match stripped.strip_prefix('*') {
                    Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                    None => stripped,
                }
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
