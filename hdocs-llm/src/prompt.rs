//! Prompt construction
//!
//! Each prompt carries the declaration's code plus the definitions of the
//! types and macros that code mentions, with instructions specific to the
//! kind of declaration.

use crate::client::CompletionRequest;
use hdocs_core::symbols::snippet_of;
use hdocs_core::{DeclKind, Declaration, SymbolTable};
use serde::{Deserialize, Serialize};

/// Shape of the text requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Plain text for the body of a documentation comment
    #[default]
    Comment,
    /// A semantic HTML `<section>`
    Html,
}

impl std::fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Comment => write!(f, "comment"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// Builds completion requests for declarations
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    style: PromptStyle,
    max_snippet_lines: usize,
    context_lines: usize,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle, max_snippet_lines: usize, context_lines: usize) -> Self {
        Self {
            style,
            max_snippet_lines: max_snippet_lines.max(1),
            context_lines: context_lines.max(1),
        }
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    pub fn build(&self, declaration: &Declaration, symbols: &SymbolTable) -> CompletionRequest {
        let language = declaration.language.display_name();
        let snippet = snippet_of(declaration, self.max_snippet_lines);
        let context = symbols.context_for(declaration, &snippet, self.context_lines);

        let mut prompt = String::new();
        prompt.push_str("You are an expert technical documentation engine.\n\n");
        prompt.push_str(&format!(
            "You are provided with a {} {} `{}` and its relevant context below. {}\n\n",
            language,
            declaration.kind,
            declaration.qualified_name,
            kind_instructions(declaration.kind, self.style)
        ));

        if !context.is_empty() {
            prompt.push_str("<context>\n");
            prompt.push_str(&context.join("\n\n"));
            prompt.push_str("\n</context>\n\n");
        }

        prompt.push_str("<code>\n");
        prompt.push_str(snippet.trim());
        prompt.push_str("\n</code>\n\n");
        prompt.push_str(output_rules(self.style));

        CompletionRequest {
            system: system_message(language, self.style),
            prompt,
        }
    }
}

fn system_message(language: &str, style: PromptStyle) -> String {
    match style {
        PromptStyle::Html => {
            format!("You are a precise {} documentation generator that only outputs HTML.", language)
        }
        PromptStyle::Comment => format!(
            "You are a precise {} documentation generator that only outputs the text of a documentation comment.",
            language
        ),
    }
}

fn kind_instructions(kind: DeclKind, style: PromptStyle) -> &'static str {
    match (kind, style) {
        (DeclKind::Function | DeclKind::Method, PromptStyle::Html) => {
            "Document it in detail. Include the name, full parameter list with their types and possible bounds, \
             return type, and a detailed description of what it does. If observable, also include:\n\n\
             - Complexity (e.g. time or space complexity)\n\
             - Side effects (e.g. mutating global state, I/O)\n\
             - Preconditions or error conditions (e.g. return values that indicate errors)\n\n\
             Describe parameters and return value using <dl>, with <dt> and <dd> for names and descriptions."
        }
        (DeclKind::Function | DeclKind::Method, PromptStyle::Comment) => {
            "Describe what it does in one or two sentences, then one `@param name description` line per parameter \
             and a `@return description` line unless it returns void. If observable, also mention complexity, \
             side effects (e.g. mutating global state, I/O) and error conditions."
        }
        (DeclKind::Struct | DeclKind::Union | DeclKind::Class, PromptStyle::Html) => {
            "Document the type including its name, each field name, its type, and purpose. \
             Include any observable invariants or alignment notes."
        }
        (DeclKind::Struct | DeclKind::Union | DeclKind::Class, PromptStyle::Comment) => {
            "Describe what the type represents and the purpose of each field or member. \
             Mention any observable invariants."
        }
        (DeclKind::Enum, PromptStyle::Html) => {
            "Document this enum in full detail. List all enumerators with their values and what they represent. \
             Mention where each enumerator might be used if observable. Use a <table> or <dl> for structure."
        }
        (DeclKind::Enum, PromptStyle::Comment) => {
            "Describe what the enumeration represents and list every enumerator with its value and meaning."
        }
        (DeclKind::Typedef, PromptStyle::Html) => {
            "Document this typedef. Explain what it abstracts, the underlying type, and how it is typically used."
        }
        (DeclKind::Typedef, PromptStyle::Comment) => {
            "Explain what the alias abstracts and name the underlying type."
        }
        (DeclKind::Macro, PromptStyle::Html) => {
            "Document this macro. Describe its replacement value and how it is expected to be used. \
             Mention any semantic effect it has on compilation."
        }
        (DeclKind::Macro, PromptStyle::Comment) => {
            "Describe the macro's replacement value, its parameters if it takes any, and how it is expected to be used."
        }
    }
}

fn output_rules(style: PromptStyle) -> &'static str {
    match style {
        PromptStyle::Html => {
            "Output ONLY clean, semantic HTML inside a <section>. Do NOT include markdown, guesses, summaries, \
             or template filler.\n\n\
             - Use <h2>, <dl>, <dt>, <dd>, <code>, <p>, etc. for structure.\n\
             - Do NOT hallucinate any meaning. Describe only what is explicit in the code.\n\
             - Start output with <section> and end with </section>.\n"
        }
        PromptStyle::Comment => {
            "Output ONLY the text of the comment. Do NOT include comment markers, markdown, the code itself, \
             guesses, or template filler.\n\n\
             - Describe only what is explicit in the code.\n\
             - Keep lines under 90 characters.\n"
        }
    }
}
