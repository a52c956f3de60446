//! Data models shared by extraction, prompting and output

use crate::language::SourceLanguage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of declaration that can receive documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Function,
    Method,
    Class,
    Struct,
    Union,
    Enum,
    Typedef,
    Macro,
}

impl DeclKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::Typedef => "typedef",
            Self::Macro => "macro",
        }
    }

    /// Kinds whose definitions are pulled into the context of other prompts
    pub const fn provides_context(self) -> bool {
        matches!(
            self,
            Self::Struct | Self::Union | Self::Enum | Self::Typedef | Self::Macro
        )
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declaration found in a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Unqualified name (`push`)
    pub name: String,
    /// Name including enclosing namespaces and classes (`util::Stack::push`)
    pub qualified_name: String,
    pub kind: DeclKind,
    pub language: SourceLanguage,
    pub file: PathBuf,
    /// 1-based line of the anchor node
    pub line: usize,
    /// 1-based column of the anchor node
    pub column: usize,
    /// Byte range of the anchor node in the source
    pub start_byte: usize,
    pub end_byte: usize,
    /// Byte offset of the start of the anchor's first line
    pub line_start_byte: usize,
    /// Leading whitespace of the anchor's first line
    pub indent: String,
    /// Source text of the anchor node
    pub text: String,
    /// Whether the declaration carries a body (function body, type body, macro value)
    pub is_definition: bool,
    /// Whether a documentation comment is already attached
    pub documented: bool,
    /// Byte offset of the start of the attached comment's first line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_comment_start: Option<usize>,
}

impl Declaration {
    /// `file:line` for messages
    pub fn location(&self) -> String {
        format!("{}:{}", self.file.display(), self.line)
    }
}
