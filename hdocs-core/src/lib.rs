//! hdocs core - C/C++ parsing and declaration extraction
//!
//! This crate turns C and C++ source files into the list of declarations
//! that a documentation pass cares about:
//! - language detection and tree-sitter parsing with strict error detection
//! - query-driven extraction of functions, methods, types and macros
//! - detection of existing documentation comments
//! - a cross-file symbol table used to give prompts their context

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions, // Often necessary for clarity
    clippy::missing_errors_doc,
)]

pub mod analyzer;
pub mod constants;
pub mod declarations;
pub mod language;
pub mod models;
pub mod parser;
pub mod symbols;

pub use analyzer::{build_symbol_table, FileAnalysis, SourceAnalyzer};
pub use declarations::{DeclarationExtractor, DocCommentStyle, ExtractionConfig};
pub use language::SourceLanguage;
pub use models::{DeclKind, Declaration};
pub use parser::{decode_lossy, ParsedSource, RawSource, SourceParser};
pub use symbols::SymbolTable;

use std::path::PathBuf;

/// Result type used throughout hdocs core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for hdocs core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source contains syntax the parser could not make sense of
    #[error("Parse error in {}:{line}:{column}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// No grammar is available for the file
    #[error("Unsupported file type: {} (use --lang c or --lang cpp)", .0.display())]
    UnsupportedLanguage(PathBuf),

    /// Grammar could not be loaded into the parser
    #[error("Language error: {0}")]
    Language(String),

    /// A bundled query failed to compile
    #[error("Query error: {0}")]
    Query(String),

    /// Utility error
    #[error("Utility error: {0}")]
    Util(#[from] hdocs_utils::UtilError),
}

impl Error {
    /// Whether the error means the source itself could not be processed
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::UnsupportedLanguage(_))
    }
}
