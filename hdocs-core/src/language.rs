//! Source language detection and grammar lookup

use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::Language;

/// Languages hdocs can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    C,
    Cpp,
}

impl SourceLanguage {
    /// Get tree-sitter language for this enum
    pub fn tree_sitter_language(self) -> Language {
        match self {
            Self::C => tree_sitter_c::language(),
            Self::Cpp => tree_sitter_cpp::language(),
        }
    }

    /// File extensions mapped to this language
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::C => &["c", "h"],
            Self::Cpp => &["cc", "cpp", "cxx", "c++", "hh", "hpp", "hxx", "h++", "ipp", "tpp"],
        }
    }

    /// Name used for query directories and prompts
    pub const fn name(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
        }
    }

    /// Human readable name used in prompts
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::Cpp => "C++",
        }
    }

    /// Detect language from file extension
    ///
    /// `.h` headers are treated as C; pass an explicit language for C++ headers.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();

        [Self::C, Self::Cpp]
            .into_iter()
            .find(|lang| lang.extensions().contains(&extension.as_str()))
    }

    /// Returns true if the path looks like a C or C++ source or header
    pub fn is_source_path(path: &Path) -> bool {
        Self::from_path(path).is_some()
    }
}

impl std::fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SourceLanguage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c" => Ok(Self::C),
            "cpp" | "c++" | "cxx" => Ok(Self::Cpp),
            _ => Err(format!("Invalid language: '{s}'. Valid options: c, cpp")),
        }
    }
}
