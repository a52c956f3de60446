//! File analysis: parse, then extract declarations

use crate::{
    Declaration, DeclarationExtractor, ExtractionConfig, RawSource, Result, SourceLanguage,
    SourceParser, SymbolTable,
};
use std::path::{Path, PathBuf};

/// Declarations of one file together with the text they were cut from
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub language: SourceLanguage,
    pub source: String,
    /// Original bytes when `source` had to be decoded lossily
    pub raw: Option<RawSource>,
    pub declarations: Vec<Declaration>,
}

impl FileAnalysis {
    pub fn undocumented(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(|d| !d.documented)
    }
}

/// Parser plus extractor sharing one configuration
pub struct SourceAnalyzer {
    parser: SourceParser,
    extractor: DeclarationExtractor,
}

impl SourceAnalyzer {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Ok(Self {
            parser: SourceParser::new(config.strict_parse)?,
            extractor: DeclarationExtractor::new(config)?,
        })
    }

    /// Parse one file and extract its declarations
    pub fn analyze_file(&mut self, path: &Path) -> Result<FileAnalysis> {
        let language = self.extractor.config().language;
        let parsed = self.parser.parse_file(path, language)?;
        let declarations = self.extractor.extract(&parsed)?;

        Ok(FileAnalysis {
            path: parsed.path,
            language: parsed.language,
            source: parsed.source,
            raw: parsed.raw,
            declarations,
        })
    }

    /// Analyse every file, stopping at the first failure
    pub fn analyze_all(&mut self, paths: &[PathBuf]) -> Result<Vec<FileAnalysis>> {
        paths.iter().map(|path| self.analyze_file(path)).collect()
    }
}

/// Symbol table over every declaration of every analysis
pub fn build_symbol_table(analyses: &[FileAnalysis]) -> SymbolTable {
    SymbolTable::from_declarations(analyses.iter().flat_map(|a| a.declarations.iter()))
}
