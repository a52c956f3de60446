//! The documentation pipeline
//!
//! Inputs are parsed and indexed in full before the first request is built,
//! so a syntax error anywhere aborts the run without touching the network.
//! Requests are then sent one at a time, each awaited before the next.

use crate::client::CompletionService;
use crate::prompt::{PromptBuilder, PromptStyle};
use crate::response::clean_response;
use crate::{LlmError, LlmResult};
use hdocs_core::{
    build_symbol_table, Declaration, ExtractionConfig, FileAnalysis, SourceAnalyzer,
    SourceLanguage, SymbolTable,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Every analysed file plus the symbol table built over all of them
#[derive(Debug, Default)]
pub struct Analysis {
    pub files: Vec<FileAnalysis>,
    pub symbols: SymbolTable,
}

impl Analysis {
    pub fn from_files(files: Vec<FileAnalysis>) -> Self {
        let symbols = build_symbol_table(&files);
        Self { files, symbols }
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.files.iter().flat_map(|file| file.declarations.iter())
    }
}

/// Collect, parse and index every C/C++ source under `inputs`
pub fn analyze_inputs(inputs: &[PathBuf], config: &ExtractionConfig) -> LlmResult<Analysis> {
    let paths = hdocs_utils::collect_sources(inputs, SourceLanguage::is_source_path)?;
    if paths.is_empty() {
        return Err(LlmError::Config("no C or C++ sources found in the given paths".to_string()));
    }

    let mut analyzer = SourceAnalyzer::new(config.clone())?;
    let files = analyzer.analyze_all(&paths)?;
    let analysis = Analysis::from_files(files);

    log::info!(
        "Analysed {} files, {} declarations ({} undocumented), {} symbols",
        analysis.files.len(),
        analysis.declarations().count(),
        analysis.files.iter().map(|file| file.undocumented().count()).sum::<usize>(),
        analysis.symbols.len()
    );

    Ok(analysis)
}

/// Which declarations receive documentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Restrict generation to these names (qualified or unqualified); empty means all
    pub symbols: Vec<String>,
    /// Also regenerate declarations that already carry a comment
    pub include_documented: bool,
}

impl Selection {
    /// Read symbol names listed one per line; blank lines and `#` comments are ignored
    ///
    /// Only the first tab-separated field counts, so `--discover` output can be
    /// edited down and fed back in.
    pub fn read_symbols_file(path: &Path) -> LlmResult<Vec<String>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("Failed to read {}: {}", path.display(), e))
        })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split('\t').next())
            .map(|name| name.trim().to_string())
            .collect())
    }
}

/// Pick the declarations to document, in input order
///
/// Explicitly named symbols are selected even when already documented.
pub fn select_targets<'a>(analysis: &'a Analysis, selection: &Selection) -> Vec<&'a Declaration> {
    if selection.symbols.is_empty() {
        return analysis
            .declarations()
            .filter(|d| selection.include_documented || !d.documented)
            .collect();
    }

    let wanted: HashSet<&str> = selection.symbols.iter().map(String::as_str).collect();
    let targets: Vec<&Declaration> = analysis
        .declarations()
        .filter(|d| wanted.contains(d.qualified_name.as_str()) || wanted.contains(d.name.as_str()))
        .collect();

    for name in &selection.symbols {
        let found = targets.iter().any(|d| d.qualified_name == *name || d.name == *name);
        if !found {
            log::warn!("Symbol '{}' not found in the analysed sources, ignoring", name);
        }
    }

    targets
}

/// Documentation produced for one declaration
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDoc {
    pub declaration: Declaration,
    pub text: String,
    pub style: PromptStyle,
}

/// A selected declaration that ended up without documentation
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDeclaration {
    pub qualified_name: String,
    pub location: String,
    pub reason: String,
}

/// Result of a generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub docs: Vec<GeneratedDoc>,
    pub skipped: Vec<SkippedDeclaration>,
    /// Completion requests sent
    pub requests: usize,
    pub elapsed_ms: u128,
}

/// Sequential documentation generator over a completion service
pub struct DocGenerator<S: CompletionService> {
    service: S,
    prompts: PromptBuilder,
}

impl<S: CompletionService> DocGenerator<S> {
    pub fn new(service: S, prompts: PromptBuilder) -> Self {
        Self { service, prompts }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Request documentation for each target in turn
    ///
    /// The first remote failure ends the run; nothing is retried.
    pub async fn generate(&self, analysis: &Analysis, targets: &[&Declaration]) -> LlmResult<GenerationReport> {
        let start = Instant::now();
        let mut report = GenerationReport::default();

        for (index, declaration) in targets.iter().enumerate() {
            log::info!(
                "[{}/{}] Documenting {} {} ({}) with {}",
                index + 1,
                targets.len(),
                declaration.kind,
                declaration.qualified_name,
                declaration.location(),
                self.service.name()
            );

            let request = self.prompts.build(declaration, &analysis.symbols);
            report.requests += 1;
            let raw = self.service.complete(&request).await?;

            match clean_response(&raw, self.prompts.style()) {
                Some(text) => report.docs.push(GeneratedDoc {
                    declaration: (*declaration).clone(),
                    text,
                    style: self.prompts.style(),
                }),
                None => {
                    log::warn!(
                        "Empty documentation returned for {} ({}), skipping",
                        declaration.qualified_name,
                        declaration.location()
                    );
                    report.skipped.push(SkippedDeclaration {
                        qualified_name: declaration.qualified_name.clone(),
                        location: declaration.location(),
                        reason: "empty response".to_string(),
                    });
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_millis();
        log::info!(
            "Generated {} docs ({} skipped) in {} ms",
            report.docs.len(),
            report.skipped.len(),
            report.elapsed_ms
        );

        Ok(report)
    }

    /// Analyse `inputs`, select targets and generate documentation for them
    pub async fn run(
        &self,
        inputs: &[PathBuf],
        extraction: &ExtractionConfig,
        selection: &Selection,
    ) -> LlmResult<(Analysis, GenerationReport)> {
        let analysis = analyze_inputs(inputs, extraction)?;
        let targets = select_targets(&analysis, selection);
        let report = self.generate(&analysis, &targets).await?;
        Ok((analysis, report))
    }
}
