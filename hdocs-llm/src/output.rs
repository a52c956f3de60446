//! Emitting a generation report to stdout or the filesystem

use crate::generator::{Analysis, GeneratedDoc, GenerationReport};
use crate::prompt::PromptStyle;
use crate::render::{
    apply_edits_to_raw, comment_edits, insert_comments, render_html, render_json, render_print,
};
use crate::{LlmError, LlmResult};
use hdocs_core::FileAnalysis;
use hdocs_utils::file::write_file;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

const DEFAULT_DISCLAIMER: &str = "Heuristic documentation generated by hdocs; verify against the code.";

/// How generated documentation is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Header and text per declaration
    #[default]
    Print,
    /// Sources re-rendered with comments inserted
    Insert,
    /// One standalone HTML document
    Html,
    /// JSON array of generated docs
    Json,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub style: PromptStyle,
    /// Insert mode only: rewrite the sources themselves
    pub in_place: bool,
    /// Output directory in insert mode, output file otherwise
    pub output: Option<PathBuf>,
    /// Back up sources before rewriting them in place
    pub backup: bool,
    /// Line appended to inserted comments and shown in HTML output
    pub disclaimer: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Print,
            style: PromptStyle::Comment,
            in_place: false,
            output: None,
            backup: true,
            disclaimer: Some(DEFAULT_DISCLAIMER.to_string()),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> LlmResult<()> {
        if self.in_place && self.mode != OutputMode::Insert {
            return Err(LlmError::Config("--in-place requires insert mode".to_string()));
        }
        if self.in_place && self.output.is_some() {
            return Err(LlmError::Config("--in-place and --output cannot be combined".to_string()));
        }
        Ok(())
    }

    fn disclaimer(&self) -> Option<&str> {
        self.disclaimer.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// What was written besides stdout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSummary {
    pub files_written: Vec<PathBuf>,
    pub backups: Vec<PathBuf>,
}

/// Emit `report` according to `config`; stdout output goes to `stdout`
pub fn write_output(
    analysis: &Analysis,
    report: &GenerationReport,
    config: &OutputConfig,
    stdout: &mut dyn Write,
) -> LlmResult<OutputSummary> {
    config.validate()?;

    let mut summary = OutputSummary::default();
    let content = match config.mode {
        OutputMode::Insert => {
            write_inserted(analysis, report, config, stdout, &mut summary)?;
            return Ok(summary);
        }
        OutputMode::Print => render_print(&report.docs),
        OutputMode::Html => render_html(&report.docs, config.disclaimer()),
        OutputMode::Json => render_json(&report.docs)?,
    };

    match &config.output {
        Some(path) => {
            write_file(path, &content)?;
            log::info!("Wrote {}", path.display());
            summary.files_written.push(path.clone());
        }
        None => stdout.write_all(content.as_bytes())?,
    }

    Ok(summary)
}

fn write_inserted(
    analysis: &Analysis,
    report: &GenerationReport,
    config: &OutputConfig,
    stdout: &mut dyn Write,
    summary: &mut OutputSummary,
) -> LlmResult<()> {
    let changed: Vec<_> = analysis
        .files
        .iter()
        .filter(|file| report.docs.iter().any(|doc| doc.declaration.file == file.path))
        .collect();

    for file in &changed {
        let rendered = render_inserted(file, &report.docs, config.disclaimer());

        if config.in_place {
            if config.backup {
                let backup = hdocs_utils::create_backup(&file.path)?;
                log::info!("Backed up {} to {}", file.path.display(), backup.display());
                summary.backups.push(backup);
            }
            write_file(&file.path, &rendered)?;
            summary.files_written.push(file.path.clone());
        } else if let Some(dir) = &config.output {
            let target = dir.join(relative_output_path(&file.path));
            write_file(&target, &rendered)?;
            log::info!("Wrote {}", target.display());
            summary.files_written.push(target);
        } else {
            if changed.len() > 1 {
                writeln!(stdout, "// ==> {} <==", file.path.display())?;
            }
            stdout.write_all(&rendered)?;
        }
    }

    Ok(())
}

/// Bytes of `file` with comments inserted; bytes that were not valid UTF-8 are kept as read
fn render_inserted(file: &FileAnalysis, docs: &[GeneratedDoc], disclaimer: Option<&str>) -> Vec<u8> {
    match &file.raw {
        Some(raw) => apply_edits_to_raw(raw, &comment_edits(&file.source, &file.path, docs, disclaimer)),
        None => insert_comments(&file.source, &file.path, docs, disclaimer).into_bytes(),
    }
}

/// Path of a source below an output directory: root, prefix and `..` parts are dropped
fn relative_output_path(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_output_path() {
        assert_eq!(relative_output_path(Path::new("/src/lib/a.c")), PathBuf::from("src/lib/a.c"));
        assert_eq!(relative_output_path(Path::new("../x/./b.h")), PathBuf::from("x/b.h"));
    }

    #[test]
    fn test_validate() {
        assert!(OutputConfig::default().validate().is_ok());

        let in_place_print = OutputConfig { in_place: true, ..OutputConfig::default() };
        assert!(matches!(in_place_print.validate(), Err(LlmError::Config(_))));

        let both = OutputConfig {
            mode: OutputMode::Insert,
            in_place: true,
            output: Some(PathBuf::from("out")),
            ..OutputConfig::default()
        };
        assert!(both.validate().is_err());
    }

    #[test]
    fn test_blank_disclaimer_is_dropped() {
        let config = OutputConfig { disclaimer: Some("  ".into()), ..OutputConfig::default() };
        assert_eq!(config.disclaimer(), None);
        assert!(OutputConfig::default().disclaimer().is_some());
    }

    #[test]
    fn test_empty_report_prints_nothing() {
        let mut stdout = Vec::new();
        let summary = write_output(
            &Analysis::default(),
            &GenerationReport::default(),
            &OutputConfig::default(),
            &mut stdout,
        )
        .unwrap();
        assert!(stdout.is_empty());
        assert!(summary.files_written.is_empty());
    }
}
