//! hdocs command-line entry point
//!
//! Parses C/C++ sources, finds declarations without documentation comments
//! and asks a completion service to write them.

use clap::{Parser, ValueEnum};
use hdocs_core::{DocCommentStyle, SourceLanguage};
use hdocs_llm::{
    analyze_inputs, write_output, Analysis, DocGenerator, ErrorKind, HdocsConfig, LlmError,
    LlmResult, OpenAiClient, OutputMode, PromptBuilder, PromptStyle, Selection,
};
use hdocs_utils::logging::{basic_config, LogLevel};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hdocs")]
#[command(about = "hdocs - Heuristic documentation generator for C and C++")]
#[command(long_about = "Finds functions, types and macros without documentation comments in C and C++ sources\n\
and asks an OpenAI-compatible completion service to document them.\n\n\
The API key is read from OPENAI_API_KEY (configurable with api.api_key_env).\n\
Generated text is heuristic: review it before committing it.")]
#[command(version)]
struct Cli {
    /// C/C++ files or directories to process
    #[arg(required = true, value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// List declarations without contacting the completion service
    #[arg(long, conflicts_with_all = ["generate", "symbols", "in_place"])]
    discover: bool,

    /// File listing the symbols to document, one per line
    #[arg(long, value_name = "FILE")]
    generate: Option<PathBuf>,

    /// Document only this symbol (repeatable)
    #[arg(short = 's', long = "symbol", value_name = "NAME")]
    symbols: Vec<String>,

    /// Also regenerate declarations that already have a comment
    #[arg(long)]
    include_documented: bool,

    /// How generated documentation is emitted
    #[arg(short = 'm', long)]
    mode: Option<Mode>,

    /// Shape of the requested documentation
    #[arg(long)]
    style: Option<Style>,

    /// Insert mode: rewrite the source files (a backup is kept)
    #[arg(long)]
    in_place: bool,

    /// Do not back up files rewritten in place
    #[arg(long, requires = "in_place")]
    no_backup: bool,

    /// Output directory (insert mode) or output file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Force the source language instead of detecting it from the extension
    #[arg(long, value_name = "LANG")]
    lang: Option<SourceLanguage>,

    /// Model name to use
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the completion API
    #[arg(long)]
    endpoint: Option<String>,

    /// Temperature for responses (0.0-2.0)
    #[arg(short = 't', long)]
    temperature: Option<f32>,

    /// Maximum tokens per response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Work on recovered syntax trees instead of failing on syntax errors
    #[arg(long)]
    lenient: bool,

    /// Only treat /** */, /*! */, /// and //! comments as documentation
    #[arg(long)]
    doxygen_only: bool,

    /// Configuration file path (TOML, JSON or YAML)
    #[arg(short = 'c', long, env = "HDOCS_CONFIG")]
    config: Option<PathBuf>,

    /// Show progress information
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Header and text per declaration on stdout
    Print,
    /// Sources with comments inserted above declarations
    Insert,
    /// Standalone HTML document
    Html,
    /// JSON array
    Json,
}

impl From<Mode> for OutputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Print => Self::Print,
            Mode::Insert => Self::Insert,
            Mode::Html => Self::Html,
            Mode::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Style {
    /// Plain text for a documentation comment
    Comment,
    /// HTML <section> per declaration
    Html,
}

impl From<Style> for PromptStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Comment => Self::Comment,
            Style::Html => Self::Html,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        LogLevel::Debug
    } else if cli.verbose {
        LogLevel::Info
    } else {
        LogLevel::Warning
    };
    if let Err(e) = basic_config(Some(level)) {
        eprintln!("Warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let code = exit_code(error.kind());
            eprintln!("Error: {}", error);
            ExitCode::from(code)
        }
    }
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Configuration => 2,
        ErrorKind::Parse => 3,
        ErrorKind::RemoteService => 4,
        ErrorKind::Io => 1,
    }
}

async fn run(cli: Cli) -> LlmResult<()> {
    let mut config = HdocsConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    if cli.discover {
        let analysis = analyze_inputs(&cli.paths, &config.extraction)?;
        return print_discovery(&analysis);
    }

    // Credential first: a missing key must fail before any parsing.
    let client = OpenAiClient::from_env(config.api.clone())?;

    let mut selection = Selection {
        symbols: cli.symbols.clone(),
        include_documented: cli.include_documented,
    };
    if let Some(file) = &cli.generate {
        let listed = Selection::read_symbols_file(file)?;
        if listed.is_empty() && selection.symbols.is_empty() {
            tracing::warn!("{} lists no symbols, nothing to generate", file.display());
            return Ok(());
        }
        selection.symbols.extend(listed);
    }

    let prompts = PromptBuilder::new(
        config.output.style,
        config.extraction.max_snippet_lines,
        config.extraction.context_lines,
    );
    let generator = DocGenerator::new(client, prompts);
    let (analysis, report) = generator.run(&cli.paths, &config.extraction, &selection).await?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let summary = write_output(&analysis, &report, &config.output, &mut handle)?;
    handle.flush()?;

    tracing::info!(
        "{} declarations documented, {} skipped, {} files written",
        report.docs.len(),
        report.skipped.len(),
        summary.files_written.len()
    );
    for skipped in &report.skipped {
        tracing::warn!("No documentation for {} ({}): {}", skipped.qualified_name, skipped.location, skipped.reason);
    }

    Ok(())
}

/// Command-line flags win over the config file
fn apply_overrides(config: &mut HdocsConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.api.model = model.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.api.endpoint = endpoint.clone();
    }
    if let Some(temperature) = cli.temperature {
        config.api.temperature = temperature;
    }
    if cli.max_tokens.is_some() {
        config.api.max_tokens = cli.max_tokens;
    }

    if cli.lang.is_some() {
        config.extraction.language = cli.lang;
    }
    if cli.lenient {
        config.extraction.strict_parse = false;
    }
    if cli.doxygen_only {
        config.extraction.doc_comment_style = DocCommentStyle::Doxygen;
    }

    if let Some(mode) = cli.mode {
        config.output.mode = mode.into();
    }
    if let Some(style) = cli.style {
        config.output.style = style.into();
    }
    if cli.in_place {
        config.output.in_place = true;
        if cli.mode.is_none() {
            config.output.mode = OutputMode::Insert;
        }
    }
    if cli.no_backup {
        config.output.backup = false;
    }
    if cli.output.is_some() {
        config.output.output = cli.output.clone();
    }
}

fn print_discovery(analysis: &Analysis) -> LlmResult<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    for declaration in analysis.declarations() {
        writeln!(
            handle,
            "{}\t{}\t{}\t{}",
            declaration.qualified_name,
            declaration.kind,
            declaration.location(),
            if declaration.documented { "documented" } else { "undocumented" }
        )
        .map_err(LlmError::Io)?;
    }

    handle.flush().map_err(LlmError::Io)
}
