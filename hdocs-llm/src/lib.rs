//! hdocs LLM - completion service integration and the documentation pipeline
//!
//! This crate connects the declarations found by `hdocs-core` to a remote
//! completion service:
//! - the [`CompletionService`] seam and its OpenAI implementation
//! - prompt construction with cross-file context
//! - cleanup of model output
//! - the sequential [`DocGenerator`] pipeline
//! - rendering as plain text, inserted comments, HTML or JSON

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod generator;
pub mod openai;
pub mod output;
pub mod prompt;
pub mod render;
pub mod response;

pub use client::{CompletionRequest, CompletionService};
pub use config::HdocsConfig;
pub use generator::{
    analyze_inputs, select_targets, Analysis, DocGenerator, GeneratedDoc, GenerationReport,
    Selection, SkippedDeclaration,
};
pub use openai::{resolve_api_key, ApiConfig, OpenAiClient};
pub use output::{write_output, OutputConfig, OutputMode, OutputSummary};
pub use prompt::{PromptBuilder, PromptStyle};
pub use response::clean_response;

/// Result type for LLM operations
pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Error types for LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Missing credential or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parsing or extraction failed
    #[error(transparent)]
    Source(#[from] hdocs_core::Error),

    /// Transport failure talking to the completion endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the completion endpoint
    #[error("Completion API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP 429 from the completion endpoint
    #[error("Completion API rate limit exceeded: {0}")]
    RateLimited(String),

    /// Response body did not have the expected shape
    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Utility error
    #[error(transparent)]
    Util(#[from] hdocs_utils::UtilError),
}

/// User-facing classification of an [`LlmError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Parse,
    RemoteService,
    Io,
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Source(error) => match error {
                hdocs_core::Error::Io(_) => ErrorKind::Io,
                hdocs_core::Error::Util(util) if !util.is_config() => ErrorKind::Io,
                hdocs_core::Error::Util(_) => ErrorKind::Configuration,
                _ => ErrorKind::Parse,
            },
            Self::Http(_) | Self::Api { .. } | Self::RateLimited(_) | Self::InvalidResponse(_) => {
                ErrorKind::RemoteService
            }
            Self::Json(_) | Self::Io(_) => ErrorKind::Io,
            Self::Util(util) if util.is_config() => ErrorKind::Configuration,
            Self::Util(_) => ErrorKind::Io,
        }
    }
}
