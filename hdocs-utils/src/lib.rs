//! hdocs utilities - shared plumbing for the hdocs workspace
//!
//! This crate provides the pieces every other hdocs crate leans on:
//! layered configuration file loading, logging initialisation,
//! source discovery and file backups.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod file;
pub mod logging;

/// Re-export commonly used utilities
pub use config::load_layered;
pub use file::{collect_sources, create_backup, normalize_path};

/// Result type used throughout hdocs utilities
pub type Result<T> = std::result::Result<T, UtilError>;

/// Error types for utility operations
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path operation error
    #[error("Path operation error: {0}")]
    PathOperation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl UtilError {
    /// Whether this error stems from user configuration rather than the filesystem
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Serialization(_))
    }
}

/// Directory names skipped while collecting sources
pub fn default_exclusion_patterns() -> std::collections::HashSet<String> {
    let mut patterns = std::collections::HashSet::new();

    // Version control
    patterns.insert(".git".to_string());
    patterns.insert(".svn".to_string());
    patterns.insert(".hg".to_string());

    // Build trees
    patterns.insert("build".to_string());
    patterns.insert("cmake-build-debug".to_string());
    patterns.insert("cmake-build-release".to_string());
    patterns.insert("out".to_string());
    patterns.insert("target".to_string());

    // IDE and editor files
    patterns.insert(".vscode".to_string());
    patterns.insert(".idea".to_string());
    patterns.insert(".cache".to_string());

    // Vendored dependencies
    patterns.insert("third_party".to_string());
    patterns.insert("node_modules".to_string());

    // Our own backups
    patterns.insert(".hdocs_backups".to_string());

    patterns
}

/// Check if any component of a path matches an exclusion pattern
pub fn should_exclude_path(
    path: &std::path::Path,
    patterns: &std::collections::HashSet<String>,
) -> bool {
    path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| patterns.contains(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exclusion_patterns() {
        let patterns = default_exclusion_patterns();

        assert!(should_exclude_path(&PathBuf::from(".git/config"), &patterns));
        assert!(should_exclude_path(&PathBuf::from("proj/build/gen.c"), &patterns));
        assert!(should_exclude_path(&PathBuf::from("a/.hdocs_backups/x.c"), &patterns));
        assert!(!should_exclude_path(&PathBuf::from("src/main.c"), &patterns));
    }

    #[test]
    fn test_exclusion_matches_whole_components_only() {
        let patterns = default_exclusion_patterns();

        assert!(!should_exclude_path(&PathBuf::from("src/builder.c"), &patterns));
        assert!(!should_exclude_path(&PathBuf::from("outline/tree.cpp"), &patterns));
    }

    #[test]
    fn test_config_error_classification() {
        assert!(UtilError::Config("bad".into()).is_config());
        assert!(!UtilError::Io(std::io::Error::other("x")).is_config());
    }
}
