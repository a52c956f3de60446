//! File system helpers: input discovery and backups before rewriting sources

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lexically normalize a path (`a/./b/../c` becomes `a/c`)
pub fn normalize_path(path: &Path) -> PathBuf {
    path_clean::clean(path)
}

/// Expand input paths into the list of files to process
///
/// Files named explicitly are always kept. Directories are walked recursively,
/// keeping files accepted by `is_source` and skipping excluded directories.
/// The result is deduplicated and keeps the order of the inputs; files found
/// under one directory are sorted.
pub fn collect_sources<F>(inputs: &[PathBuf], is_source: F) -> crate::Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let exclusions = crate::default_exclusion_patterns();
    let mut files = Vec::new();

    for input in inputs {
        let metadata = fs::metadata(input).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", input.display(), e))
        })?;

        if metadata.is_file() {
            push_unique(&mut files, normalize_path(input));
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !crate::should_exclude_path(Path::new(e.file_name()), &exclusions)
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", input.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_source(entry.path()) {
                found.push(normalize_path(entry.path()));
            }
        }
        found.sort();
        tracing::debug!("Found {} source files under {}", found.len(), input.display());

        for path in found {
            push_unique(&mut files, path);
        }
    }

    Ok(files)
}

fn push_unique(files: &mut Vec<PathBuf>, path: PathBuf) {
    if !files.contains(&path) {
        files.push(path);
    }
}

/// Create a timestamped backup of a file in a sibling `.hdocs_backups` directory
pub fn create_backup(file_path: &Path) -> crate::Result<PathBuf> {
    if !file_path.is_file() {
        return Err(crate::UtilError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File does not exist: {}", file_path.display()),
        )));
    }

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let backup_name = format!(
        "{}.backup.{}",
        file_path
            .file_name()
            .ok_or_else(|| crate::UtilError::PathOperation("Invalid file name".to_string()))?
            .to_string_lossy(),
        timestamp
    );

    let parent = match file_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let backup_dir = parent.join(".hdocs_backups");
    fs::create_dir_all(&backup_dir)?;

    let backup_path = backup_dir.join(backup_name);
    fs::copy(file_path, &backup_path)?;

    Ok(backup_path)
}

/// Write a file, creating parent directories as needed
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}
