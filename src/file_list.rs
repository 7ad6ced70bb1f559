//! Glob-based file lists: include patterns, then exclude patterns.
//!
//! An exclude pattern drops a path when it matches the path itself or any
//! of its parent directories, so `node_modules` drops everything below it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

use crate::config::FilePatterns;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, Default)]
pub struct FileList {
    include: Vec<String>,
    exclude: Vec<Pattern>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns(patterns: &FilePatterns) -> Result<Self> {
        let mut list = Self::new();
        for pattern in &patterns.include {
            list.include(pattern);
        }
        for pattern in &patterns.exclude {
            list.exclude(pattern)?;
        }
        Ok(list)
    }

    pub fn include(&mut self, pattern: &str) -> &mut Self {
        self.include.push(pattern.to_string());
        self
    }

    pub fn exclude(&mut self, pattern: &str) -> Result<&mut Self> {
        let compiled = Pattern::new(pattern)
            .with_context(|| format!("Invalid exclude pattern {:?}", pattern))?;
        self.exclude.push(compiled);
        Ok(self)
    }

    /// True if `relative` or one of its parent directories is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        relative
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| {
                self.exclude
                    .iter()
                    .any(|pattern| pattern.matches_path_with(p, MATCH_OPTIONS))
            })
    }

    /// Expand against `root`. Paths come back relative to `root`, sorted,
    /// without duplicates, files only.
    pub fn resolve(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let escaped_root = Pattern::escape(&root.to_string_lossy());
        let mut files = BTreeSet::new();

        for pattern in &self.include {
            let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
            let entries = glob::glob_with(&full, MATCH_OPTIONS)
                .with_context(|| format!("Invalid include pattern {:?}", pattern))?;

            for entry in entries {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable path: {}", e);
                        continue;
                    }
                };
                if !path.is_file() {
                    continue;
                }
                let relative = match path.strip_prefix(root) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => continue,
                };
                if !self.is_excluded(&relative) {
                    files.insert(relative);
                }
            }
        }

        tracing::debug!("File list resolved to {} file(s)", files.len());
        Ok(files.into_iter().collect())
    }
}
