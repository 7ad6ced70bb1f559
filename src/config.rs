//! Build configuration: required runtime version, tool commands and the
//! file list patterns each task works on.
//!
//! Loaded from JSON. Every field has a default, so an absent or partial
//! `buildgate.json` behaves like the stock setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::version::VersionTriple;

/// File looked up in the project root when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "buildgate.json";

/// Include/exclude patterns for one file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilePatterns {
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl FilePatterns {
    fn new(include: &[&str], exclude: &[&str]) -> Self {
        Self {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// External tool commands. Each is run through `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolCommands {
    /// Prints the runtime version, e.g. `v0.8.10`
    pub version_check: String,
    /// Linter; receives `--config <options.json>` followed by the files
    pub lint: String,
    /// Server-side test runner; receives the test files
    pub node_test: String,
    /// Browser test launcher; its stdout is scanned for each browser
    pub browser_test: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            version_check: "node --version".into(),
            lint: "node_modules/.bin/jshint".into(),
            node_test: "node_modules/.bin/nodeunit".into(),
            browser_test: "node node_modules/.bin/testacular run".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Required runtime version, `v<major>.<minor>.<patch>`
    pub required_node_version: String,
    /// Browsers the client test run must report as executed
    pub supported_browsers: Vec<String>,
    /// Scratch directory removed by `clean`
    pub generated_dir: String,
    pub commands: ToolCommands,
    pub node_files: FilePatterns,
    pub node_test_files: FilePatterns,
    pub client_files: FilePatterns,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            required_node_version: "v0.8.10".into(),
            supported_browsers: [
                "IE 8.0",
                "IE 9.0",
                "Firefox 15.0",
                "Chrome 22.0",
                "Safari 6.0",
                "Safari 5.1", // iOS
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            generated_dir: "generated".into(),
            commands: ToolCommands::default(),
            node_files: FilePatterns::new(
                &["**/*.js"],
                &["node_modules", "testacular.conf.js", "src/client/**"],
            ),
            node_test_files: FilePatterns::new(
                &["**/_*_test.js"],
                &["node_modules", "src/client/**"],
            ),
            client_files: FilePatterns::new(&["src/client/**/*.js"], &[]),
        }
    }
}

impl BuildConfig {
    /// Temporary test file directory, `<generated>/test`
    pub fn test_file_dir(&self) -> PathBuf {
        Path::new(&self.generated_dir).join("test")
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Load `explicit` if given, else `<root>/buildgate.json` if it exists,
    /// else the defaults.
    pub fn resolve(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        let candidate = root.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using configuration file {:?}", candidate);
            Self::load_from_file(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        VersionTriple::parse("required Node version", &self.required_node_version)?;

        if self.generated_dir.trim().is_empty() {
            anyhow::bail!("generated_dir must not be empty");
        }
        if !is_contained(Path::new(&self.generated_dir)) {
            anyhow::bail!(
                "generated_dir must be a directory inside the project root (was '{}')",
                self.generated_dir
            );
        }

        if self.supported_browsers.is_empty() {
            anyhow::bail!("At least one supported browser must be listed");
        }
        if self.supported_browsers.iter().any(|b| b.trim().is_empty()) {
            anyhow::bail!("Supported browser names must not be empty");
        }

        for (name, command) in [
            ("version_check", &self.commands.version_check),
            ("lint", &self.commands.lint),
            ("node_test", &self.commands.node_test),
            ("browser_test", &self.commands.browser_test),
        ] {
            if command.trim().is_empty() {
                anyhow::bail!("Command '{}' must not be empty", name);
            }
        }

        for (name, patterns) in [
            ("node_files", &self.node_files),
            ("node_test_files", &self.node_test_files),
            ("client_files", &self.client_files),
        ] {
            if patterns.include.is_empty() {
                anyhow::bail!("File list '{}' needs at least one include pattern", name);
            }
            for pattern in patterns.include.iter().chain(&patterns.exclude) {
                glob::Pattern::new(pattern)
                    .with_context(|| format!("Invalid pattern {:?} in '{}'", pattern, name))?;
            }
        }

        Ok(())
    }
}

/// True for a relative path that names something strictly below the
/// directory it is joined onto: no root, no `..`, at least one real
/// component.
pub fn is_contained(path: &Path) -> bool {
    let mut named = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => named = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    named
}
