//! Lint runner: JSHint-style option sets and a single batch lint call.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::shell::Shell;
use crate::tool_args::ToolArgs;

/// Named boolean lint options, e.g. `eqeqeq: true`
pub type LintOptions = BTreeMap<String, bool>;

/// Predefined global names; `true` means the file may assign to it
pub type LintGlobals = BTreeMap<String, bool>;

/// Options shared by node and browser code
pub fn global_lint_options() -> LintOptions {
    [
        ("bitwise", true),
        ("curly", false),
        ("eqeqeq", true),
        ("forin", true),
        ("immed", true),
        ("latedef", true),
        ("newcap", true),
        ("noarg", true),
        ("noempty", true),
        ("nonew", true),
        ("regexp", true),
        ("undef", true),
        ("strict", true),
        ("trailing", true),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

pub fn node_lint_options() -> LintOptions {
    let mut options = global_lint_options();
    options.insert("node".into(), true);
    options
}

pub fn browser_lint_options() -> LintOptions {
    let mut options = global_lint_options();
    options.insert("browser".into(), true);
    options
}

/// On-disk config the linter reads via `--config`
#[derive(Debug, Serialize)]
struct LintConfigFile<'a> {
    #[serde(flatten)]
    options: &'a LintOptions,
    globals: &'a LintGlobals,
}

/// One linter run over a batch of files
#[derive(Debug, Clone)]
pub struct LintArgs {
    pub command: String,
    pub config_path: PathBuf,
    pub files: Vec<PathBuf>,
}

impl ToolArgs for LintArgs {
    fn base_command(&self) -> &str {
        &self.command
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--config".to_string(),
            self.config_path.to_string_lossy().into_owned(),
        ];
        args.extend(self.files.iter().map(|f| f.to_string_lossy().into_owned()));
        args
    }
}

/// Runs the configured linter from the project root
pub struct LintRunner<'a> {
    shell: &'a Shell,
    command: &'a str,
    scratch_dir: PathBuf,
}

impl<'a> LintRunner<'a> {
    /// `scratch_dir` receives the generated option files
    pub fn new(shell: &'a Shell, command: &'a str, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell,
            command,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Lint `files` with `options` and `globals`.
    ///
    /// Returns `Ok(false)` if the linter fails for any reason. An empty
    /// list passes without invoking the linter.
    pub fn validate_file_list(
        &self,
        name: &str,
        files: &[PathBuf],
        options: &LintOptions,
        globals: &LintGlobals,
    ) -> Result<bool> {
        if files.is_empty() {
            warn!("No files to lint for {}", name);
            return Ok(true);
        }

        let config_path = self.write_config(name, options, globals)?;
        let args = LintArgs {
            command: self.command.to_string(),
            config_path,
            files: files.to_vec(),
        };

        info!("Linting {} file(s) for {}", files.len(), name);
        match self.shell.run_tool(&args, "Lint failed") {
            Ok(_) => Ok(true),
            Err(e) => {
                info!("Linter reported failure for {}: {}", name, e);
                Ok(false)
            }
        }
    }

    fn write_config(
        &self,
        name: &str,
        options: &LintOptions,
        globals: &LintGlobals,
    ) -> Result<PathBuf> {
        let dir = self.shell.cwd().join(&self.scratch_dir);
        fs::create_dir_all(&dir)?;

        let relative = self.scratch_dir.join(format!("{}.json", name));
        let json = serde_json::to_string_pretty(&LintConfigFile { options, globals })?;
        fs::write(self.shell.cwd().join(&relative), json)?;
        Ok(relative)
    }
}

/// Where lint option files go inside the generated directory
pub fn lint_scratch_dir(generated_dir: &Path) -> PathBuf {
    generated_dir.join("lint")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_option_sets() {
        let global = global_lint_options();
        assert_eq!(global.len(), 14);
        assert_eq!(global.get("curly"), Some(&false));
        assert_eq!(global.get("eqeqeq"), Some(&true));
        assert!(!global.contains_key("node"));

        assert_eq!(node_lint_options().get("node"), Some(&true));
        assert!(!node_lint_options().contains_key("browser"));
        assert_eq!(browser_lint_options().get("browser"), Some(&true));
    }

    #[test]
    fn test_lint_args_command_line() {
        let args = LintArgs {
            command: "jshint".into(),
            config_path: PathBuf::from("generated/lint/node.json"),
            files: vec![PathBuf::from("a.js"), PathBuf::from("src/b c.js")],
        };
        assert_eq!(
            args.command_line(),
            "jshint --config generated/lint/node.json a.js 'src/b c.js'"
        );
    }

    #[test]
    fn test_empty_file_list_passes_without_running() {
        let dir = tempdir().unwrap();
        let shell = Shell::new(dir.path());
        let runner = LintRunner::new(&shell, "false", "generated/lint");
        let passed = runner
            .validate_file_list("node", &[], &node_lint_options(), &LintGlobals::new())
            .unwrap();
        assert!(passed);
        assert!(!dir.path().join("generated").exists());
    }

    #[test]
    fn test_passing_and_failing_linter() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "var a = 1;\n").unwrap();
        let shell = Shell::new(dir.path());
        let files = vec![PathBuf::from("a.js")];

        let ok = LintRunner::new(&shell, "true", "generated/lint");
        assert!(ok
            .validate_file_list("node", &files, &node_lint_options(), &LintGlobals::new())
            .unwrap());

        let failing = LintRunner::new(&shell, "false", "generated/lint");
        assert!(!failing
            .validate_file_list("node", &files, &node_lint_options(), &LintGlobals::new())
            .unwrap());
    }

    #[test]
    fn test_config_file_contents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "").unwrap();
        let shell = Shell::new(dir.path());
        let runner = LintRunner::new(&shell, "true", "generated/lint");

        let mut globals = LintGlobals::new();
        globals.insert("jQuery".into(), false);
        runner
            .validate_file_list(
                "client",
                &[PathBuf::from("a.js")],
                &browser_lint_options(),
                &globals,
            )
            .unwrap();

        let written =
            fs::read_to_string(dir.path().join("generated/lint/client.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["browser"], true);
        assert_eq!(value["curly"], false);
        assert_eq!(value["globals"]["jQuery"], false);
    }
}
