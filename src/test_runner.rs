//! Server-side and browser test runs.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{BuildGateError, Result};
use crate::shell::Shell;
use crate::tool_args::ToolArgs;

/// Server-side test runner over a list of test files
#[derive(Debug, Clone)]
pub struct NodeTestArgs {
    pub command: String,
    pub files: Vec<PathBuf>,
}

impl ToolArgs for NodeTestArgs {
    fn base_command(&self) -> &str {
        &self.command
    }

    fn to_cli_args(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect()
    }
}

/// Browser test launcher; takes no extra arguments
#[derive(Debug, Clone)]
pub struct BrowserTestArgs {
    pub command: String,
}

impl ToolArgs for BrowserTestArgs {
    fn base_command(&self) -> &str {
        &self.command
    }

    fn to_cli_args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Run server-side tests. Any failure becomes `Tests failed`.
pub fn run_node_tests(shell: &Shell, args: &NodeTestArgs) -> Result<()> {
    if args.files.is_empty() {
        warn!("No server-side test files found");
        return Ok(());
    }

    info!("Running {} server-side test file(s)", args.files.len());
    shell
        .run_tool(args, "Tests failed")
        .map(|_| ())
        .map_err(|_| BuildGateError::tests("Tests failed"))
}

/// Run the browser tests and require every browser to report execution.
pub fn run_browser_tests(shell: &Shell, args: &BrowserTestArgs, browsers: &[String]) -> Result<()> {
    let output = shell
        .run_tool(args, "Client tests failed")
        .map_err(|e| BuildGateError::tests(e.to_string()))?;

    for browser in browsers {
        assert_browser_is_tested(browser, &output)?;
    }
    info!("All {} browser(s) executed tests", browsers.len());
    Ok(())
}

/// The launcher prints `<browser>: Executed ...` for every browser it drove.
pub fn assert_browser_is_tested(browser: &str, output: &str) -> Result<()> {
    let search = format!("{}: Executed", browser);
    if output.contains(&search) {
        Ok(())
    } else {
        Err(BuildGateError::tests(format!("{} was not tested!", browser)))
    }
}
