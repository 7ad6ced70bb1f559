use clap::Parser;
use std::path::PathBuf;

use crate::version::ComparisonPolicy;

/// Environment variable consulted for strict version checking
pub const STRICT_ENV: &str = "strict";

/// buildgate - lint, test and deploy tasks behind a runtime version gate
#[derive(Parser, Debug)]
#[command(name = "buildgate")]
#[command(about = "Run build tasks (lint, test, deploy checklists) with a runtime version gate")]
#[command(version)]
pub struct Cli {
    /// Require the runtime version to match exactly instead of at least
    #[arg(long)]
    pub strict: bool,

    /// Path to a JSON configuration file (default: <directory>/buildgate.json if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root the tasks run in
    #[arg(short = 'C', long, default_value = ".")]
    pub directory: PathBuf,

    /// List described tasks and exit
    #[arg(short = 'T', long)]
    pub list: bool,

    /// Check the given version string against the required version and exit
    #[arg(long, value_name = "ACTUAL")]
    pub check_version: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Tasks to run, and KEY=VALUE settings such as `strict=true`
    #[arg(value_name = "TASK")]
    pub args: Vec<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Positional arguments that name tasks
    pub fn tasks(&self) -> Vec<String> {
        self.args
            .iter()
            .filter(|a| !a.contains('='))
            .cloned()
            .collect()
    }

    /// Value of a `KEY=VALUE` positional argument; the last one wins
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .filter_map(|a| a.split_once('='))
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .last()
    }

    /// Pick the comparison policy.
    ///
    /// `--strict` wins, then a `strict=` argument, then `env_strict` (the
    /// caller's reading of the `strict` environment variable).
    pub fn policy(&self, env_strict: Option<&str>) -> ComparisonPolicy {
        if self.strict {
            return ComparisonPolicy::Exact;
        }
        match self.setting(STRICT_ENV) {
            Some(value) => ComparisonPolicy::from_strict_flag(Some(value)),
            None => ComparisonPolicy::from_strict_flag(env_strict),
        }
    }
}
