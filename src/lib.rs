//! buildgate library
//!
//! Task graph, tool wrappers and the runtime version gate behind the
//! `buildgate` binary.

pub mod checklist;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_list;
pub mod lint;
pub mod process_guard;
pub mod shell;
pub mod tasks;
pub mod test_runner;
pub mod tool_args;
pub mod version;

pub use config::BuildConfig;
pub use error::{BuildGateError, Result};
pub use shell::Shell;
pub use tasks::{TaskContext, TaskGraph, TaskRunner};
pub use version::{
    check, compare, ComparisonPolicy, GateResult, VersionGate, VersionGateError, VersionTriple,
};
