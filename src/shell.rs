//! Shell command execution with output capture.
//!
//! All external tools go through [`Shell::sh`]: the command line is echoed,
//! run via `sh -c` in its own process group, its stdout is streamed to the
//! console and collected, and its stderr passes straight through.
//! [`Shell::capture`] runs the same way but keeps stdout to itself.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{BuildGateError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::tool_args::ToolArgs;

/// Runs commands from a fixed working directory
#[derive(Debug, Clone)]
pub struct Shell {
    cwd: PathBuf,
}

impl Shell {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Run `command` and return everything it wrote to stdout.
    ///
    /// Fails with `error_message` if the command cannot be started or exits
    /// with a non-zero status.
    pub fn sh(&self, command: &str, error_message: &str) -> Result<String> {
        println!("> {}", command);
        info!("sh: {} (cwd={:?})", command, self.cwd);
        self.spawn_and_wait(command, error_message, true)
    }

    /// Like [`Shell::sh`], but nothing is echoed and stdout is only
    /// returned, never copied to the console.
    pub fn capture(&self, command: &str, error_message: &str) -> Result<String> {
        debug!("capture: {} (cwd={:?})", command, self.cwd);
        self.spawn_and_wait(command, error_message, false)
    }

    /// Run a typed tool invocation through [`Shell::sh`].
    pub fn run_tool<T: ToolArgs>(&self, tool: &T, error_message: &str) -> Result<String> {
        self.sh(&tool.command_line(), error_message)
    }

    fn spawn_and_wait(&self, command: &str, error_message: &str, echo: bool) -> Result<String> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .in_new_process_group()
            .spawn()
            .map_err(|e| {
                debug!("Failed to spawn {:?}: {}", command, e);
                BuildGateError::command(error_message)
            })?;
        let pid = child.id();
        register(pid);

        let captured = child
            .stdout
            .take()
            .map(|pipe| read_output(pipe, echo))
            .unwrap_or_default();
        let status = child.wait();
        unregister(pid);

        let status = status.map_err(|e| {
            debug!("Failed waiting for {:?}: {}", command, e);
            BuildGateError::command(error_message)
        })?;

        if status.success() {
            Ok(String::from_utf8_lossy(&captured).into_owned())
        } else {
            info!("{:?} exited with {}", command, status);
            Err(BuildGateError::command(error_message))
        }
    }
}

/// Collect the child's stdout, copying each chunk to ours when `echo` is set.
fn read_output(mut pipe: impl Read, echo: bool) -> Vec<u8> {
    let mut captured = Vec::new();
    let mut chunk = [0u8; 8192];
    let stdout = std::io::stdout();

    loop {
        match pipe.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                captured.extend_from_slice(&chunk[..n]);
                if echo {
                    let mut out = stdout.lock();
                    let _ = out.write_all(&chunk[..n]);
                    let _ = out.flush();
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Stopped reading tool output: {}", e);
                break;
            }
        }
    }

    captured
}

fn register(pid: u32) {
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(pid);
    }
}

fn unregister(pid: u32) {
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }
}
