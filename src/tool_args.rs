//! Typed argument contracts for external tools.
//!
//! Each tool invocation is a struct implementing [`ToolArgs`]. The struct
//! decides which flags and file arguments the tool receives; the shell layer
//! only ever sees the finished, quoted command line.

/// A configured tool command plus the arguments for one run.
pub trait ToolArgs {
    /// Base command from configuration, e.g. `node_modules/.bin/jshint`.
    ///
    /// Inserted verbatim, so it may itself contain arguments.
    fn base_command(&self) -> &str;

    /// Extra arguments appended after the base command, unquoted.
    fn to_cli_args(&self) -> Vec<String>;

    /// Full command line for `sh -c`
    fn command_line(&self) -> String {
        let mut line = self.base_command().trim().to_string();
        for arg in self.to_cli_args() {
            line.push(' ');
            line.push_str(&shell_quote(&arg));
        }
        line
    }
}

/// Quote `arg` for POSIX `sh` unless it only contains safe characters.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | '+' | ',')
        });
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
