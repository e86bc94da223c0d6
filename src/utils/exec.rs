//! External command execution utilities.
//!
//! Builder-based API for running the site generator and other shell
//! commands with captured output.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! Cmd::from_slice(&["jekyll", "build"])
//!     .cwd(root)
//!     .envs([("SITE_SOURCE", "/site")])
//!     .run()?;
//! ```

use anyhow::{Context, Result};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Output},
};

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["jekyll", "build"]`).
    /// Empty arguments are dropped as with [`Cmd::arg`].
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let Some((program, args)) = cmd.split_first() else {
            return Self::default();
        };
        args.iter().fold(Self::new(program), |cmd, arg| cmd.arg(arg))
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command, failing on a non-zero exit status.
    pub fn run(self) -> Result<Output> {
        let name = self.program_name();
        if name.is_empty() {
            anyhow::bail!("empty command");
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        if !output.status.success() {
            anyhow::bail!(format_error(&name, &output));
        }

        log_output(&name, &output);
        Ok(output)
    }
}

/// Log captured stdout lines in verbose mode.
fn log_output(name: &str, output: &Output) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        crate::debug!(name; "{}", line.trim_end());
    }
}

fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };

    if detail.is_empty() {
        format!("Command `{name}` failed with {}", output.status)
    } else {
        format!("Command `{name}` failed with {}\n{detail}", output.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_splits_program() {
        let cmd = Cmd::from_slice(&["jekyll", "build", "", "--trace"]);
        assert_eq!(cmd.program_name(), "jekyll");
        assert_eq!(cmd.args, vec![OsString::from("build"), OsString::from("--trace")]);
    }

    #[test]
    fn test_empty_args_skipped() {
        let cmd = Cmd::new("echo").arg("").arg("hi");
        assert_eq!(cmd.args, vec![OsString::from("hi")]);
    }

    #[test]
    fn test_empty_command_errors() {
        let empty: [&str; 0] = [];
        assert!(Cmd::from_slice(&empty).run().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_stderr() {
        let err = Cmd::from_slice(&["sh", "-c", "echo broken >&2; exit 3"])
            .run()
            .unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("broken"));
        assert!(message.contains("`sh`"));
    }

    #[cfg(unix)]
    #[test]
    fn test_envs_reach_child() {
        let output = Cmd::from_slice(&["sh", "-c", "printf %s \"$SITE_FLAG\""])
            .envs([("SITE_FLAG", "on")])
            .run()
            .unwrap();
        assert_eq!(output.stdout, b"on");
    }
}
