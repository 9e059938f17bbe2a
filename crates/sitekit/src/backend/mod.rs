//! Seams to the outside world.
//!
//! The [`CommandRunner`] trait covers every external program the tool runs
//! (`useradd`, `mysql`, `systemctl`, `openssl`, ...), and [`PublicIp`] the one
//! HTTP call. Production code uses the implementations in [`system`]; tests
//! substitute recording fakes.

pub mod system;

use std::io::Write;
use std::net::IpAddr;
use std::process::Output;

use crate::error::{Error, Result};

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            success: true,
            code: Some(0),
        }
    }

    /// Failed output with the given stderr and exit code.
    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            success: false,
            code: Some(code),
        }
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Runs external programs.
///
/// `Err` means the program could not be started; a program that ran and
/// exited non-zero is an `Ok` with `success == false`. Use
/// [`CommandRunner::run_checked`] to turn that into an error.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and capture its output.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run `program` with `input` written to its stdin.
    fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<CommandOutput>;

    /// Run and require a zero exit status.
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(program, args)?;
        check(program, args, output)
    }

    /// [`CommandRunner::run_with_stdin`], requiring a zero exit status.
    fn run_checked_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &[u8],
    ) -> Result<CommandOutput> {
        let output = self.run_with_stdin(program, args, input)?;
        check(program, args, output)
    }

    /// Run `program`, streaming its stdout into `out` instead of capturing it.
    ///
    /// Returns the number of bytes written; the output carries stderr and
    /// status with an empty `stdout`.
    fn run_to_writer(
        &self,
        program: &str,
        args: &[&str],
        out: &mut dyn Write,
    ) -> Result<(u64, CommandOutput)>;

    /// [`CommandRunner::run_to_writer`], requiring a zero exit status.
    fn run_checked_to_writer(&self, program: &str, args: &[&str], out: &mut dyn Write) -> Result<u64> {
        let (written, output) = self.run_to_writer(program, args, out)?;
        check(program, args, output)?;
        Ok(written)
    }
}

fn check(program: &str, args: &[&str], output: CommandOutput) -> Result<CommandOutput> {
    if output.success {
        return Ok(output);
    }
    Err(Error::CommandFailed {
        command: command_line(program, args),
        code: output.code,
        stderr: output.stderr_str().trim().to_string(),
    })
}

/// `program arg1 arg2` for logs and error messages.
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks up the host's public IP address.
pub trait PublicIp: Send + Sync {
    fn lookup(&self) -> Result<IpAddr>;
}
