//! Production backends: real processes and a real HTTP lookup.

use std::io::{self, Read, Write};
use std::net::IpAddr;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use super::{CommandOutput, CommandRunner, PublicIp, command_line};
use crate::error::{Error, Result};

/// Default public IP lookup endpoint.
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://checkip.amazonaws.com";

/// Runs commands with `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("Running: {}", command_line(program, args));
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(output.into())
    }

    fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<CommandOutput> {
        log::debug!("Running with stdin: {}", command_line(program, args));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from another thread so a chatty child cannot fill its
        // stdout pipe while we are still blocked writing.
        let stdin = child.stdin.take();
        let input = input.to_vec();
        let writer = thread::spawn(move || -> std::io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input)?;
            }
            Ok(())
        });

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                log::debug!("{program} closed stdin early");
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(Error::StepFailed {
                    step: command_line(program, args),
                    message: "stdin writer panicked".to_string(),
                });
            }
        }
        Ok(output.into())
    }

    fn run_to_writer(
        &self,
        program: &str,
        args: &[&str],
        out: &mut dyn Write,
    ) -> Result<(u64, CommandOutput)> {
        log::debug!("Running (streamed): {}", command_line(program, args));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stderr alongside so neither pipe can stall the child.
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || -> Vec<u8> {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf);
            }
            buf
        });

        let copied = match child.stdout.take() {
            Some(mut stdout) => io::copy(&mut stdout, out),
            None => Ok(0),
        };
        let written = match copied {
            Ok(n) => n,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = reader.join();
                return Err(e.into());
            }
        };

        let status = child.wait()?;
        let stderr = reader.join().unwrap_or_default();
        let output = CommandOutput {
            stdout: Vec::new(),
            stderr,
            success: status.success(),
            code: status.code(),
        };
        Ok((written, output))
    }
}

/// Public IP lookup over plain HTTP.
pub struct HttpPublicIp {
    agent: ureq::Agent,
    url: String,
}

impl HttpPublicIp {
    pub fn new(url: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(10)))
            .build()
            .into();
        Self {
            agent,
            url: url.into(),
        }
    }

}

impl Default for HttpPublicIp {
    fn default() -> Self {
        Self::new(DEFAULT_IP_LOOKUP_URL)
    }
}

impl PublicIp for HttpPublicIp {
    fn lookup(&self) -> Result<IpAddr> {
        log::debug!("Looking up public IP via {}", self.url);
        let body = self
            .agent
            .get(&self.url)
            .header("User-Agent", "okpanel")
            .call()
            .map_err(|e| Error::IpLookup(e.to_string()))?
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::IpLookup(e.to_string()))?;
        parse_ip(&body)
    }
}

/// Parse the body of an IP echo service.
pub fn parse_ip(body: &str) -> Result<IpAddr> {
    let trimmed = body.trim();
    trimmed
        .parse()
        .map_err(|_| Error::IpLookup(format!("unexpected response '{trimmed}'")))
}
