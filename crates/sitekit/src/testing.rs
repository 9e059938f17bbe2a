//! Test doubles and a scratch host.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use crate::backend::{CommandOutput, CommandRunner, PublicIp};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::inspect::Accounts;
use crate::layout::HostLayout;
use crate::progress::NoProgress;
use crate::types::{PhpVersion, WebServer};

// ============================================================================
// FakeRunner
// ============================================================================

/// One recorded command.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Invocation {
    /// Whether any argument or the stdin text contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a.contains(needle))
            || self.stdin.as_deref().is_some_and(|s| s.contains(needle))
    }
}

struct Rule {
    program: String,
    needle: String,
    output: CommandOutput,
}

/// Records every command and answers from scripted rules.
///
/// Unscripted commands succeed with empty output. The most recently added
/// matching rule wins.
type Hook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    rules: Mutex<Vec<Rule>>,
    hooks: Mutex<Vec<(String, Hook)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `program` calls mentioning `needle` with `output`.
    pub fn respond(&self, program: &str, needle: &str, output: CommandOutput) {
        self.rules.lock().unwrap().push(Rule {
            program: program.to_string(),
            needle: needle.to_string(),
            output,
        });
    }

    /// Fail `program` calls mentioning `needle`.
    pub fn fail_when(&self, program: &str, needle: &str, code: i32, stderr: &str) {
        self.respond(program, needle, CommandOutput::failed(code, stderr));
    }

    /// Run `hook` every time `program` is invoked, before it answers.
    pub fn on_run(&self, program: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .push((program.to_string(), Box::new(hook)));
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls_to(program).len()
    }

    /// Whether `program` ran with an argument or stdin mentioning `needle`.
    pub fn invoked(&self, program: &str, needle: &str) -> bool {
        self.calls_to(program).iter().any(|c| c.mentions(needle))
    }

    /// Units passed to `systemctl restart`, in order.
    pub fn restarts(&self) -> Vec<String> {
        self.calls_to("systemctl")
            .into_iter()
            .filter(|c| c.args.first().is_some_and(|a| a == "restart"))
            .filter_map(|c| c.args.get(1).cloned())
            .collect()
    }

    fn record(&self, program: &str, args: &[&str], stdin: Option<&[u8]>) -> CommandOutput {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            stdin: stdin.map(|s| String::from_utf8_lossy(s).to_string()),
        };
        let output = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.program == program && (r.needle.is_empty() || invocation.mentions(&r.needle)))
            .map_or_else(|| CommandOutput::ok(""), |r| r.output.clone());
        self.calls.lock().unwrap().push(invocation);
        for (_, hook) in self.hooks.lock().unwrap().iter().filter(|(p, _)| p == program) {
            hook();
        }
        output
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        Ok(self.record(program, args, None))
    }

    fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<CommandOutput> {
        Ok(self.record(program, args, Some(input)))
    }

    fn run_to_writer(
        &self,
        program: &str,
        args: &[&str],
        out: &mut dyn std::io::Write,
    ) -> Result<(u64, CommandOutput)> {
        let mut output = self.record(program, args, None);
        out.write_all(&output.stdout)?;
        let written = output.stdout.len() as u64;
        output.stdout.clear();
        Ok((written, output))
    }
}

// ============================================================================
// FakeAccounts
// ============================================================================

/// In-memory account database and path ownership.
#[derive(Default)]
pub struct FakeAccounts {
    users: Mutex<HashSet<String>>,
    owners: Mutex<HashMap<PathBuf, String>>,
}

impl FakeAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, name: &str) {
        self.users.lock().unwrap().insert(name.to_string());
    }

    pub fn remove_user(&self, name: &str) {
        self.users.lock().unwrap().remove(name);
    }

    pub fn set_owner(&self, path: &Path, owner: &str) {
        self.owners
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), owner.to_string());
    }
}

impl Accounts for FakeAccounts {
    fn user_exists(&self, name: &str) -> bool {
        self.users.lock().unwrap().contains(name)
    }

    fn owner_name(&self, path: &Path) -> Option<String> {
        if !path.exists() {
            return None;
        }
        let owner = self.owners.lock().unwrap().get(path).cloned()?;
        self.user_exists(&owner).then_some(owner)
    }
}

// ============================================================================
// Public IP
// ============================================================================

/// Always answers with the same address.
pub struct FixedIp(pub IpAddr);

impl Default for FixedIp {
    fn default() -> Self {
        Self(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 10)))
    }
}

impl PublicIp for FixedIp {
    fn lookup(&self) -> Result<IpAddr> {
        Ok(self.0)
    }
}

/// Always fails.
pub struct UnreachableIp;

impl PublicIp for UnreachableIp {
    fn lookup(&self) -> Result<IpAddr> {
        Err(Error::IpLookup("connection timed out".to_string()))
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// A scratch host rooted in a temp dir, with fake backends.
pub struct Fixture {
    pub dir: TempDir,
    pub layout: HostLayout,
    pub runner: FakeRunner,
    pub accounts: FakeAccounts,
    pub ip: FixedIp,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout = HostLayout::rooted(dir.path());
        Self {
            dir,
            layout,
            runner: FakeRunner::new(),
            accounts: FakeAccounts::new(),
            ip: FixedIp::default(),
        }
    }

    /// A host using this fixture's fakes.
    pub fn host(&self, server: WebServer) -> Host<'_> {
        Host::new(self.layout.clone(), &self.runner, &self.accounts, &self.ip)
            .with_web_server(server)
            .with_progress(&NoProgress)
    }

    /// Live socket plus an empty pool directory for `version`.
    pub fn install_php(&self, version: &str) -> PhpVersion {
        let v: PhpVersion = version.parse().unwrap();
        touch(&self.layout.php_socket(&v), "");
        fs::create_dir_all(self.layout.pool_dir(&v)).unwrap();
        v
    }

    /// Stop a PHP version: the socket goes away, configs stay.
    pub fn remove_socket(&self, version: &str) {
        let v: PhpVersion = version.parse().unwrap();
        fs::remove_file(self.layout.php_socket(&v)).unwrap();
    }

    /// Home directory with an `html/` tree, owned by an existing `owner`.
    pub fn add_home(&self, domain: &str, owner: &str) -> PathBuf {
        let home = self.layout.home_dir(domain);
        touch(&home.join("html/index.php"), "<?php echo 'hi';");
        self.accounts.add_user(owner);
        self.accounts.set_owner(&home, owner);
        home
    }

    pub fn add_pool(&self, version: &str, username: &str) -> PathBuf {
        let v: PhpVersion = version.parse().unwrap();
        let path = self.layout.pool_file(&v, username);
        touch(&path, &format!("[{username}]\nuser = {username}\n"));
        path
    }

    pub fn add_vhost(&self, server: WebServer, domain: &str) -> PathBuf {
        let path = self.layout.vhost_file(server, domain);
        touch(&path, &format!("# {server} vhost for {domain}\n"));
        path
    }

    pub fn add_tls(&self, domain: &str) {
        touch(&self.layout.tls_key(domain), "KEY");
        touch(&self.layout.tls_cert(domain), "CERT");
    }

    pub fn write_record(&self, domain: &str, json: &str) -> PathBuf {
        let path = self.layout.record_file(domain);
        touch(&path, json);
        path
    }

    /// Answer the database existence check for `db` and dump it.
    pub fn add_database(&self, db: &str) {
        self.runner
            .respond("mysql", "SCHEMATA", CommandOutput::ok(format!("{db}\n")));
        self.runner.respond(
            "mysqldump",
            db,
            CommandOutput::ok(format!("-- MySQL dump of {db}\nCREATE TABLE t (id INT);\n")),
        );
    }
}

/// Write `content` to `path`, creating parent directories.
pub fn touch(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
