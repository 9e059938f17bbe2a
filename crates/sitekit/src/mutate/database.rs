//! MySQL database and user, driven through the `mysql` client.
//!
//! SQL goes in on stdin so passwords never show up in the process list.
//! Every name is checked against [`validate::database_name`] before it is
//! spliced into a statement.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};
use crate::host::Host;
use crate::validate;

fn exec_sql(host: &Host<'_>, sql: &str) -> Result<String> {
    let output = host
        .runner
        .run_checked_with_stdin("mysql", &["-N", "-B"], sql.as_bytes())?;
    Ok(output.stdout_str())
}

/// Create database `name`, a same-named `@localhost` user with `password`,
/// and grant it everything on the database.
pub fn create(host: &Host<'_>, name: &str, password: &str) -> Result<()> {
    validate::database_name(name)?;
    validate::password(password)?;

    exec_sql(host, &format!("CREATE DATABASE `{name}`;"))?;
    log::info!("Created database {name}");
    exec_sql(
        host,
        &format!("CREATE USER '{name}'@'localhost' IDENTIFIED BY '{password}';"),
    )?;
    log::info!("Created database user {name}");
    exec_sql(
        host,
        &format!("GRANT ALL PRIVILEGES ON `{name}`.* TO '{name}'@'localhost';\nFLUSH PRIVILEGES;"),
    )?;
    log::info!("Granted privileges on {name}");
    Ok(())
}

/// Whether database `name` exists.
pub fn exists(host: &Host<'_>, name: &str) -> Result<bool> {
    validate::database_name(name)?;
    let out = exec_sql(
        host,
        &format!(
            "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = '{name}';"
        ),
    )?;
    Ok(out.lines().any(|line| line.trim() == name))
}

/// `mysqldump` database `name` into gzip file `dest`.
///
/// The dump is streamed through the encoder, never held in memory. An empty
/// dump is an error and leaves no file behind.
pub fn dump(host: &Host<'_>, name: &str, dest: &Path) -> Result<u64> {
    validate::database_name(name)?;
    let result = stream_dump(host, name, dest);
    if result.is_err() {
        let _ = std::fs::remove_file(dest);
    }
    let written = result?;
    log::info!("Dumped database {name} to {} ({written} bytes)", dest.display());
    Ok(written)
}

fn stream_dump(host: &Host<'_>, name: &str, dest: &Path) -> Result<u64> {
    let mut encoder = GzEncoder::new(File::create(dest)?, Compression::default());
    let written =
        host.runner
            .run_checked_to_writer("mysqldump", &["--single-transaction", name], &mut encoder)?;
    if written == 0 {
        return Err(Error::StepFailed {
            step: format!("dump database {name}"),
            message: "mysqldump produced no output".to_string(),
        });
    }
    encoder.finish()?.sync_all()?;
    Ok(written)
}

/// Drop the database and its user; both may already be gone.
pub fn remove(host: &Host<'_>, name: &str) -> Result<()> {
    validate::database_name(name)?;
    exec_sql(
        host,
        &format!(
            "DROP DATABASE IF EXISTS `{name}`;\nDROP USER IF EXISTS '{name}'@'localhost';\nFLUSH PRIVILEGES;"
        ),
    )?;
    log::info!("Dropped database and user {name}");
    Ok(())
}
