//! Resource mutators.
//!
//! Each submodule owns one class of host resource. Mutators do one thing and
//! report whether they changed anything; sequencing and failure policy live
//! in the orchestrators under [`crate::ops`]. Removals treat an already
//! absent resource as success.

pub mod account;
pub mod database;
pub mod pool;
pub mod service;
pub mod vhost;

use std::fs;
use std::io;
use std::path::Path;

/// Remove a file, returning whether it existed.
pub(crate) fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove a directory tree, returning whether it existed.
pub(crate) fn remove_dir_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
