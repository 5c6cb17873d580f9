//! Capabilities the scanner and resolver read the outside world through.
//!
//! The filesystem side ([`DirectoryLister`], [`EmptinessChecker`]) and the
//! build-host side ([`HostKernelRelease`]) are narrow traits so tests can
//! substitute in-memory fakes. [`HostFs`] and [`UnameCommand`] are the real
//! implementations.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::error::{KernelInventoryError, Result};

/// Lists the names of the entries directly under a directory.
pub trait DirectoryLister {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// Reports whether a directory has no entries.
pub trait EmptinessChecker {
    fn is_dir_empty(&self, dir: &Path) -> io::Result<bool>;
}

/// Returns the running build host's kernel release, unparsed.
pub trait HostKernelRelease {
    fn kernel_release(&self) -> Result<String>;
}

/// The real filesystem.
///
/// Entry names are returned sorted so scan order (and therefore the oldest
/// kernel tie-break) does not depend on the filesystem's directory order.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl DirectoryLister for HostFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        // WalkDir yields nothing below a file root; listing a file must fail.
        if !std::fs::metadata(dir)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a directory: {}", dir.display()),
            ));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            let name = entry.file_name().to_str().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("non UTF-8 entry name: {}", entry.path().display()),
                )
            })?;
            names.push(name.to_string());
        }
        Ok(names)
    }
}

impl EmptinessChecker for HostFs {
    fn is_dir_empty(&self, dir: &Path) -> io::Result<bool> {
        // read_dir follows symlinks and fails with ENOTDIR on stray files.
        Ok(std::fs::read_dir(dir)?.next().is_none())
    }
}

/// Runs a command (by default `uname -r`) and returns its trimmed stdout.
#[derive(Debug, Clone)]
pub struct UnameCommand {
    argv: Vec<String>,
}

impl UnameCommand {
    /// Use a custom argv. The first element is the program.
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        let program = self
            .argv
            .first()
            .ok_or_else(|| KernelInventoryError::host_query("empty host release command"))?;
        which::which(program).map_err(|e| {
            KernelInventoryError::host_query_caused_by(
                format!("'{}' not found in PATH", program),
                e,
            )
        })
    }
}

impl Default for UnameCommand {
    fn default() -> Self {
        Self::new(vec!["uname".to_string(), "-r".to_string()])
    }
}

impl HostKernelRelease for UnameCommand {
    fn kernel_release(&self) -> Result<String> {
        let program = self.resolve_program()?;
        let command_line = self.argv.join(" ");

        let output = Command::new(&program)
            .args(&self.argv[1..])
            .output()
            .map_err(|e| {
                KernelInventoryError::host_query_caused_by(
                    format!("executing '{}'", command_line),
                    e,
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KernelInventoryError::host_query(format!(
                "'{}' failed (status {}): {}",
                command_line,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            KernelInventoryError::host_query_caused_by(
                format!("'{}' printed non UTF-8 output", command_line),
                e,
            )
        })?;

        Ok(stdout.trim().to_string())
    }
}
