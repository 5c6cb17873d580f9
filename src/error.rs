//! Error type for kernel inventory and version resolution.
//!
//! Every failure the scanner, parser, resolver or guard can produce is a
//! variant of [`KernelInventoryError`], so callers can match on the kind
//! instead of inspecting message text. Underlying causes are kept as
//! `#[source]` and show up in `{:#}` / `source()` chains.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, KernelInventoryError>;

#[derive(Error, Debug)]
pub enum KernelInventoryError {
    /// A version string does not match the kernel release grammar.
    #[error("failed to parse kernel version ({raw})")]
    Parse { raw: String },

    /// Listing the modules directory or checking an entry failed.
    #[error("failed to {action} ({})", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scan succeeded but found no kernel directories.
    #[error("no installed kernels found in image (searched {})", modules_dir.display())]
    EmptyInventory { modules_dir: PathBuf },

    /// Operator-facing form of an empty inventory, raised by the presence guard.
    #[error("no installed kernel found")]
    NoKernelInstalled,

    /// The build host's kernel release could not be queried or understood.
    #[error("failed to get kernel version using uname: {reason}")]
    HostQuery {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl KernelInventoryError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn host_query(reason: impl Into<String>) -> Self {
        Self::HostQuery {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn host_query_caused_by(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::HostQuery {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_io_error_keeps_cause() {
        let err = KernelInventoryError::io(
            "enumerate kernels under",
            "/mnt/root/lib/modules",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(
            err.to_string(),
            "failed to enumerate kernels under (/mnt/root/lib/modules)"
        );
        let source = err.source().expect("io error should carry its cause");
        assert_eq!(source.to_string(), "gone");
    }

    #[test]
    fn test_no_kernel_message_is_operator_facing() {
        assert_eq!(
            KernelInventoryError::NoKernelInstalled.to_string(),
            "no installed kernel found"
        );
    }

    #[test]
    fn test_host_query_without_cause() {
        let err = KernelInventoryError::host_query("uname exited with status 1");
        assert!(err.source().is_none());
        assert!(err.to_string().contains("uname exited with status 1"));
    }
}
