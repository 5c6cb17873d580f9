//! Tolerant version values.
//!
//! Distro kernel releases disagree on how many numeric segments they carry
//! (`6.11.6`, `5.15.153.1`, `6.8.0`) and on everything after them. A
//! [`TolerantVersion`] keeps only the leading numeric run and orders values
//! segment by segment, treating a missing trailing segment as `0`.
//!
//! ```rust
//! use kernel_inventory::version::TolerantVersion;
//!
//! let fedora: TolerantVersion = "6.11.6-200.fc40.x86_64".parse().unwrap();
//! let azl2: TolerantVersion = "5.15.153.1-2.cm2".parse().unwrap();
//! assert!(azl2 < fedora);
//! ```

pub mod kernel;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::KernelInventoryError;

pub use kernel::parse_kernel_version;

/// Numeric version prefix with tolerant ordering.
///
/// Equality follows the ordering, so `5.15 == 5.15.0`. The type has no
/// `Hash` impl for that reason.
#[derive(Debug, Clone)]
pub struct TolerantVersion {
    segments: Vec<u64>,
}

impl TolerantVersion {
    /// Build a version from already-split segments.
    pub fn new(segments: Vec<u64>) -> Self {
        Self { segments }
    }

    /// The numeric segments, as parsed.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

impl Ord for TolerantVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for idx in 0..len {
            let a = self.segments.get(idx).copied().unwrap_or(0);
            let b = other.segments.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for TolerantVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TolerantVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TolerantVersion {}

impl fmt::Display for TolerantVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for TolerantVersion {
    type Err = KernelInventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_kernel_version(s)
    }
}
