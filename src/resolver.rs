//! Kernel version resolution over a rootfs and the build host.
//!
//! # Example
//!
//! ```rust,ignore
//! use kernel_inventory::resolver::KernelVersionResolver;
//! use std::path::Path;
//!
//! let resolver = KernelVersionResolver::host();
//! let oldest = resolver.oldest_installed_kernel_version(Path::new("/mnt/image"))?;
//! let host = resolver.build_host_kernel_version()?;
//! if oldest > host {
//!     println!("image kernel {} is newer than the build host ({})", oldest, host);
//! }
//! ```

use std::path::Path;

use crate::error::{KernelInventoryError, Result};
use crate::host::{DirectoryLister, EmptinessChecker, HostFs, HostKernelRelease, UnameCommand};
use crate::inventory::{InstalledKernel, KernelInventoryScanner};
use crate::version::{parse_kernel_version, TolerantVersion};

/// Combines the inventory scanner, the version parser and the host query.
#[derive(Debug, Clone)]
pub struct KernelVersionResolver<F = HostFs, H = UnameCommand> {
    scanner: KernelInventoryScanner<F>,
    host: H,
}

impl KernelVersionResolver<HostFs, UnameCommand> {
    /// Resolver over the real filesystem, querying `uname -r`.
    pub fn host() -> Self {
        Self::new(KernelInventoryScanner::host(), UnameCommand::default())
    }
}

impl Default for KernelVersionResolver<HostFs, UnameCommand> {
    fn default() -> Self {
        Self::host()
    }
}

impl<F, H> KernelVersionResolver<F, H>
where
    F: DirectoryLister + EmptinessChecker,
    H: HostKernelRelease,
{
    pub fn new(scanner: KernelInventoryScanner<F>, host: H) -> Self {
        Self { scanner, host }
    }

    pub fn scanner(&self) -> &KernelInventoryScanner<F> {
        &self.scanner
    }

    /// Raw release directory names, straight from the scanner.
    pub fn installed_kernel_strings(&self, rootfs: &Path) -> Result<Vec<String>> {
        self.scanner.installed_kernel_strings(rootfs)
    }

    /// Parsed versions of every installed kernel, in scan order.
    pub fn installed_kernel_versions(&self, rootfs: &Path) -> Result<Vec<TolerantVersion>> {
        self.installed_kernel_strings(rootfs)?
            .iter()
            .map(|name| parse_kernel_version(name))
            .collect()
    }

    /// Installed kernel with the lowest version.
    ///
    /// Equal versions keep the one seen first in scan order.
    pub fn oldest_installed_kernel(&self, rootfs: &Path) -> Result<InstalledKernel> {
        let kernels = self.scanner.installed_kernels(rootfs)?;
        let oldest = oldest_by_version(kernels, |kernel| &kernel.version).ok_or_else(|| {
            KernelInventoryError::EmptyInventory {
                modules_dir: self.scanner.modules_path(rootfs),
            }
        })?;

        log::info!(
            "oldest installed kernel: {} (version {})",
            oldest.name,
            oldest.version
        );
        Ok(oldest)
    }

    /// Lowest installed kernel version.
    pub fn oldest_installed_kernel_version(&self, rootfs: &Path) -> Result<TolerantVersion> {
        let versions = self.installed_kernel_versions(rootfs)?;
        oldest_by_version(versions, |version| version).ok_or_else(|| {
            KernelInventoryError::EmptyInventory {
                modules_dir: self.scanner.modules_path(rootfs),
            }
        })
    }

    /// Version of the kernel the build host is running.
    ///
    /// Output the parser rejects is reported as a host query failure.
    pub fn build_host_kernel_version(&self) -> Result<TolerantVersion> {
        let release = self.host.kernel_release()?;
        let release = release.trim();

        let version = parse_kernel_version(release).map_err(|e| {
            KernelInventoryError::host_query_caused_by(
                format!("unrecognized kernel release '{}'", release),
                e,
            )
        })?;

        log::info!("build host kernel: {} (version {})", release, version);
        Ok(version)
    }
}

/// Linear minimum scan seeded with the first item; only a strictly lower
/// version replaces the current pick.
fn oldest_by_version<T>(
    items: Vec<T>,
    version_of: impl Fn(&T) -> &TolerantVersion,
) -> Option<T> {
    let mut items = items.into_iter();
    let mut oldest = items.next()?;
    for item in items {
        if version_of(&item) < version_of(&oldest) {
            oldest = item;
        }
    }
    Some(oldest)
}

/// [`KernelVersionResolver::installed_kernel_versions`] over the real filesystem.
pub fn installed_kernel_versions(rootfs: &Path) -> Result<Vec<TolerantVersion>> {
    KernelVersionResolver::host().installed_kernel_versions(rootfs)
}

/// [`KernelVersionResolver::oldest_installed_kernel_version`] over the real filesystem.
pub fn oldest_installed_kernel_version(rootfs: &Path) -> Result<TolerantVersion> {
    KernelVersionResolver::host().oldest_installed_kernel_version(rootfs)
}

/// [`KernelVersionResolver::build_host_kernel_version`] using `uname -r`.
pub fn build_host_kernel_version() -> Result<TolerantVersion> {
    KernelVersionResolver::host().build_host_kernel_version()
}
