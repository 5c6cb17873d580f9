//! Preflight checks run before an image is finalized.
//!
//! Catches the operator mistake of removing the kernel package during
//! customization without installing a replacement. Left unchecked that
//! produces an image that only fails at boot.
//!
//! # Example
//!
//! ```rust,ignore
//! use kernel_inventory::preflight::check_installed_kernel;
//! use std::path::Path;
//!
//! if let Err(e) = check_installed_kernel(Path::new("/mnt/image")) {
//!     eprintln!("{}", e);
//! }
//! ```

use std::path::Path;

use crate::error::{KernelInventoryError, Result};
use crate::host::{DirectoryLister, EmptinessChecker, HostFs};
use crate::inventory::KernelInventoryScanner;

/// Verifies that at least one kernel is present in a rootfs.
///
/// Presence only: a non-empty release directory passes even if the kernel
/// in it would not boot.
#[derive(Debug, Clone)]
pub struct KernelPresenceGuard<F = HostFs> {
    scanner: KernelInventoryScanner<F>,
}

impl Default for KernelPresenceGuard<HostFs> {
    fn default() -> Self {
        Self::new(KernelInventoryScanner::host())
    }
}

impl<F> KernelPresenceGuard<F>
where
    F: DirectoryLister + EmptinessChecker,
{
    pub fn new(scanner: KernelInventoryScanner<F>) -> Self {
        Self { scanner }
    }

    /// # Returns
    ///
    /// * `Ok(())` if at least one non-empty kernel directory exists
    /// * `Err(NoKernelInstalled)` if none do
    /// * Scanner errors unchanged
    pub fn check_installed_kernel(&self, rootfs: &Path) -> Result<()> {
        let kernels = self.scanner.installed_kernel_strings(rootfs)?;
        if kernels.is_empty() {
            return Err(KernelInventoryError::NoKernelInstalled);
        }

        log::debug!(
            "{} installed kernel(s) under {}",
            kernels.len(),
            self.scanner.modules_path(rootfs).display()
        );
        Ok(())
    }
}

/// [`KernelPresenceGuard::check_installed_kernel`] over the real filesystem.
pub fn check_installed_kernel(rootfs: &Path) -> Result<()> {
    KernelPresenceGuard::<HostFs>::default().check_installed_kernel(rootfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::fake::FakeFs;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_installed_kernel_success() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("lib/modules/6.6.47.1-1.azl3/kernel")).unwrap();
        assert!(check_installed_kernel(temp.path()).is_ok());
    }

    #[test]
    fn test_check_installed_kernel_only_stale_dirs() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("lib/modules/5.15.153.1-2.cm2")).unwrap();
        assert!(matches!(
            check_installed_kernel(temp.path()),
            Err(KernelInventoryError::NoKernelInstalled)
        ));
    }

    #[test]
    fn test_presence_is_not_validity() {
        // Unparsable names still count as present
        let fs = FakeFs::default()
            .dir("/img/lib/modules", &["custom-kernel"])
            .dir("/img/lib/modules/custom-kernel", &["vmlinuz"]);
        let guard = KernelPresenceGuard::new(KernelInventoryScanner::new(fs));
        assert!(guard.check_installed_kernel(Path::new("/img")).is_ok());
    }

    #[test]
    fn test_scan_failure_is_not_masked() {
        let guard = KernelPresenceGuard::new(KernelInventoryScanner::new(FakeFs::default()));
        assert!(matches!(
            guard.check_installed_kernel(Path::new("/img")),
            Err(KernelInventoryError::Io { .. })
        ));
    }
}
