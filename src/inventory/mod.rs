//! Installed kernel inventory.
//!
//! A kernel package leaves one directory per release under the rootfs's
//! module tree (`/lib/modules/<release>`). The scanner lists those
//! directories and drops the empty ones: some distros (Azure Linux 2.0
//! among them) leave an empty release directory behind when the kernel
//! package is removed.
//!
//! Nothing is cached. Every call reads the filesystem again.

use std::path::{Path, PathBuf};

use crate::error::{KernelInventoryError, Result};
use crate::host::{DirectoryLister, EmptinessChecker, HostFs};
use crate::version::{parse_kernel_version, TolerantVersion};

/// Default module tree location, relative to the rootfs.
pub const DEFAULT_MODULES_DIR: &str = "lib/modules";

/// One kernel found in the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledKernel {
    /// Directory name under the module tree, e.g. `6.11.6-200.fc40.x86_64`.
    pub name: String,
    /// Version parsed from `name`.
    pub version: TolerantVersion,
}

/// Lists non-empty kernel release directories under a rootfs.
#[derive(Debug, Clone)]
pub struct KernelInventoryScanner<F = HostFs> {
    fs: F,
    modules_dir: PathBuf,
}

impl KernelInventoryScanner<HostFs> {
    /// Scanner over the real filesystem using `lib/modules`.
    pub fn host() -> Self {
        Self::new(HostFs)
    }
}

impl Default for KernelInventoryScanner<HostFs> {
    fn default() -> Self {
        Self::host()
    }
}

impl<F> KernelInventoryScanner<F>
where
    F: DirectoryLister + EmptinessChecker,
{
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            modules_dir: PathBuf::from(DEFAULT_MODULES_DIR),
        }
    }

    /// Look for kernels somewhere other than `lib/modules` (e.g. `usr/lib/modules`).
    ///
    /// `modules_dir` is taken relative to the rootfs; a leading `/` is ignored.
    /// Callers outside the crate go through [`crate::InventoryConfig`], which
    /// rejects paths that leave the rootfs.
    pub(crate) fn with_modules_dir(mut self, modules_dir: impl AsRef<Path>) -> Self {
        let dir = modules_dir.as_ref();
        self.modules_dir = dir.strip_prefix("/").unwrap_or(dir).to_path_buf();
        self
    }

    /// Module tree location relative to the rootfs.
    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    /// Absolute module tree path for `rootfs`.
    pub fn modules_path(&self, rootfs: &Path) -> PathBuf {
        rootfs.join(&self.modules_dir)
    }

    /// Names of the non-empty release directories, in lister order.
    ///
    /// An empty result is not an error; whether "no kernels" matters is
    /// the caller's call.
    pub fn installed_kernel_strings(&self, rootfs: &Path) -> Result<Vec<String>> {
        let parent = self.modules_path(rootfs);
        let names = self
            .fs
            .list_dir(&parent)
            .map_err(|e| KernelInventoryError::io("enumerate kernels under", &parent, e))?;

        let mut kernels = Vec::with_capacity(names.len());
        for name in names {
            let kernel_path = parent.join(&name);
            let empty = self.fs.is_dir_empty(&kernel_path).map_err(|e| {
                KernelInventoryError::io("check if directory is empty", &kernel_path, e)
            })?;

            if empty {
                log::debug!("skipping empty kernel directory {}", kernel_path.display());
                continue;
            }

            log::debug!("found kernel directory {}", kernel_path.display());
            kernels.push(name);
        }

        Ok(kernels)
    }

    /// Non-empty release directories paired with their parsed versions.
    ///
    /// Fails on the first name that is not a kernel release.
    pub fn installed_kernels(&self, rootfs: &Path) -> Result<Vec<InstalledKernel>> {
        self.installed_kernel_strings(rootfs)?
            .into_iter()
            .map(|name| -> Result<InstalledKernel> {
                let version = parse_kernel_version(&name)?;
                Ok(InstalledKernel { name, version })
            })
            .collect()
    }
}

/// [`KernelInventoryScanner::installed_kernel_strings`] over the real filesystem.
pub fn installed_kernel_strings(rootfs: &Path) -> Result<Vec<String>> {
    KernelInventoryScanner::host().installed_kernel_strings(rootfs)
}
