//! Installed-kernel inventory for OS image customization.
//!
//! Answers two questions about a target rootfs before an image is
//! finalized: which kernels are installed, and how their versions compare
//! (to each other and to the build host's running kernel).
//!
//! - **Version model** - [`TolerantVersion`], ordering only the leading
//!   numeric run of a kernel release
//! - **Inventory** - non-empty release directories under `lib/modules`
//! - **Resolver** - parsed versions, oldest installed kernel, build host kernel
//! - **Preflight** - fail the build when no kernel is installed
//!
//! # Architecture
//!
//! ```text
//! preflight::KernelPresenceGuard ──┐
//! resolver::KernelVersionResolver ─┤
//!     │                            │
//!     ├── inventory::KernelInventoryScanner (raw release names)
//!     │       └── host::{DirectoryLister, EmptinessChecker}
//!     ├── host::HostKernelRelease (uname -r)
//!     └── version::parse_kernel_version -> TolerantVersion
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kernel_inventory::{check_installed_kernel, oldest_installed_kernel_version};
//! use std::path::Path;
//!
//! let rootfs = Path::new("/mnt/image");
//! check_installed_kernel(rootfs)?;
//! println!("oldest kernel: {}", oldest_installed_kernel_version(rootfs)?);
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod inventory;
pub mod preflight;
pub mod resolver;
pub mod version;

pub use config::InventoryConfig;
pub use error::{KernelInventoryError, Result};
pub use inventory::{installed_kernel_strings, InstalledKernel, KernelInventoryScanner};
pub use preflight::{check_installed_kernel, KernelPresenceGuard};
pub use resolver::{
    build_host_kernel_version, installed_kernel_versions, oldest_installed_kernel_version,
    KernelVersionResolver,
};
pub use version::{parse_kernel_version, TolerantVersion};
