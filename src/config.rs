//! Optional TOML configuration.
//!
//! ```toml
//! # kernel-inventory.toml
//! modules_dir = "usr/lib/modules"
//! host_release_command = ["uname", "-r"]
//! ```
//!
//! Every key is optional; missing keys fall back to `lib/modules` and
//! `uname -r`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::host::{HostFs, UnameCommand};
use crate::inventory::{KernelInventoryScanner, DEFAULT_MODULES_DIR};
use crate::preflight::KernelPresenceGuard;
use crate::resolver::KernelVersionResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// Module tree, relative to the rootfs.
    pub modules_dir: PathBuf,
    /// Program and arguments printing the host kernel release.
    pub host_release_command: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InventoryToml {
    modules_dir: Option<String>,
    host_release_command: Option<Vec<String>>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            modules_dir: PathBuf::from(DEFAULT_MODULES_DIR),
            host_release_command: UnameCommand::default().argv().to_vec(),
        }
    }
}

impl InventoryConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("parsing config '{}'", path.display()))
    }

    /// Parse and validate config text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let parsed: InventoryToml = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(raw) = parsed.modules_dir {
            config.modules_dir = parse_modules_dir(&raw)?;
        }

        if let Some(argv) = parsed.host_release_command {
            if argv.first().map_or(true, |program| program.trim().is_empty()) {
                bail!("host_release_command must name a program");
            }
            config.host_release_command = argv;
        }

        Ok(config)
    }

    pub fn scanner(&self) -> KernelInventoryScanner<HostFs> {
        KernelInventoryScanner::host().with_modules_dir(&self.modules_dir)
    }

    pub fn resolver(&self) -> KernelVersionResolver<HostFs, UnameCommand> {
        KernelVersionResolver::new(
            self.scanner(),
            UnameCommand::new(self.host_release_command.clone()),
        )
    }

    pub fn guard(&self) -> KernelPresenceGuard<HostFs> {
        KernelPresenceGuard::new(self.scanner())
    }
}

/// Accepts `lib/modules` or `/lib/modules`; rejects anything that could
/// leave the rootfs.
fn parse_modules_dir(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        bail!("modules_dir must not be empty");
    }

    let candidate = Path::new(trimmed);
    for component in candidate.components() {
        if !matches!(component, Component::Normal(_) | Component::CurDir) {
            bail!(
                "modules_dir contains invalid traversal/root component in '{}'",
                raw
            );
        }
    }
    Ok(candidate.to_path_buf())
}
