use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kernel_inventory::InventoryConfig;
use log::{LevelFilter, Log, Metadata, Record};

fn usage() -> &'static str {
    "Usage:\n  kernel-inventory [-v] [--config <file>] list <rootfs>\n  kernel-inventory [-v] [--config <file>] versions <rootfs>\n  kernel-inventory [-v] [--config <file>] oldest <rootfs>\n  kernel-inventory [-v] [--config <file>] check <rootfs>\n  kernel-inventory [-v] [--config <file>] host"
}

/// Writes `log` records to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

struct GlobalArgs {
    verbose: bool,
    config: Option<PathBuf>,
    command: Vec<String>,
}

fn parse_global_args(args: Vec<String>) -> Result<GlobalArgs> {
    let mut verbose = false;
    let mut config = None;
    let mut rest = args.into_iter();
    let mut command = Vec::new();

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-v" | "--verbose" if command.is_empty() => verbose = true,
            "--config" if command.is_empty() => {
                let path = rest
                    .next()
                    .with_context(|| format!("--config needs a file\n{}", usage()))?;
                config = Some(PathBuf::from(path));
            }
            _ => command.push(arg),
        }
    }

    Ok(GlobalArgs {
        verbose,
        config,
        command,
    })
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) =
        log::set_boxed_logger(Box::new(StderrLogger)).map(|()| log::set_max_level(level))
    {
        eprintln!("[WARN] could not install logger: {}", e);
    }
}

fn main() {
    if let Err(e) = run(std::env::args().skip(1).collect()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<()> {
    let args = parse_global_args(args)?;
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => InventoryConfig::load(path)?,
        None => InventoryConfig::default(),
    };

    dispatch(&config, &args.command, &mut io::stdout().lock())
}

fn dispatch(config: &InventoryConfig, command: &[String], out: &mut impl Write) -> Result<()> {
    match command {
        [cmd, rootfs] if cmd == "list" => list(config, Path::new(rootfs), out),
        [cmd, rootfs] if cmd == "versions" => versions(config, Path::new(rootfs), out),
        [cmd, rootfs] if cmd == "oldest" => oldest(config, Path::new(rootfs), out),
        [cmd, rootfs] if cmd == "check" => check(config, Path::new(rootfs), out),
        [cmd] if cmd == "host" => host(config, out),
        _ => bail!(usage()),
    }
}

fn list(config: &InventoryConfig, rootfs: &Path, out: &mut impl Write) -> Result<()> {
    let kernels = config
        .scanner()
        .installed_kernel_strings(rootfs)
        .with_context(|| format!("listing kernels in '{}'", rootfs.display()))?;
    for kernel in kernels {
        writeln!(out, "{}", kernel)?;
    }
    Ok(())
}

fn versions(config: &InventoryConfig, rootfs: &Path, out: &mut impl Write) -> Result<()> {
    let kernels = config
        .scanner()
        .installed_kernels(rootfs)
        .with_context(|| format!("reading kernel versions in '{}'", rootfs.display()))?;
    for kernel in kernels {
        writeln!(out, "{}\t{}", kernel.version, kernel.name)?;
    }
    Ok(())
}

fn oldest(config: &InventoryConfig, rootfs: &Path, out: &mut impl Write) -> Result<()> {
    let kernel = config
        .resolver()
        .oldest_installed_kernel(rootfs)
        .with_context(|| format!("finding oldest kernel in '{}'", rootfs.display()))?;
    writeln!(out, "{}\t{}", kernel.version, kernel.name)?;
    Ok(())
}

fn check(config: &InventoryConfig, rootfs: &Path, out: &mut impl Write) -> Result<()> {
    config
        .guard()
        .check_installed_kernel(rootfs)
        .with_context(|| format!("checking for installed kernel in '{}'", rootfs.display()))?;
    writeln!(out, "  [OK] kernel installed in {}", rootfs.display())?;
    Ok(())
}

fn host(config: &InventoryConfig, out: &mut impl Write) -> Result<()> {
    let version = config.resolver().build_host_kernel_version()?;
    writeln!(out, "{}", version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    fn rootfs_with_kernels() -> TempDir {
        let temp = TempDir::new().unwrap();
        let modules = temp.path().join("lib/modules");
        fs::create_dir_all(modules.join("6.11.6-200.fc40.x86_64/kernel")).unwrap();
        fs::create_dir_all(modules.join("5.15.153.1-2.cm2/kernel")).unwrap();
        fs::create_dir_all(modules.join("6.6.47.1-1.azl3")).unwrap();
        temp
    }

    fn dispatch_to_string(config: &InventoryConfig, command: &[&str]) -> Result<String> {
        let mut out = Vec::new();
        dispatch(config, &args(command), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_global_flags_before_command() {
        let parsed =
            parse_global_args(args(&["-v", "--config", "inv.toml", "list", "/mnt/image"]))
                .unwrap();
        assert!(parsed.verbose);
        assert_eq!(parsed.config, Some(PathBuf::from("inv.toml")));
        assert_eq!(parsed.command, args(&["list", "/mnt/image"]));
    }

    #[test]
    fn test_flags_after_command_are_positional() {
        let parsed = parse_global_args(args(&["list", "-v"])).unwrap();
        assert!(!parsed.verbose);
        assert_eq!(parsed.command, args(&["list", "-v"]));
    }

    #[test]
    fn test_config_without_value_fails() {
        let err = parse_global_args(args(&["--config"])).err().unwrap();
        assert!(err.to_string().contains("--config needs a file"));
    }

    #[test]
    fn test_unknown_command_prints_usage() {
        let config = InventoryConfig::default();
        let err = dispatch_to_string(&config, &["remove", "/mnt/image"]).unwrap_err();
        assert!(err.to_string().starts_with("Usage:"));
        assert!(dispatch_to_string(&config, &[]).is_err());
        assert!(dispatch_to_string(&config, &["list"]).is_err());
    }

    #[test]
    fn test_list_and_oldest() {
        let rootfs = rootfs_with_kernels();
        let root = rootfs.path().to_str().unwrap();
        let config = InventoryConfig::default();

        let listed = dispatch_to_string(&config, &["list", root]).unwrap();
        assert_eq!(listed, "5.15.153.1-2.cm2\n6.11.6-200.fc40.x86_64\n");

        let versions = dispatch_to_string(&config, &["versions", root]).unwrap();
        assert_eq!(
            versions,
            "5.15.153.1\t5.15.153.1-2.cm2\n6.11.6\t6.11.6-200.fc40.x86_64\n"
        );

        let oldest = dispatch_to_string(&config, &["oldest", root]).unwrap();
        assert_eq!(oldest, "5.15.153.1\t5.15.153.1-2.cm2\n");

        assert!(dispatch_to_string(&config, &["check", root]).is_ok());
    }

    #[test]
    fn test_check_without_kernel_fails() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("lib/modules/6.6.47.1-1.azl3")).unwrap();
        let root = temp.path().to_str().unwrap();

        let err = dispatch_to_string(&InventoryConfig::default(), &["check", root]).unwrap_err();
        assert!(format!("{:#}", err).contains("no installed kernel found"));
    }

    #[test]
    fn test_config_file_selects_modules_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("usr/lib/modules/6.12.0-levitate/kernel")).unwrap();
        let config_path = temp.path().join("kernel-inventory.toml");
        fs::write(&config_path, "modules_dir = \"usr/lib/modules\"\n").unwrap();

        let config = InventoryConfig::load(&config_path).unwrap();
        let root = temp.path().to_str().unwrap();
        let listed = dispatch_to_string(&config, &["list", root]).unwrap();
        assert_eq!(listed, "6.12.0-levitate\n");
    }
}
