//! Kernel release parsing.
//!
//! Accepts the strings `uname -r` prints and the directory names found under
//! `/lib/modules`:
//!
//! | OS              | Release                  |
//! |-----------------|--------------------------|
//! | Fedora 40       | `6.11.6-200.fc40.x86_64` |
//! | Ubuntu 22.04    | `6.8.0-48-generic`       |
//! | Azure Linux 2.0 | `5.15.153.1-2.cm2`       |
//! | Azure Linux 3.0 | `6.6.47.1-1.azl3`        |

use once_cell::sync::Lazy;
use regex::Regex;

use super::TolerantVersion;
use crate::error::{KernelInventoryError, Result};

// Greedy leading numeric run. The remainder is checked separately so that
// the run can never backtrack into a shorter prefix.
static NUMERIC_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)*").expect("Invalid numeric run regex"));

// Empty, or a separator followed by the release tag.
static SUFFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[.\-][a-zA-Z0-9_.\-]*)?$").expect("Invalid suffix regex"));

/// Parse a kernel release into its comparable numeric prefix.
///
/// The suffix (`-200.fc40.x86_64`, `-48-generic`) is validated but dropped.
pub fn parse_kernel_version(raw: &str) -> Result<TolerantVersion> {
    let parse_error = || KernelInventoryError::Parse {
        raw: raw.to_string(),
    };

    let run = NUMERIC_RUN_REGEX.find(raw).ok_or_else(parse_error)?;
    if !SUFFIX_REGEX.is_match(&raw[run.end()..]) {
        return Err(parse_error());
    }

    let segments = run
        .as_str()
        .split('.')
        .map(|segment| segment.parse::<u64>().map_err(|_| parse_error()))
        .collect::<Result<Vec<_>>>()?;

    Ok(TolerantVersion::new(segments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(raw: &str) -> Vec<u64> {
        parse_kernel_version(raw).unwrap().segments().to_vec()
    }

    #[test]
    fn test_parse_distro_releases() {
        assert_eq!(segments("6.11.6-200.fc40.x86_64"), vec![6, 11, 6]);
        assert_eq!(segments("5.15.153.1-2.cm2"), vec![5, 15, 153, 1]);
        assert_eq!(segments("6.6.47.1-1.azl3"), vec![6, 6, 47, 1]);
        assert_eq!(segments("6.8.0-48-generic"), vec![6, 8, 0]);
    }

    #[test]
    fn test_parse_bare_and_dot_suffixed() {
        assert_eq!(segments("6"), vec![6]);
        assert_eq!(segments("6.12.0"), vec![6, 12, 0]);
        assert_eq!(segments("6.12.0.levitate"), vec![6, 12, 0]);
        assert_eq!(segments("6.12.0-"), vec![6, 12, 0]);
    }

    #[test]
    fn test_parse_rejects_non_numeric_start() {
        for raw in ["", "fc40", "-6.8.0", ".6.8.0", "v6.8.0"] {
            match parse_kernel_version(raw) {
                Err(KernelInventoryError::Parse { raw: reported }) => assert_eq!(reported, raw),
                other => panic!("expected parse error for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_rejects_suffix_without_separator() {
        assert!(parse_kernel_version("6.11.6x").is_err());
        assert!(parse_kernel_version("6.11.6 ").is_err());
        assert!(parse_kernel_version("6.11.6-rc1+").is_err());
        // The numeric run never gives back segments to make a suffix fit
        assert!(matches!(
            parse_kernel_version("6.11.6.1x"),
            Err(KernelInventoryError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_overflowing_segment() {
        assert!(parse_kernel_version("6.99999999999999999999999.1").is_err());
    }

    #[test]
    fn test_parse_leading_zeros_compare_numerically() {
        assert_eq!(
            parse_kernel_version("06.08.0").unwrap(),
            parse_kernel_version("6.8").unwrap()
        );
    }
}
