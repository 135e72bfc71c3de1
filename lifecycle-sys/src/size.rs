// SPDX-License-Identifier: GPL-3.0-only

//! Size-unit normalization for discovery output
//!
//! `lsblk` reports sizes as strings like `"465,8G"` (the decimal separator
//! follows the locale). Everything persisted in this system is in megabytes.

use crate::error::{Result, SysError};

/// Units accepted as the trailing letter of a size string, in ascending
/// order. The multiplier is 1024^index.
const UNITS: [char; 5] = ['M', 'G', 'T', 'P', 'E'];

/// Convert a size string with a unit suffix (`"10M"`, `"1G"`, `"1,5G"`) to
/// whole megabytes, truncating any fraction.
pub fn convert_size_to_mb(size: &str) -> Result<u64> {
    let normalized = size.trim().replace(',', ".");
    let mut chars = normalized.chars();
    let unit = chars
        .next_back()
        .ok_or_else(|| SysError::Parse("empty size string".into()))?
        .to_ascii_uppercase();

    let exponent = UNITS
        .iter()
        .position(|candidate| *candidate == unit)
        .ok_or_else(|| SysError::Parse(format!("unknown size unit in '{size}'")))? as i32;

    let value: f64 = chars
        .as_str()
        .parse()
        .map_err(|_| SysError::Parse(format!("unparseable size value in '{size}'")))?;

    if value < 0.0 {
        return Err(SysError::Parse(format!("negative size '{size}'")));
    }

    Ok((value * 1024f64.powi(exponent)) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_megabytes_pass_through() {
        assert_eq!(convert_size_to_mb("10M").unwrap(), 10);
    }

    #[test]
    fn gigabytes_and_terabytes_scale_by_1024() {
        assert_eq!(convert_size_to_mb("1G").unwrap(), 1024);
        assert_eq!(convert_size_to_mb("1T").unwrap(), 1_048_576);
    }

    #[test]
    fn locale_decimal_comma_is_accepted() {
        assert_eq!(convert_size_to_mb("1,5G").unwrap(), 1536);
        assert_eq!(convert_size_to_mb("465,8G").unwrap(), 476_979);
    }

    #[test]
    fn lowercase_units_are_accepted() {
        assert_eq!(convert_size_to_mb("2g").unwrap(), 2048);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(convert_size_to_mb(""), Err(SysError::Parse(_))));
        assert!(matches!(convert_size_to_mb("12K"), Err(SysError::Parse(_))));
        assert!(matches!(convert_size_to_mb("abcG"), Err(SysError::Parse(_))));
    }
}
