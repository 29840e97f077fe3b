// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device memory budget and parsing.

use crate::HalError;
use std::fmt;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// A ceiling on the bytes a device allocator may hand out at once.
///
/// Devices default to [`MemoryBudget::unlimited`]; the benchmark harness
/// accepts `--device_memory_budget` to cap it.
///
/// # Parsing
/// - `"512M"` / `"512MB"` → 512 × 1024² bytes
/// - `"1G"` / `"1GB"` → 1024³ bytes
/// - `"64K"` / `"64KB"` → 64 × 1024 bytes
/// - `"4096"` → raw byte count
///
/// # Examples
/// ```
/// use hal::MemoryBudget;
///
/// let b = MemoryBudget::parse("1G").unwrap();
/// assert_eq!(b.as_mb(), 1024);
/// assert!(MemoryBudget::unlimited().is_unlimited());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// No ceiling.
    pub fn unlimited() -> Self {
        Self { bytes: usize::MAX }
    }

    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in megabytes (truncated).
    pub fn as_mb(&self) -> usize {
        self.bytes / MB
    }

    pub fn is_unlimited(&self) -> bool {
        self.bytes == usize::MAX
    }

    /// Parses a human-readable budget string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, HalError> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let invalid = || HalError::InvalidBudget(s.to_string());

        const SUFFIXES: [(&str, usize); 7] = [
            ("GB", GB),
            ("G", GB),
            ("MB", MB),
            ("M", MB),
            ("KB", KB),
            ("K", KB),
            ("B", 1),
        ];
        let (digits, multiplier) = SUFFIXES
            .iter()
            .find_map(|&(suffix, mult)| upper.strip_suffix(suffix).map(|d| (d, mult)))
            .unwrap_or((upper.as_str(), 1));

        let value: usize = digits.trim().parse().map_err(|_| invalid())?;
        let bytes = value.checked_mul(multiplier).ok_or_else(invalid)?;
        if bytes == 0 {
            return Err(invalid());
        }
        Ok(Self { bytes })
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            usize::MAX => write!(f, "unlimited"),
            b if b >= GB && b % GB == 0 => write!(f, "{} GB", b / GB),
            b if b >= MB && b % MB == 0 => write!(f, "{} MB", b / MB),
            b if b >= KB && b % KB == 0 => write!(f, "{} KB", b / KB),
            b => write!(f, "{b} B"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(MemoryBudget::parse("512M").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("512mb").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("2g").unwrap().as_mb(), 2048);
        assert_eq!(MemoryBudget::parse("64K").unwrap().as_bytes(), 64 * 1024);
        assert_eq!(MemoryBudget::parse("100B").unwrap().as_bytes(), 100);
    }

    #[test]
    fn test_parse_raw_bytes_and_whitespace() {
        assert_eq!(MemoryBudget::parse("1048576").unwrap().as_mb(), 1);
        assert_eq!(MemoryBudget::parse("  8M  ").unwrap().as_mb(), 8);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "abc", "0M", "M", "-1K"] {
            assert!(
                matches!(MemoryBudget::parse(bad), Err(HalError::InvalidBudget(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryBudget::parse("1G").unwrap().to_string(), "1 GB");
        assert_eq!(MemoryBudget::from_mb(512).to_string(), "512 MB");
        assert_eq!(MemoryBudget::from_bytes(2048).to_string(), "2 KB");
        assert_eq!(MemoryBudget::from_bytes(100).to_string(), "100 B");
        assert_eq!(MemoryBudget::unlimited().to_string(), "unlimited");
    }

    #[test]
    fn test_default_is_unlimited() {
        assert!(MemoryBudget::default().is_unlimited());
        assert!(!MemoryBudget::from_mb(1).is_unlimited());
    }
}
