use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// A byte count parsed from a human-friendly size string.
///
/// Size properties such as `max-file-size` accept plain byte counts
/// (`"262144000"`) or a value with a binary unit suffix (`"250MB"`,
/// `"15gb"`, `"512 KB"`). Suffixes are case-insensitive and use 1024
/// multipliers.
///
/// # Examples
///
/// ```
/// use logspace::FileSize;
///
/// let size: FileSize = "250MB".parse().unwrap();
/// assert_eq!(size.bytes(), 250 * 1024 * 1024);
/// assert_eq!(size.to_string(), "250MB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileSize(u64);

/// Returned when a size string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid file size {0:?}")]
pub struct InvalidFileSize(pub String);

impl FileSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        FileSize(bytes)
    }

    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for FileSize {
    type Err = InvalidFileSize;

    fn from_str(s: &str) -> Result<Self, InvalidFileSize> {
        let lower = s.trim().to_ascii_lowercase();

        let (digits, multiplier) = if let Some(rest) = lower.strip_suffix("kb") {
            (rest, KB)
        } else if let Some(rest) = lower.strip_suffix("mb") {
            (rest, MB)
        } else if let Some(rest) = lower.strip_suffix("gb") {
            (rest, GB)
        } else if let Some(rest) = lower.strip_suffix('b') {
            (rest, 1)
        } else {
            (lower.as_str(), 1)
        };

        let digits = digits.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidFileSize(s.to_string()));
        }

        let value: u64 = digits.parse().map_err(|_| InvalidFileSize(s.to_string()))?;
        value
            .checked_mul(multiplier)
            .map(FileSize)
            .ok_or_else(|| InvalidFileSize(s.to_string()))
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes >= GB && bytes % GB == 0 {
            write!(f, "{}GB", bytes / GB)
        } else if bytes >= MB && bytes % MB == 0 {
            write!(f, "{}MB", bytes / MB)
        } else if bytes >= KB && bytes % KB == 0 {
            write!(f, "{}KB", bytes / KB)
        } else {
            write!(f, "{}B", bytes)
        }
    }
}
