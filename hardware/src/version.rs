/*!
Platform Version

Ordered `major.minor.patch` triple used for OS and Core ML versions.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{HardwareError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PlatformVersion {
    /// Reported when the version cannot be determined. Compares below every real version.
    pub const UNKNOWN: Self = Self::new(0, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    pub const fn major(major: u32) -> Self {
        Self::new(major, 0, 0)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    /// Parse `"14"`, `"14.5"` or `"14.5.1"`. Surrounding whitespace is ignored,
    /// extra components beyond the patch level are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(HardwareError::InvalidVersion(input.to_string()));
        }

        let mut parts = [0u32; 3];
        let mut count = 0;
        for component in trimmed.split('.') {
            if count == parts.len() {
                return Err(HardwareError::InvalidVersion(input.to_string()));
            }
            parts[count] = component
                .parse()
                .map_err(|_| HardwareError::InvalidVersion(input.to_string()))?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl FromStr for PlatformVersion {
    type Err = HardwareError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
