use crate::error::{PropagationError, PropagationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version marker recorded against a tenant store once a propagation pass
/// of that logic version has been fully applied.
///
/// Versions are `MAJOR.MINOR.PATCH` and order numerically per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MigrationVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl MigrationVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(label: &str) -> PropagationResult<Self> {
        let invalid = |reason: &str| PropagationError::InvalidVersion {
            version: label.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = label.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected MAJOR.MINOR.PATCH"));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("version components must be unsigned integers"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("version component out of range"))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl FromStr for MigrationVersion {
    type Err = PropagationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
