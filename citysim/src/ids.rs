use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Identifies one vehicle. CitySim assigns numeric IDs; anything else is kept as a name.
/// Numeric IDs sort numerically (so 9 comes before 10) and before all named IDs. Only canonical
/// digit strings are numeric, so "007" and "+7" stay distinct from 7.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CarID {
    Numeric(u64),
    Named(String),
}

impl CarID {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            bail!("Empty carId");
        }
        Ok(Self::from(raw))
    }
}

impl From<&str> for CarID {
    fn from(raw: &str) -> Self {
        let canonical = !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && (raw == "0" || !raw.starts_with('0'));
        if canonical {
            // Too many digits for a u64 falls through to a name
            if let Ok(x) = raw.parse::<u64>() {
                return CarID::Numeric(x);
            }
        }
        CarID::Named(raw.to_string())
    }
}

impl From<u64> for CarID {
    fn from(x: u64) -> Self {
        CarID::Numeric(x)
    }
}

impl fmt::Display for CarID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CarID::Numeric(x) => write!(f, "{x}"),
            CarID::Named(x) => write!(f, "{x}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameNum(pub u64);

impl fmt::Display for FrameNum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "frame {}", self.0)
    }
}
