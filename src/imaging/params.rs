//! Parameter types for image operations.
//!
//! These describe *what* to do, not *how*. The batch processor picks a
//! [`FitMode`] from the requested operation and a [`Quality`] from config;
//! [`operations`](super::operations) and the [`backend`](super::backend) do
//! the pixel work.

use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// How a decoded source is fitted to a target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Scale to fill the target box, then center-crop the overflow.
    Cover,
    /// Scale to fit inside the target box, then center on a transparent canvas.
    Contain,
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMode::Cover => f.write_str("cover"),
            FitMode::Contain => f.write_str("contain"),
        }
    }
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cover" => Ok(FitMode::Cover),
            "contain" => Ok(FitMode::Contain),
            other => Err(format!("unknown fit mode '{other}'")),
        }
    }
}
