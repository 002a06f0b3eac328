//! Binning factor validation and mode flags.
//!
//! The camera accepts one combined mode word per `is_SetBinning` call; a later
//! call replaces the earlier one, so both axes are resolved first and sent
//! together.

use std::fmt;
use std::ops::BitOr;

use crate::traits::{CameraError, Result};

/// Largest binning factor the range check accepts.
pub const MAX_FACTOR: u32 = 16;

/// Factors the camera has a binning mode for.
pub const SUPPORTED_FACTORS: [u32; 7] = [2, 3, 4, 5, 6, 8, 16];

/// Binning axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Along a row.
    Horizontal,
    /// Along a column.
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

/// Combined `IS_BINNING_*` mode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinningMode(pub i32);

impl BinningMode {
    /// `IS_BINNING_DISABLE`.
    pub const DISABLE: Self = Self(0);

    /// Mode flag for a factor on one axis.
    ///
    /// `None` when the camera has no such mode. Factor 1 has none: only a
    /// full `1x1` request turns binning off, through [`BinningMode::DISABLE`].
    #[must_use]
    pub const fn for_axis(axis: Axis, factor: u32) -> Option<Self> {
        let (vertical, horizontal) = match factor {
            2 => (0x0001, 0x0002),
            4 => (0x0004, 0x0008),
            3 => (0x0010, 0x0020),
            5 => (0x0040, 0x0080),
            6 => (0x0100, 0x0200),
            8 => (0x0400, 0x0800),
            16 => (0x1000, 0x2000),
            _ => return None,
        };
        Some(match axis {
            Axis::Horizontal => Self(horizontal),
            Axis::Vertical => Self(vertical),
        })
    }

    /// Whether no axis is binned.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        self.0 == Self::DISABLE.0
    }
}

impl BitOr for BinningMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Check a factor lies within `1..=16`.
pub const fn check_range(axis: Axis, factor: u32) -> Result<u32> {
    if factor >= 1 && factor <= MAX_FACTOR {
        Ok(factor)
    } else {
        Err(CameraError::BinningOutOfRange { axis, factor })
    }
}

/// Resolve the mode flag for an in-range factor.
pub const fn resolve(axis: Axis, factor: u32) -> Result<BinningMode> {
    match BinningMode::for_axis(axis, factor) {
        Some(mode) => Ok(mode),
        None => Err(CameraError::UnsupportedBinning { axis, factor }),
    }
}

/// Per-axis result of a binning request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct BinningOutcome {
    /// Result for the horizontal factor.
    pub horizontal: Result<()>,
    /// Result for the vertical factor.
    pub vertical: Result<()>,
}

impl BinningOutcome {
    /// Whether both axes were applied.
    pub const fn is_ok(&self) -> bool {
        self.horizontal.is_ok() && self.vertical.is_ok()
    }

    /// First failure, if any.
    pub fn into_result(self) -> Result<()> {
        self.horizontal.and(self.vertical)
    }
}
