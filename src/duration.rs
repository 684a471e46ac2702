//! Minute-granular durations
//!
//! Token lifetimes are conventionally configured in whole minutes, while
//! the claims themselves carry Unix timestamps in seconds. [`DurationMins`]
//! bridges the two.

use aliri_clock::DurationSecs;
use serde::{Deserialize, Serialize};

/// A duration measured in whole minutes
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
#[must_use]
pub struct DurationMins(pub u64);

impl DurationMins {
    /// The equivalent duration in seconds, saturating at `u64::MAX`
    #[inline]
    pub const fn into_secs(self) -> DurationSecs {
        DurationSecs(self.0.saturating_mul(60))
    }
}

impl From<u64> for DurationMins {
    #[inline]
    fn from(mins: u64) -> Self {
        Self(mins)
    }
}

impl From<DurationMins> for DurationSecs {
    #[inline]
    fn from(mins: DurationMins) -> Self {
        mins.into_secs()
    }
}
