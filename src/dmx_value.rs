//! DMX value scaling between byte resolutions.
//!
//! A logical channel value can be encoded with 1 to 4 consecutive DMX bytes.
//! This module converts values and inclusive value ranges between such
//! resolutions: down-conversion truncates to the most significant bytes,
//! up-conversion periodically repeats the source byte pattern into the added
//! bytes. Both directions preserve the end points `0` and `max_value` exactly
//! and are monotonic.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// Number of consecutive DMX bytes encoding one logical value.
///
/// Only 1 to 4 bytes are supported; other byte counts are unrepresentable.
/// Serialized through its string form (`"8bit"` to `"32bit"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct Resolution(u8);

impl Resolution {
    pub const EIGHT_BIT: Resolution = Resolution(1);
    pub const SIXTEEN_BIT: Resolution = Resolution(2);
    pub const TWENTY_FOUR_BIT: Resolution = Resolution(3);
    pub const THIRTY_TWO_BIT: Resolution = Resolution(4);

    pub fn bytes(self) -> u8 {
        self.0
    }

    /// Biggest DMX value expressible at this resolution, `256^bytes - 1`.
    pub fn max_value(self) -> u32 {
        u32::MAX >> (32 - 8 * u32::from(self.0))
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::EIGHT_BIT
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bit", 8 * self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("only 1 to 4 bytes per channel are supported, got {0}")]
    UnsupportedByteCount(u8),
    #[error("invalid resolution string '{0}', expected one of '8bit', '16bit', '24bit', '32bit'")]
    Invalid(String),
}

impl TryFrom<u8> for Resolution {
    type Error = ResolutionError;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        if (1..=4).contains(&bytes) {
            Ok(Resolution(bytes))
        } else {
            Err(ResolutionError::UnsupportedByteCount(bytes))
        }
    }
}

impl FromStr for Resolution {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "8bit" => Ok(Resolution::EIGHT_BIT),
            "16bit" => Ok(Resolution::SIXTEEN_BIT),
            "24bit" => Ok(Resolution::TWENTY_FOUR_BIT),
            "32bit" => Ok(Resolution::THIRTY_TWO_BIT),
            _ => Err(ResolutionError::Invalid(s.to_owned())),
        }
    }
}

/// Reinterprets `value` from one resolution at another resolution.
///
/// Down-conversion keeps the `to` most significant bytes. Up-conversion
/// repeats the source byte pattern into the added low bytes, so `0` maps to
/// `0` and the maximum value maps to the maximum value (e.g. 8 to 16 bit
/// duplicates the byte: `127` becomes `0x7F7F`).
///
/// Panics if `value` exceeds the maximum of `from`; passing such a value is a
/// programming error, not a recoverable condition.
pub fn scale_value(value: u32, from: Resolution, to: Resolution) -> u32 {
    assert!(
        value <= from.max_value(),
        "DMX value {value} exceeds maximum {} of a {from} channel",
        from.max_value()
    );

    let from_bytes = u32::from(from.bytes());
    let to_bytes = u32::from(to.bytes());

    if to_bytes <= from_bytes {
        // down-convert by truncation
        value >> (8 * (from_bytes - to_bytes))
    } else {
        // up-convert in periodic mode, repeating the whole input
        let added = to_bytes - from_bytes;
        let full_shifts = added / from_bytes;
        let partial_shift = added % from_bytes;
        let mut out = value;
        for _ in 0..full_shifts {
            out = (out << (8 * from_bytes)) | value;
        }
        if partial_shift > 0 {
            out = (out << (8 * partial_shift)) | (value >> (8 * (from_bytes - partial_shift)));
        }
        out
    }
}

/// Scales both bounds of an inclusive range independently with [`scale_value`].
///
/// Down-scaling adjacent ranges can make them overlap; this function does not
/// repair that. Callers must leave a margin of at least `256^(from-to)` DMX
/// values per range to guarantee non-overlap after down-scaling. Overlap
/// checks belong to capability construction, not here.
pub fn scale_range(start: u32, end: u32, from: Resolution, to: Resolution) -> (u32, u32) {
    (scale_value(start, from, to), scale_value(end, from, to))
}
