//! Human readable byte sizes such as `128M`, `1.5G` or `off`.
//!
//! Units are binary multiples. A bare number is taken as KiB and `b`
//! selects plain bytes, so `"10"` and `"10k"` are the same size while
//! `"10b"` is ten bytes. Formatting picks the largest unit that divides the
//! value exactly, which keeps every formatted value parseable back to the
//! same number of bytes.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const KIB: i64 = 1 << 10;
const MIB: i64 = 1 << 20;
const GIB: i64 = 1 << 30;
const TIB: i64 = 1 << 40;
const PIB: i64 = 1 << 50;

/// Units used when formatting, largest first.
const UNITS: &[(i64, &str)] = &[(PIB, "P"), (TIB, "T"), (GIB, "G"), (MIB, "M"), (KIB, "k")];

/// Errors from parsing a [`SizeSuffix`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("empty size")]
    Empty,

    #[error("invalid number in size {value:?}")]
    InvalidNumber { value: String },

    #[error("unknown suffix {suffix:?} in size {value:?}")]
    UnknownSuffix { suffix: char, value: String },

    #[error("size {value:?} is negative")]
    Negative { value: String },

    #[error("size {value:?} is too large")]
    Overflow { value: String },
}

/// A byte count parsed from or rendered as a suffixed string.
///
/// Negative values mean "off".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SizeSuffix(pub i64);

impl SizeSuffix {
    pub const OFF: SizeSuffix = SizeSuffix(-1);

    pub const fn kib(n: i64) -> Self {
        SizeSuffix(n * KIB)
    }

    pub const fn mib(n: i64) -> Self {
        SizeSuffix(n * MIB)
    }

    pub const fn gib(n: i64) -> Self {
        SizeSuffix(n * GIB)
    }

    pub fn is_off(self) -> bool {
        self.0 < 0
    }

    /// The size in bytes, or `None` when off.
    pub fn bytes(self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }
}

fn unit_multiplier(suffix: char) -> Option<i64> {
    match suffix.to_ascii_lowercase() {
        'b' => Some(1),
        'k' => Some(KIB),
        'm' => Some(MIB),
        'g' => Some(GIB),
        't' => Some(TIB),
        'p' => Some(PIB),
        _ => None,
    }
}

impl FromStr for SizeSuffix {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SizeError::Empty);
        }
        if s.eq_ignore_ascii_case("off") {
            return Ok(SizeSuffix::OFF);
        }

        let (number, multiplier) = match s.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => {
                let multiplier = unit_multiplier(c).ok_or_else(|| SizeError::UnknownSuffix {
                    suffix: c,
                    value: s.to_string(),
                })?;
                (&s[..s.len() - 1], multiplier)
            }
            _ => (s, KIB),
        };

        if number.starts_with('-') {
            return Err(SizeError::Negative {
                value: s.to_string(),
            });
        }

        // Integers stay exact; fractions such as "1.5M" go through f64.
        if let Ok(n) = number.parse::<i64>() {
            return n
                .checked_mul(multiplier)
                .map(SizeSuffix)
                .ok_or_else(|| SizeError::Overflow {
                    value: s.to_string(),
                });
        }

        let value: f64 = number.parse().map_err(|_| SizeError::InvalidNumber {
            value: s.to_string(),
        })?;
        if !value.is_finite() {
            return Err(SizeError::InvalidNumber {
                value: s.to_string(),
            });
        }
        let bytes = value * multiplier as f64;
        if bytes >= i64::MAX as f64 {
            return Err(SizeError::Overflow {
                value: s.to_string(),
            });
        }
        Ok(SizeSuffix(bytes as i64))
    }
}

impl fmt::Display for SizeSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            n if n < 0 => f.write_str("off"),
            0 => f.write_str("0"),
            n => match UNITS.iter().find(|(unit, _)| n % unit == 0) {
                Some((unit, suffix)) => write!(f, "{}{}", n / unit, suffix),
                None => write!(f, "{}B", n),
            },
        }
    }
}

impl From<u64> for SizeSuffix {
    fn from(bytes: u64) -> Self {
        SizeSuffix(i64::try_from(bytes).unwrap_or(i64::MAX))
    }
}
