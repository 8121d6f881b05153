//! Explicit chunk-size schedules.
//!
//! A schedule is a comma separated list of sizes (anchors). An anchor may be
//! followed by a multiplier token `xN` (N >= 2): the iterator then keeps
//! multiplying the last size by N until it reaches the next anchor, where it
//! snaps to that anchor exactly. A multiplier after the last anchor grows the
//! size forever; without one the last anchor repeats.
//!
//! ```
//! use chunkread::{ChunkSizeIterator, MultiplierList};
//!
//! let list: MultiplierList = "2k,x3,20k,x2".parse().unwrap();
//! let mut it = list.iter();
//! let sizes: Vec<_> = (0..5).map(|_| it.next_chunk_size().unwrap() / 1024).collect();
//! assert_eq!(sizes, [2, 6, 18, 20, 40]);
//! ```

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

use super::ChunkSizeIterator;
use crate::size::{SizeError, SizeSuffix};

/// Errors from parsing a [`MultiplierList`]. Raised eagerly, never while
/// iterating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("empty segment at position {position}")]
    EmptySegment { position: usize },

    #[error("multiplier {token:?} at first position")]
    LeadingMultiplier { token: String },

    #[error("multiplier {token:?} follows another multiplier")]
    ConsecutiveMultipliers { token: String },

    #[error("invalid multiplier {token:?}: must be at least 2")]
    MultiplierTooSmall { token: String },

    #[error("invalid multiplier {token:?}: {source}")]
    InvalidMultiplier {
        token: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid size {token:?}: {source}")]
    InvalidSize {
        token: String,
        #[source]
        source: SizeError,
    },

    #[error("invalid size {token:?}: must be positive")]
    NonPositiveSize { token: String },
}

/// A parsed chunk-size schedule.
///
/// `anchors[i]` is an explicit size; `multipliers[i]` is the multiplier
/// applied after it, or 0 when there is none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiplierList {
    anchors: Vec<u64>,
    multipliers: Vec<u64>,
}

impl MultiplierList {
    /// Parse already split tokens, e.g. the values of a repeated flag.
    pub fn parse_parts<I, S>(parts: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut anchors = Vec::new();
        let mut multipliers: Vec<u64> = Vec::new();

        for (position, part) in parts.into_iter().enumerate() {
            let token = part.as_ref().trim();
            if token.is_empty() {
                return Err(ScheduleError::EmptySegment { position });
            }

            if let Some(value) = token.strip_prefix('x') {
                let Some(last) = multipliers.last_mut() else {
                    return Err(ScheduleError::LeadingMultiplier {
                        token: token.to_string(),
                    });
                };
                if *last != 0 {
                    return Err(ScheduleError::ConsecutiveMultipliers {
                        token: token.to_string(),
                    });
                }
                let multiplier: u64 = value.parse().map_err(|source| {
                    ScheduleError::InvalidMultiplier {
                        token: token.to_string(),
                        source,
                    }
                })?;
                if multiplier < 2 {
                    return Err(ScheduleError::MultiplierTooSmall {
                        token: token.to_string(),
                    });
                }
                *last = multiplier;
            } else {
                let size: SizeSuffix = token.parse().map_err(|source| {
                    ScheduleError::InvalidSize {
                        token: token.to_string(),
                        source,
                    }
                })?;
                match size.bytes() {
                    Some(bytes) if bytes > 0 => {
                        anchors.push(bytes);
                        multipliers.push(0);
                    }
                    _ => {
                        return Err(ScheduleError::NonPositiveSize {
                            token: token.to_string(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            anchors,
            multipliers,
        })
    }

    /// True when the list has no anchors.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn anchors(&self) -> &[u64] {
        &self.anchors
    }

    /// Multiplier following each anchor, 0 when absent.
    pub fn multipliers(&self) -> &[u64] {
        &self.multipliers
    }

    /// A fresh iterator over this schedule.
    pub fn iter(&self) -> MultiplierListIter {
        MultiplierListIter {
            list: self.clone(),
            index: 0,
            last: 0,
        }
    }
}

impl FromStr for MultiplierList {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_parts(s.split(','))
    }
}

impl fmt::Display for MultiplierList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (&anchor, &multiplier)) in self.anchors.iter().zip(&self.multipliers).enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", SizeSuffix::from(anchor))?;
            if multiplier > 1 {
                write!(f, ",x{}", multiplier)?;
            }
        }
        Ok(())
    }
}

/// Iterator state over a [`MultiplierList`].
#[derive(Debug, Clone)]
pub struct MultiplierListIter {
    list: MultiplierList,
    /// Index of the anchor the current value grows from.
    index: usize,
    /// Last yielded size, 0 before the first call.
    last: u64,
}

impl ChunkSizeIterator for MultiplierListIter {
    fn next_chunk_size(&mut self) -> Option<u64> {
        let anchors = &self.list.anchors;
        let multipliers = &self.list.multipliers;
        let len = anchors.len();
        if len == 0 {
            return None;
        }

        if self.index >= len {
            let multiplier = multipliers[len - 1];
            if multiplier > 1 {
                self.last = self.last.saturating_mul(multiplier);
            }
            return Some(self.last);
        }

        if self.last == 0 {
            self.last = anchors[0];
            return Some(self.last);
        }

        let multiplier = multipliers[self.index];
        if multiplier <= 1 {
            self.index += 1;
            if self.index < len {
                self.last = anchors[self.index];
            }
            return Some(self.last);
        }

        self.last = self.last.saturating_mul(multiplier);
        if let Some(&next) = anchors.get(self.index + 1) {
            if self.last >= next {
                self.last = next;
                self.index += 1;
            }
        }
        Some(self.last)
    }

    fn reset(&mut self, _length: Option<u64>) {
        self.index = 0;
        self.last = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: u64 = 1 << 10;
    const M: u64 = 1 << 20;
    const G: u64 = 1 << 30;

    fn sizes(schedule: &str, n: usize) -> Vec<u64> {
        let list: MultiplierList = schedule.parse().unwrap();
        let mut it = list.iter();
        (0..n).map(|_| it.next_chunk_size().unwrap()).collect()
    }

    #[test]
    fn test_plain_anchors() {
        assert_eq!(
            sizes("2M,10M,50M,200M", 5),
            vec![2 * M, 10 * M, 50 * M, 200 * M, 200 * M]
        );
    }

    #[test]
    fn test_trailing_multiplier() {
        assert_eq!(
            sizes("128M,1G,x2", 5),
            vec![128 * M, G, 2 * G, 4 * G, 8 * G]
        );
    }

    #[test]
    fn test_multiplier_between_anchors() {
        assert_eq!(
            sizes("2k,x3,20k,x2", 5),
            vec![2 * K, 6 * K, 18 * K, 20 * K, 40 * K]
        );
    }

    #[test]
    fn test_single_anchor_with_multiplier_grows_forever() {
        assert_eq!(sizes("1M,x4", 4), vec![M, 4 * M, 16 * M, 64 * M]);
    }

    #[test]
    fn test_single_anchor_repeats() {
        assert_eq!(sizes("3M", 3), vec![3 * M, 3 * M, 3 * M]);
    }

    #[test]
    fn test_multiplier_exact_hit_on_anchor() {
        assert_eq!(sizes("1k,x2,4k,16k", 5), vec![K, 2 * K, 4 * K, 16 * K, 16 * K]);
    }

    #[test]
    fn test_growth_saturates() {
        let list: MultiplierList = "1P,x1024".parse().unwrap();
        let mut it = list.iter();
        it.next_chunk_size();
        it.next_chunk_size();
        assert_eq!(it.next_chunk_size(), Some(u64::MAX));
    }

    #[test]
    fn test_empty_list_is_unbounded() {
        let mut it = MultiplierList::default().iter();
        assert_eq!(it.next_chunk_size(), None);
    }

    #[test]
    fn test_reset_restarts() {
        let list: MultiplierList = "2k,x3,20k,x2".parse().unwrap();
        let mut it = list.iter();
        for _ in 0..4 {
            it.next_chunk_size();
        }
        it.reset(Some(12345));
        assert_eq!(it.next_chunk_size(), Some(2 * K));
        assert_eq!(it.next_chunk_size(), Some(6 * K));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let list: MultiplierList = " 2M , x2 , 8M ".parse().unwrap();
        assert_eq!(list.anchors(), &[2 * M, 8 * M]);
        assert_eq!(list.multipliers(), &[2, 0]);
    }

    #[test]
    fn test_parse_errors() {
        let err = |s: &str| s.parse::<MultiplierList>().unwrap_err();

        assert_eq!(err(",2M"), ScheduleError::EmptySegment { position: 0 });
        assert_eq!(err(""), ScheduleError::EmptySegment { position: 0 });
        assert_eq!(err("2M,,4M"), ScheduleError::EmptySegment { position: 1 });
        assert!(matches!(err("x2,2M"), ScheduleError::LeadingMultiplier { .. }));
        assert!(matches!(
            err("2M,x2,x3,4M"),
            ScheduleError::ConsecutiveMultipliers { .. }
        ));
        assert!(matches!(err("2M,x1"), ScheduleError::MultiplierTooSmall { .. }));
        assert!(matches!(err("2M,x0"), ScheduleError::MultiplierTooSmall { .. }));
        assert!(matches!(err("2M,xx"), ScheduleError::InvalidMultiplier { .. }));
        assert!(matches!(err("2M,x-3"), ScheduleError::InvalidMultiplier { .. }));
        assert!(matches!(err("2Q"), ScheduleError::InvalidSize { .. }));
        assert!(matches!(err("0"), ScheduleError::NonPositiveSize { .. }));
        assert!(matches!(err("off"), ScheduleError::NonPositiveSize { .. }));
    }

    #[test]
    fn test_error_names_token() {
        let err = "2M,x1".parse::<MultiplierList>().unwrap_err();
        assert!(err.to_string().contains("x1"));
    }

    #[test]
    fn test_display() {
        let list: MultiplierList = "2048k,x2,1G,3000b".parse().unwrap();
        assert_eq!(list.to_string(), "2M,x2,1G,3000B");
        assert_eq!(MultiplierList::default().to_string(), "");
    }

    #[test]
    fn test_display_parses_back() {
        for s in [
            "2M,10M,50M,200M",
            "128M,1G,x2",
            "2k,x3,20k,x2",
            "1.5M,x4,1G",
            "7b,x2,1k,x3,1P",
        ] {
            let list: MultiplierList = s.parse().unwrap();
            let again: MultiplierList = list.to_string().parse().unwrap();
            assert_eq!(again, list, "schedule {s}");
        }
    }
}
