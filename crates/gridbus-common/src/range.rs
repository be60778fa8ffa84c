use std::ops::RangeInclusive;

use crate::GridError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Contiguous run of indices along one axis. Both ends are inclusive.
///
/// Ranges built with [`IndexRange::new`] are always ordered. Ranges that
/// arrive through deserialization are not, so every consumer that walks
/// ranges from untrusted params calls [`validate_ranges`] first.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexRange {
    #[cfg_attr(feature = "serde", serde(rename = "startIndex"))]
    pub start: u32,
    #[cfg_attr(feature = "serde", serde(rename = "endIndex"))]
    pub end: u32,
}

impl IndexRange {
    pub fn new(start: u32, end: u32) -> Result<Self, GridError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// Single-index range.
    pub fn single(index: u32) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.start > self.end {
            return Err(GridError::MalformedRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Number of indices covered. Zero only for a malformed range.
    pub fn len(&self) -> u64 {
        if self.start > self.end {
            return 0;
        }
        u64::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: u32) -> bool {
        self.start <= index && index <= self.end
    }

    pub fn indices(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// Reject the whole batch if any range is inverted.
pub fn validate_ranges(ranges: &[IndexRange]) -> Result<(), GridError> {
    ranges.iter().try_for_each(IndexRange::validate)
}

/// Every index covered by `ranges`, in walk order. Overlapping ranges yield
/// their shared indices more than once.
pub fn walk_ranges(ranges: &[IndexRange]) -> impl Iterator<Item = u32> + '_ {
    ranges.iter().flat_map(IndexRange::indices)
}
