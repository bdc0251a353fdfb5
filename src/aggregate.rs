//! Ordering of folder records

use crate::inspector::FolderRecord;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Column to order the summary by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    MessageCount,
    ByteSize,
}

impl SortKey {
    fn compare(self, a: &FolderRecord, b: &FolderRecord) -> Ordering {
        match self {
            Self::Name => a.name().as_str().cmp(b.name().as_str()),
            Self::MessageCount => a.message_count().cmp(&b.message_count()),
            Self::ByteSize => a.byte_size().cmp(&b.byte_size()),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "num_msgs" => Ok(Self::MessageCount),
            "size" => Ok(Self::ByteSize),
            other => Err(format!(
                "unknown sort key '{other}' (expected name, num_msgs or size)"
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::MessageCount => "num_msgs",
            Self::ByteSize => "size",
        })
    }
}

/// Stable-sort `records` by `key`.
///
/// `reverse` flips the comparison rather than the result, so records
/// with equal keys stay in listing order in both directions.
#[must_use]
pub fn aggregate(mut records: Vec<FolderRecord>, key: SortKey, reverse: bool) -> Vec<FolderRecord> {
    if reverse {
        records.sort_by(|a, b| key.compare(b, a));
    } else {
        records.sort_by(|a, b| key.compare(a, b));
    }
    records
}
