use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use crate::catalog::CanonicalSection;

/// Fixed UTC+9 offset the storefront schedules against.
pub const JST_OFFSET_SECS: i32 = 9 * 3600;

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

/// Calendar day in a fixed zone, used to partition output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub date: NaiveDate,
}

impl DayKey {
    /// `None` for anything that is not an RFC 3339 timestamp.
    pub fn from_timestamp(ts: &str, offset: FixedOffset) -> Option<Self> {
        let dt = DateTime::parse_from_rfc3339(ts).ok()?;
        Some(Self {
            date: dt.with_timezone(&offset).date_naive(),
        })
    }

    pub fn file_name(&self) -> String {
        format!("mp_item_shop_{}.json", self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

pub type DayBuckets = BTreeMap<DayKey, Vec<CanonicalSection>>;

/// Partition sections by the local day of their `stack_rank_start`.
///
/// Sections without a parsable start are left out. Input order is kept inside
/// each bucket.
pub fn bucket_by_day(sections: &[CanonicalSection], offset: FixedOffset) -> DayBuckets {
    let mut buckets = DayBuckets::new();
    for section in sections {
        let Some(key) = section
            .stack_rank_start
            .as_deref()
            .and_then(|ts| DayKey::from_timestamp(ts, offset))
        else {
            continue;
        };
        buckets.entry(key).or_default().push(section.clone());
    }
    buckets
}

/// Human label for a start timestamp, e.g. `9月10日`.
///
/// Unparsable input is shown verbatim; a missing one as `-`.
pub fn display_date(stack_rank_start: Option<&str>, offset: FixedOffset) -> String {
    match stack_rank_start {
        None | Some("") => "-".to_string(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => {
                let local = dt.with_timezone(&offset);
                format!("{}月{}日", local.month(), local.day())
            }
            Err(_) => raw.to_string(),
        },
    }
}
