//! Row orderings for grid views.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use lifegrid_core::{ErrorInfo, LifegridError};
use serde::{Deserialize, Serialize};

use crate::view::ViewRow;

/// The orderings a view accepts, each over a single row property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrder {
    /// Earliest-born group first.
    BirthAscending,
    /// Latest-born group first.
    BirthDescending,
    /// Least active group first.
    ActivityAscending,
    /// Most active group first.
    ActivityDescending,
    /// Shortest lifetime first; groups without a recorded death count
    /// as the longest-lived.
    DurationAscending,
    /// Longest lifetime first, same open-lifetime rule.
    DurationDescending,
}

impl RowOrder {
    /// Every ordering, in declaration order.
    pub const ALL: [RowOrder; 6] = [
        RowOrder::BirthAscending,
        RowOrder::BirthDescending,
        RowOrder::ActivityAscending,
        RowOrder::ActivityDescending,
        RowOrder::DurationAscending,
        RowOrder::DurationDescending,
    ];

    fn name(self) -> &'static str {
        match self {
            RowOrder::BirthAscending => "birth-ascending",
            RowOrder::BirthDescending => "birth-descending",
            RowOrder::ActivityAscending => "activity-ascending",
            RowOrder::ActivityDescending => "activity-descending",
            RowOrder::DurationAscending => "duration-ascending",
            RowOrder::DurationDescending => "duration-descending",
        }
    }
}

impl fmt::Display for RowOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RowOrder {
    type Err = LifegridError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        RowOrder::ALL
            .into_iter()
            .find(|order| order.name() == text)
            .ok_or_else(|| {
                LifegridError::Parse(
                    ErrorInfo::new("unknown-sort-order", format!("no row order named {text:?}"))
                        .with_hint("expected one of: birth-ascending, birth-descending, activity-ascending, activity-descending, duration-ascending, duration-descending"),
                )
            })
    }
}

pub(crate) fn compare_rows(order: RowOrder, a: &ViewRow, b: &ViewRow) -> Ordering {
    match order {
        RowOrder::BirthAscending => birth_key(a).cmp(&birth_key(b)),
        RowOrder::BirthDescending => birth_key(b).cmp(&birth_key(a)),
        RowOrder::ActivityAscending => a.activity().cmp(&b.activity()),
        RowOrder::ActivityDescending => b.activity().cmp(&a.activity()),
        RowOrder::DurationAscending => duration_key(a).cmp(&duration_key(b)),
        RowOrder::DurationDescending => duration_key(b).cmp(&duration_key(a)),
    }
}

fn birth_key(row: &ViewRow) -> u32 {
    row.group().life().birth.as_raw()
}

fn duration_key(row: &ViewRow) -> u32 {
    row.group().life().duration().unwrap_or(u32::MAX)
}
