use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a rebalance-floor period.
///
/// The scheduler picks the granularity. Regime slices force a rebalance the
/// first time they are evaluated in a new period; the observed strategies use
/// the calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub i64);

impl PeriodId {
    /// Calendar-year period containing `date`.
    pub fn year_of(date: NaiveDate) -> Self {
        Self(i64::from(date.year()))
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
