//! PriceWindow: the time-ordered closing prices one factor looks at.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from building a window out of dated observations.
#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("closes are not strictly chronological: {prev} is followed by {next}")]
    NotChronological { prev: NaiveDate, next: NaiveDate },
}

/// Immutable, chronologically ordered closes for one asset, most recent last.
///
/// Missing observations may be carried as `f64::NAN`; factors decide how to
/// treat them. A window is built once per evaluation cycle and never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceWindow {
    closes: Vec<f64>,
}

impl PriceWindow {
    /// Wrap closes that the caller already holds in chronological order.
    pub fn new(closes: impl Into<Vec<f64>>) -> Self {
        Self {
            closes: closes.into(),
        }
    }

    /// Build from `(date, close)` pairs, rejecting any pair whose date does
    /// not strictly follow the previous one.
    pub fn from_dated(points: &[(NaiveDate, f64)]) -> Result<Self, WindowError> {
        for pair in points.windows(2) {
            let (prev, next) = (pair[0].0, pair[1].0);
            if next <= prev {
                return Err(WindowError::NotChronological { prev, next });
            }
        }
        Ok(Self {
            closes: points.iter().map(|&(_, close)| close).collect(),
        })
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.closes.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// The most recent `n` closes, or `None` if fewer than `n` are held.
    pub fn trailing(&self, n: usize) -> Option<&[f64]> {
        let len = self.closes.len();
        if n > len {
            return None;
        }
        Some(&self.closes[len - n..])
    }
}
