//! CSV-backed price history and the month-start schedule.
//!
//! The file format is a long table with header `date,symbol,close`. Rows may
//! arrive in any order; they are sorted per symbol on load.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use tactica_core::{Asset, InMemoryPriceSource, PriceWindow};

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    symbol: String,
    close: f64,
}

/// One symbol's closes with the dates they were observed on.
#[derive(Debug, Clone)]
struct Series {
    dates: Vec<NaiveDate>,
    window: PriceWindow,
}

/// Dated closes per symbol, chronological.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    series: BTreeMap<Asset, Series>,
}

impl PriceHistory {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open price file {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("invalid price file {}", path.display()))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut rows: BTreeMap<Asset, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for (line, row) in csv.deserialize::<PriceRow>().enumerate() {
            // Header is line 1.
            let row = row.with_context(|| format!("bad row at line {}", line + 2))?;
            rows.entry(Asset::new(row.symbol.trim()))
                .or_default()
                .push((row.date, row.close));
        }

        let mut series = BTreeMap::new();
        for (asset, mut points) in rows {
            points.sort_by_key(|&(date, _)| date);
            // A repeated date survives the sort and fails the chronology check.
            let window = PriceWindow::from_dated(&points)
                .with_context(|| format!("duplicate close for {asset}"))?;
            let dates = points.into_iter().map(|(date, _)| date).collect();
            series.insert(asset, Series { dates, window });
        }
        Ok(Self { series })
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Asset> {
        self.series.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Every date on which at least one symbol has a close.
    pub fn trading_days(&self) -> BTreeSet<NaiveDate> {
        self.series
            .values()
            .flat_map(|series| series.dates.iter().copied())
            .collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.trading_days().last().copied()
    }

    /// Price source holding every close dated on or before `date`.
    pub fn as_of(&self, date: NaiveDate) -> InMemoryPriceSource {
        let mut source = InMemoryPriceSource::new();
        for (asset, series) in &self.series {
            let visible = series.dates.partition_point(|&d| d <= date);
            if visible > 0 {
                source.insert(asset.clone(), series.window.closes()[..visible].to_vec());
            }
        }
        source
    }

    /// First trading day of each month within `[start, end]`.
    pub fn month_starts(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<NaiveDate> {
        let mut starts = Vec::new();
        let mut current_month = None;
        for date in self.trading_days() {
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }
            let month = (date.year(), date.month());
            if current_month != Some(month) {
                current_month = Some(month);
                starts.push(date);
            }
        }
        starts
    }
}
