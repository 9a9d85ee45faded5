//! Price-source seam between the engine and the outside world.
//!
//! The engine never fetches prices. It declares `(asset, window length)`
//! requests and a [`PriceSource`] implementation hands back materialized
//! windows. Storage, caching and retrieval all live behind this trait.

use crate::domain::{Asset, PriceWindow};
use std::collections::HashMap;

/// One window the controller needs for the coming cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowRequest {
    pub asset: Asset,
    pub len: usize,
}

/// Supplier of trailing close windows, keyed by `(asset, window length)`.
///
/// Implementations should return the most recent `len` closes. Returning a
/// shorter window is allowed when history is short; the affected factors
/// become undefined for the cycle. `None` means the asset is unknown.
pub trait PriceSource {
    fn window(&self, asset: &Asset, len: usize) -> Option<PriceWindow>;
}

/// Price source over close series held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    closes: HashMap<Asset, Vec<f64>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the full chronological close series of `asset`.
    pub fn insert(&mut self, asset: Asset, closes: Vec<f64>) {
        self.closes.insert(asset, closes);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, asset: impl Into<Asset>, closes: Vec<f64>) -> Self {
        self.insert(asset.into(), closes);
        self
    }

    /// Append one close to the series of `asset`.
    pub fn push(&mut self, asset: &Asset, close: f64) {
        self.closes.entry(asset.clone()).or_default().push(close);
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.closes.keys()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

impl PriceSource for InMemoryPriceSource {
    fn window(&self, asset: &Asset, len: usize) -> Option<PriceWindow> {
        let series = self.closes.get(asset)?;
        let start = series.len().saturating_sub(len);
        Some(PriceWindow::new(&series[start..]))
    }
}
