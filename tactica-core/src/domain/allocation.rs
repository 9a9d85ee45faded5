//! AllocationMap: target weights handed to the execution layer.

use super::Asset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Target weight per asset, each in `[0, 1]`.
///
/// Zero entries are meaningful: they tell the execution layer to flatten a
/// universe member that was not selected this cycle. The map does not enforce
/// a total below one; policies pick consistent per-bucket shares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationMap {
    weights: BTreeMap<Asset, f64>,
}

impl AllocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with every asset present at weight zero.
    pub fn zeroed<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> Self {
        Self {
            weights: assets.into_iter().map(|a| (a.clone(), 0.0)).collect(),
        }
    }

    /// Overwrite the weight of `asset`. Negative or NaN weights are stored as zero.
    pub fn set(&mut self, asset: Asset, weight: f64) {
        self.weights.insert(asset, sanitize(weight));
    }

    /// Add `weight` to whatever `asset` already holds.
    pub fn add(&mut self, asset: Asset, weight: f64) {
        *self.weights.entry(asset).or_insert(0.0) += sanitize(weight);
    }

    /// Copy every entry of `other` into `self`, overwriting shared assets.
    pub fn merge(&mut self, other: AllocationMap) {
        self.weights.extend(other.weights);
    }

    /// Weight of `asset`, zero when absent.
    pub fn get(&self, asset: &Asset) -> f64 {
        self.weights.get(asset).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, asset: &Asset) -> bool {
        self.weights.contains_key(asset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Asset, f64)> {
        self.weights.iter().map(|(a, &w)| (a, w))
    }

    /// Entries with a strictly positive weight.
    pub fn non_zero(&self) -> impl Iterator<Item = (&Asset, f64)> {
        self.iter().filter(|&(_, w)| w > 0.0)
    }

    /// Number of assets with a strictly positive weight.
    pub fn held(&self) -> usize {
        self.non_zero().count()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sorted `SYMBOL=weight` pairs for non-zero entries, space separated.
    pub fn summary(&self) -> String {
        let mut pairs: Vec<String> = self
            .non_zero()
            .map(|(asset, weight)| format!("{asset}={weight}"))
            .collect();
        pairs.sort();
        pairs.join(" ")
    }
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_nan() || weight < 0.0 {
        0.0
    } else {
        weight
    }
}
