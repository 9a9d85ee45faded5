//! Tactica Core: signal engine for periodic tactical asset allocation.
//!
//! This crate turns already-materialized closing-price windows into target
//! weight maps:
//! - Domain types (assets, price windows, period ids, allocation maps)
//! - Factor library: simple and 13612 composite momentum, channel extrema
//! - Regime slices: hysteretic risk-on / defensive switch per asset pair
//! - Allocation policies: fixed weights, top momentum per group or overall,
//!   equal share across regime slices
//! - Rebalance controller driving one cycle at a time
//!
//! Price retrieval, scheduling and order execution live outside this crate.
//! The controller declares the windows it needs through [`data::PriceSource`]
//! and hands back a [`domain::AllocationMap`].

pub mod config;
pub mod controller;
pub mod data;
pub mod domain;
pub mod factors;
pub mod policy;
pub mod presets;
pub mod regime;

pub use config::{ConfigError, ConfigHash, PolicyConfig, SliceConfig, StrategyConfig};
pub use controller::{CycleError, CycleReport, RebalanceController};
pub use data::{InMemoryPriceSource, PriceSource, WindowRequest};
pub use domain::{AllocationMap, Asset, PeriodId, PriceWindow, WindowError};
pub use factors::{CompositeVariant, FactorKind, FactorTable};
pub use presets::StrategyPreset;
pub use regime::{ChannelReading, Regime, RegimeSlice, SliceTransition};
