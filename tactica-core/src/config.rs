//! Strategy configuration: serializable, TOML-loadable, validated.
//!
//! A `StrategyConfig` names the policy variant, its universe and lookbacks,
//! and the allocatable share. The controller only accepts configs that pass
//! [`StrategyConfig::validate`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::Asset;
use crate::factors::FactorKind;

/// Share of capital every observed strategy allocates; the rest stays cash.
pub const DEFAULT_TOTAL_ALLOCATABLE: f64 = 0.99;

fn default_total_allocatable() -> f64 {
    DEFAULT_TOTAL_ALLOCATABLE
}

/// Errors from loading or validating a strategy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("total_allocatable must be in (0, 1], got {0}")]
    InvalidTotalAllocatable(f64),

    #[error("strategy '{0}' has an empty universe")]
    EmptyUniverse(String),

    #[error("group {index} is empty")]
    EmptyGroup { index: usize },

    #[error("asset '{asset}' appears more than once in {scope}")]
    DuplicateAsset { asset: Asset, scope: String },

    #[error("group_share must be in (0, 1], got {0}")]
    InvalidGroupShare(f64),

    #[error("weight for '{asset}' must be a finite non-negative number, got {weight}")]
    InvalidWeight { asset: Asset, weight: f64 },

    #[error("factor '{factor}' needs a lookback of at least {min} observations")]
    InvalidLookback { factor: String, min: usize },

    #[error("slice uses '{0}' as both risk and defensive asset")]
    DegenerateSlice(Asset),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("serialize config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One fixed-weight holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedWeight {
    pub asset: Asset,
    pub weight: f64,
}

impl FixedWeight {
    pub fn new(asset: impl Into<Asset>, weight: f64) -> Self {
        Self {
            asset: asset.into(),
            weight,
        }
    }
}

/// One regime slice: risk / defensive pair plus channel lookbacks in months.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliceConfig {
    pub risk: Asset,
    pub defensive: Asset,
    pub upper_months: usize,
    pub lower_months: usize,
}

impl SliceConfig {
    pub fn new(
        risk: impl Into<Asset>,
        defensive: impl Into<Asset>,
        upper_months: usize,
        lower_months: usize,
    ) -> Self {
        Self {
            risk: risk.into(),
            defensive: defensive.into(),
            upper_months,
            lower_months,
        }
    }
}

/// Allocation policy variant (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Constant weights, rebalanced every cycle.
    FixedWeights { weights: Vec<FixedWeight> },

    /// Best positive-momentum asset per group, `group_share` each
    /// (defaults to an equal split across groups).
    TopMomentumInGroup {
        factor: FactorKind,
        groups: Vec<Vec<Asset>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group_share: Option<f64>,
    },

    /// Best asset of the whole universe takes everything.
    TopMomentumOverall {
        factor: FactorKind,
        universe: Vec<Asset>,
    },

    /// Regime slices, equal share each, rebalanced only on a signal.
    EqualShareAcrossSlices { slices: Vec<SliceConfig> },
}

impl PolicyConfig {
    /// Short variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FixedWeights { .. } => "fixed_weights",
            Self::TopMomentumInGroup { .. } => "top_momentum_in_group",
            Self::TopMomentumOverall { .. } => "top_momentum_overall",
            Self::EqualShareAcrossSlices { .. } => "equal_share_across_slices",
        }
    }
}

/// Complete configuration of one strategy instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default = "default_total_allocatable")]
    pub total_allocatable: f64,
    pub policy: PolicyConfig,
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>, policy: PolicyConfig) -> Self {
        Self {
            name: name.into(),
            total_allocatable: DEFAULT_TOTAL_ALLOCATABLE,
            policy,
        }
    }

    /// Load a strategy from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a strategy from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the strategy to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Every asset the strategy may hold, in declaration order, deduplicated.
    pub fn universe(&self) -> Vec<Asset> {
        let mut seen = HashSet::new();
        let all: Vec<&Asset> = match &self.policy {
            PolicyConfig::FixedWeights { weights } => weights.iter().map(|w| &w.asset).collect(),
            PolicyConfig::TopMomentumInGroup { groups, .. } => groups.iter().flatten().collect(),
            PolicyConfig::TopMomentumOverall { universe, .. } => universe.iter().collect(),
            PolicyConfig::EqualShareAcrossSlices { slices } => slices
                .iter()
                .flat_map(|s| [&s.risk, &s.defensive])
                .collect(),
        };
        all.into_iter()
            .filter(|a| seen.insert(*a))
            .cloned()
            .collect()
    }

    /// Per-group share for `TopMomentumInGroup`, before scaling by
    /// `total_allocatable`.
    pub fn group_share(&self) -> Option<f64> {
        match &self.policy {
            PolicyConfig::TopMomentumInGroup {
                groups,
                group_share,
                ..
            } if !groups.is_empty() => Some(group_share.unwrap_or(1.0 / groups.len() as f64)),
            _ => None,
        }
    }

    /// Check every structural rule. Returns the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let total = self.total_allocatable;
        if !(total > 0.0 && total <= 1.0) {
            return Err(ConfigError::InvalidTotalAllocatable(total));
        }

        match &self.policy {
            PolicyConfig::FixedWeights { weights } => {
                if weights.is_empty() {
                    return Err(ConfigError::EmptyUniverse(self.name.clone()));
                }
                for fw in weights {
                    if !fw.weight.is_finite() || fw.weight < 0.0 {
                        return Err(ConfigError::InvalidWeight {
                            asset: fw.asset.clone(),
                            weight: fw.weight,
                        });
                    }
                }
                check_unique(weights.iter().map(|w| &w.asset), "fixed weights")?;
            }
            PolicyConfig::TopMomentumInGroup {
                factor,
                groups,
                group_share,
            } => {
                if groups.is_empty() {
                    return Err(ConfigError::EmptyUniverse(self.name.clone()));
                }
                for (index, group) in groups.iter().enumerate() {
                    if group.is_empty() {
                        return Err(ConfigError::EmptyGroup { index });
                    }
                    check_unique(group.iter(), &format!("group {index}"))?;
                }
                // An asset belongs to one group only.
                check_unique(groups.iter().flatten(), "groups")?;
                if let Some(share) = *group_share {
                    if !(share > 0.0 && share <= 1.0) {
                        return Err(ConfigError::InvalidGroupShare(share));
                    }
                }
                check_lookback(*factor)?;
            }
            PolicyConfig::TopMomentumOverall { factor, universe } => {
                if universe.is_empty() {
                    return Err(ConfigError::EmptyUniverse(self.name.clone()));
                }
                check_unique(universe.iter(), "universe")?;
                check_lookback(*factor)?;
            }
            PolicyConfig::EqualShareAcrossSlices { slices } => {
                if slices.is_empty() {
                    return Err(ConfigError::EmptyUniverse(self.name.clone()));
                }
                for slice in slices {
                    if slice.risk == slice.defensive {
                        return Err(ConfigError::DegenerateSlice(slice.risk.clone()));
                    }
                    for (label, months) in [("upper", slice.upper_months), ("lower", slice.lower_months)]
                    {
                        if months == 0 {
                            return Err(ConfigError::InvalidLookback {
                                factor: format!("{}_{label}_channel", slice.risk),
                                min: 1,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    pub fn fingerprint(&self) -> Result<ConfigHash, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(ConfigHash::from_bytes(json.as_bytes()))
    }
}

fn check_unique<'a>(
    assets: impl Iterator<Item = &'a Asset>,
    scope: &str,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for asset in assets {
        if !seen.insert(asset) {
            return Err(ConfigError::DuplicateAsset {
                asset: asset.clone(),
                scope: scope.to_string(),
            });
        }
    }
    Ok(())
}

fn check_lookback(factor: FactorKind) -> Result<(), ConfigError> {
    let min = match factor {
        FactorKind::Momentum { .. } => 2,
        _ => 1,
    };
    if factor.window_len() < min {
        return Err(ConfigError::InvalidLookback {
            factor: factor.key(),
            min,
        });
    }
    Ok(())
}

/// Hex-encoded BLAKE3 digest identifying a strategy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, enough to tell configs apart in logs.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
