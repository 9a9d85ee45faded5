use serde::{Deserialize, Serialize};
use std::fmt;

/// Tradable asset identifier (ticker symbol).
///
/// Opaque: only equality, ordering and hashing matter. Ordering is the
/// lexicographic order of the symbol, which keeps allocation maps and their
/// textual summaries stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Asset {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl From<String> for Asset {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}
