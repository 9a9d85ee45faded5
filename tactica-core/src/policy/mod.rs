//! Allocation policies: turn a cycle's factor values or slice states into
//! target weights.
//!
//! - `fixed_weights`: constant split, no factor input.
//! - `top_momentum_in_group`: positive-momentum screen, best asset takes the
//!   group's share, abstain when nothing passes.
//! - `top_momentum_overall`: no screen, best asset takes the full share.
//! - `equal_share_across_slices`: every slice's current pick at `1/n`.
//!
//! Every function returns the group's assets at weight zero unless selected,
//! so merging group results into one map flattens unselected holdings.

pub mod momentum;
pub mod slices;

pub use momentum::{select_top, top_momentum_in_group, top_momentum_overall, MomentumScreen};
pub use slices::equal_share_across_slices;

use crate::config::FixedWeight;
use crate::domain::AllocationMap;

/// Scale each configured weight by `total_allocatable`.
pub fn fixed_weights(weights: &[FixedWeight], total_allocatable: f64) -> AllocationMap {
    let mut map = AllocationMap::new();
    for fw in weights {
        map.add(fw.asset.clone(), fw.weight * total_allocatable);
    }
    map
}
