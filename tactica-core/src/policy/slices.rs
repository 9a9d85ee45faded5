//! Equal-share allocation over regime slices.

use crate::domain::AllocationMap;
use crate::regime::RegimeSlice;

/// Rebuild the whole map from every slice's current pick.
///
/// Each slice contributes `total_allocatable / slices.len()` to its
/// `current()` asset; an asset picked by several slices accumulates. Every
/// slice asset appears in the map, unpicked ones at zero.
pub fn equal_share_across_slices(slices: &[RegimeSlice], total_allocatable: f64) -> AllocationMap {
    let mut map = AllocationMap::zeroed(slices.iter().flat_map(|s| s.assets()));
    if slices.is_empty() {
        return map;
    }
    let share = total_allocatable / slices.len() as f64;
    for slice in slices {
        map.add(slice.current().clone(), share);
    }
    map
}
