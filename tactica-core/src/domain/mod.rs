//! Domain types for Tactica

pub mod allocation;
pub mod asset;
pub mod period;
pub mod window;

pub use allocation::AllocationMap;
pub use asset::Asset;
pub use period::PeriodId;
pub use window::{PriceWindow, WindowError};
