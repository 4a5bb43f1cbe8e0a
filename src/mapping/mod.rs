pub mod allocator;
pub mod rescue;
pub mod types;

pub use self::allocator::{allocate, BaseAllocation};
pub use self::rescue::{rescue_gaps, rescue_side, RescueEvent, RescueReport, RescueSide};
pub use self::types::KeyLedMap;
