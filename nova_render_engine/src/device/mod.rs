/// Device module - native device contracts, feature tiers and capabilities

// Module declarations
pub mod capabilities;
pub mod feature_tier;
pub mod handle;
pub mod native;

// Re-export everything from the submodules
pub use capabilities::*;
pub use feature_tier::*;
pub use handle::*;
pub use native::*;

// Mock native device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
