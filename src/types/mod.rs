//! Type definitions for the Wave API
//!
//! Records decoded from API responses, plus identifier newtypes.

// Module declarations
pub mod device;
pub mod energy;
pub mod identifiers;
pub mod write;

pub use device::{DeviceMode, DeviceStatus};
pub use energy::{EnergyUsage, ViewType};
pub use identifiers::{MacAddress, RequestId};
pub use write::WriteResponse;
