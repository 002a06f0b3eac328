//! ueye-capture: an IDS uEye camera adapter
//!
//! This library wraps the uEye SDK behind a trait so the device logic can run
//! against real hardware or a simulated driver in tests.

pub mod binning;
pub mod config;
pub mod device;
pub mod logging;
pub mod raw;
pub mod traits;

#[cfg(feature = "ueye")]
pub mod sdk;

#[cfg(test)]
pub mod mock;

pub use binning::{Axis, BinningMode, BinningOutcome};
pub use config::DeviceConfig;
pub use device::{Device, DeviceState, ManualControlOutcome};
pub use logging::{LogFacade, Logger};
pub use traits::{
    CameraError, CameraTiming, ColorMode, Feature, Frame, Roi, Specification, Status, UeyeSdk,
};

#[cfg(feature = "ueye")]
pub use sdk::UeyeDriver;
