//! Device configuration.

use std::time::Duration;

use crate::traits::ColorMode;

/// Configuration applied when a device is opened.
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    device_id_offset: u32,
    color_mode: ColorMode,
    timing_timeout: Duration,
    manufacturer: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id_offset: 1001,
            color_mode: ColorMode::SensorRaw8,
            timing_timeout: Duration::from_millis(4000),
            manufacturer: "IDS Imaging".to_owned(),
        }
    }
}

impl DeviceConfig {
    /// Set the value added to a framework device id before addressing the camera.
    #[must_use]
    pub fn with_device_id_offset(mut self, offset: u32) -> Self {
        self.device_id_offset = offset;
        self
    }

    /// Set the sensor colour mode.
    #[must_use]
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    /// Set how long the optimal-timing search may run.
    #[must_use]
    pub fn with_timing_timeout(mut self, timeout: Duration) -> Self {
        self.timing_timeout = timeout;
        self
    }

    /// Set the manufacturer reported in the specification.
    #[must_use]
    pub fn with_manufacturer(mut self, manufacturer: String) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    // Getters
    /// Offset added to the framework device id.
    pub const fn device_id_offset(&self) -> u32 {
        self.device_id_offset
    }

    /// Colour mode set when the capture buffer is prepared.
    pub const fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Timeout for the optimal timing search.
    pub const fn timing_timeout(&self) -> Duration {
        self.timing_timeout
    }

    /// Manufacturer reported in the specification.
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    /// Device id the SDK is addressed with.
    pub const fn sdk_device_id(&self, device_id: u32) -> u32 {
        device_id.saturating_add(self.device_id_offset)
    }
}
