//! Core traits and types for the uEye camera abstraction.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use crate::binning::{Axis, BinningMode};

/// Return code of a uEye SDK call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    /// `IS_SUCCESS`.
    pub const SUCCESS: Self = Self(0);
    /// `IS_NO_SUCCESS`.
    pub const NO_SUCCESS: Self = Self(-1);
    /// `IS_INVALID_CAMERA_HANDLE`.
    pub const INVALID_CAMERA_HANDLE: Self = Self(1);
    /// `IS_INVALID_PARAMETER`.
    pub const INVALID_PARAMETER: Self = Self(125);
    /// `IS_NOT_SUPPORTED`.
    pub const NOT_SUPPORTED: Self = Self(155);
    /// `IS_STARTER_FW_UPLOAD_NEEDED`: the camera needs a new starter firmware.
    pub const STARTER_FW_UPLOAD_NEEDED: Self = Self(315);

    /// Whether the code is the success sentinel.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Convert a raw return code into a result.
    pub const fn check(self) -> SdkResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("IS_SUCCESS"),
            -1 => Some("IS_NO_SUCCESS"),
            1 => Some("IS_INVALID_CAMERA_HANDLE"),
            125 => Some("IS_INVALID_PARAMETER"),
            155 => Some("IS_NOT_SUPPORTED"),
            315 => Some("IS_STARTER_FW_UPLOAD_NEEDED"),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "status {}", self.0),
        }
    }
}

/// Result of a raw SDK call.
pub type SdkResult<T> = std::result::Result<T, Status>;

/// Value handed to `is_InitCamera`: a device or camera id plus mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitRequest(pub u32);

impl InitRequest {
    /// `IS_USE_DEVICE_ID`: address the camera by device id.
    pub const USE_DEVICE_ID: u32 = 0x8000;
    /// `IS_ALLOW_STARTER_FW_UPLOAD`: let the driver flash starter firmware.
    pub const ALLOW_STARTER_FW_UPLOAD: u32 = 0x10000;

    /// Address a camera by device id.
    #[must_use]
    pub const fn by_device_id(device_id: u32) -> Self {
        Self(device_id | Self::USE_DEVICE_ID)
    }

    /// The same request with firmware upload allowed.
    #[must_use]
    pub const fn allow_firmware_upload(self) -> Self {
        Self(self.0 | Self::ALLOW_STARTER_FW_UPLOAD)
    }
}

/// Open camera handle (`HIDS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub u32);

/// Identifier of a registered image memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryId(pub i32);

/// Board information (`BOARDINFO`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardInfo {
    /// Serial number.
    pub serial_number: String,
    /// Manufacturer id string.
    pub id: String,
    /// Board version.
    pub version: String,
    /// Production date.
    pub date: String,
}

/// Sensor information (`SENSORINFO`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorInfo {
    /// Sensor id.
    pub sensor_id: u16,
    /// Sensor name.
    pub name: String,
    /// Maximum image width.
    pub max_width: u32,
    /// Maximum image height.
    pub max_height: u32,
}

/// Sensor colour mode (`IS_CM_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Raw 8-bit Bayer or mono data.
    SensorRaw8,
    /// 8-bit mono.
    Mono8,
}

impl ColorMode {
    /// SDK constant for this mode.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::SensorRaw8 => 11,
            Self::Mono8 => 6,
        }
    }

    /// Bits per pixel of the image memory.
    #[must_use]
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::SensorRaw8 | Self::Mono8 => 8,
        }
    }
}

/// Whether a capture request blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// `IS_DONT_WAIT`.
    DontWait,
    /// `IS_WAIT`.
    Wait,
}

impl Wait {
    /// SDK constant.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::DontWait => 0,
            Self::Wait => 1,
        }
    }
}

/// Auto-control parameters that can be switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoParameter {
    /// `IS_SET_ENABLE_AUTO_GAIN`.
    Gain,
    /// `IS_SET_ENABLE_AUTO_SHUTTER`.
    Shutter,
}

impl AutoParameter {
    /// SDK constant.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Gain => 0x8800,
            Self::Shutter => 0x8802,
        }
    }
}

/// Timing chosen by the optimal-timing routine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTiming {
    /// Maximum pixel clock in MHz.
    pub max_pixel_clock: i32,
    /// Frame rate at that clock.
    pub frame_rate: f64,
}

/// Area of interest in absolute sensor coordinates (`IS_RECT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AoiRect {
    /// Left edge, with the absolute-position bit set.
    pub x: i32,
    /// Top edge, with the absolute-position bit set.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl AoiRect {
    /// `IS_AOI_IMAGE_POS_ABSOLUTE`.
    pub const POS_ABSOLUTE: i32 = 0x1000_0000;
}

/// Region of interest as supplied by the host framework.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roi {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Roi {
    /// Create a region of interest.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Truncate to integers and mark the origin as absolute.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_aoi(self) -> AoiRect {
        AoiRect {
            x: (self.x as i32) | AoiRect::POS_ABSOLUTE,
            y: (self.y as i32) | AoiRect::POS_ABSOLUTE,
            width: self.width as i32,
            height: self.height as i32,
        }
    }
}

/// Optional capabilities a device can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    /// Pixel binning.
    Binning,
    /// Addressing by device id.
    DeviceId,
    /// Manual exposure.
    Exposure,
    /// Continuous capture.
    FreeRun,
    /// Manual gain.
    Gain,
    /// General purpose output.
    Gpo,
    /// Single-frame capture.
    OneShot,
    /// Pixel clock control.
    PixelClock,
    /// Region of interest.
    Roi,
    /// Hardware triggering.
    Triggering,
}

impl Feature {
    /// Every feature a uEye device declares.
    pub const UEYE: [Self; 10] = [
        Self::Binning,
        Self::DeviceId,
        Self::Exposure,
        Self::FreeRun,
        Self::Gain,
        Self::Gpo,
        Self::OneShot,
        Self::PixelClock,
        Self::Roi,
        Self::Triggering,
    ];
}

/// Sensor capabilities reported when a device is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    /// Maximum sensor width.
    pub sensor_width: u32,
    /// Maximum sensor height.
    pub sensor_height: u32,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model id.
    pub model: String,
    /// Serial number.
    pub serial: String,
    features: BTreeSet<Feature>,
}

impl Specification {
    /// Create a specification with no features.
    #[must_use]
    pub fn new(
        sensor_width: u32,
        sensor_height: u32,
        manufacturer: String,
        model: String,
        serial: String,
    ) -> Self {
        Self {
            sensor_width,
            sensor_height,
            manufacturer,
            model,
            serial,
            features: BTreeSet::new(),
        }
    }

    /// Add features.
    #[must_use]
    pub fn with_features<I: IntoIterator<Item = Feature>>(mut self, features: I) -> Self {
        self.features.extend(features);
        self
    }

    /// Whether the feature is supported.
    #[must_use]
    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Declared features in a stable order.
    #[must_use]
    pub const fn features(&self) -> &BTreeSet<Feature> {
        &self.features
    }
}

/// A single captured frame, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data.
    pub data: Vec<u8>,
}

/// Error type for camera operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// The camera could not be initialised.
    #[error("Couldn't initialise camera {device_id}: {status}")]
    InitFailed {
        /// Requested device id.
        device_id: u32,
        /// Last status returned by the SDK.
        status: Status,
    },
    /// The device has no open camera handle.
    #[error("Device is not open")]
    NotOpen,
    /// The device already holds a camera handle.
    #[error("Device is already open")]
    AlreadyOpen,
    /// No pixel buffer is bound to the camera yet.
    #[error("No image memory bound, prepare the capture first")]
    NoImageMemory,
    /// A binning factor is outside `1..=16`.
    #[error("Can't set {axis} binning of {factor}, must be between 1 and 16")]
    BinningOutOfRange {
        /// Offending axis.
        axis: Axis,
        /// Requested factor.
        factor: u32,
    },
    /// A binning factor the camera has no mode for.
    #[error("Cannot set {axis} binning of {factor}, please check manual for valid values")]
    UnsupportedBinning {
        /// Offending axis.
        axis: Axis,
        /// Requested factor.
        factor: u32,
    },
    /// An SDK call returned a failure code.
    #[error("{operation} failed: {status}")]
    Sdk {
        /// The vendor function that failed.
        operation: &'static str,
        /// Its return code.
        status: Status,
    },
}

impl CameraError {
    /// Wrap a failed SDK status with the call that produced it.
    #[must_use]
    pub const fn sdk(operation: &'static str, status: Status) -> Self {
        Self::Sdk { operation, status }
    }
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// Call surface of the uEye SDK.
///
/// Each method mirrors one vendor function. Implementations return the raw
/// status on failure; interpreting it is left to [`crate::Device`].
pub trait UeyeSdk {
    /// `is_InitCamera`.
    fn init_camera(&mut self, request: InitRequest) -> SdkResult<CameraHandle>;

    /// `is_ExitCamera`.
    fn exit_camera(&mut self, camera: CameraHandle) -> SdkResult<()>;

    /// `is_GetDuration` with `IS_SE_STARTER_FW_UPLOAD`.
    fn firmware_upload_duration(&mut self, request: InitRequest) -> SdkResult<Duration>;

    /// `is_GetCameraInfo`.
    fn camera_info(&mut self, camera: CameraHandle) -> SdkResult<BoardInfo>;

    /// `is_GetSensorInfo`.
    fn sensor_info(&mut self, camera: CameraHandle) -> SdkResult<SensorInfo>;

    /// `is_SetAllocatedImageMem`: register a caller-owned buffer.
    ///
    /// The buffer must stay alive and unmoved until [`UeyeSdk::free_image_mem`].
    fn set_allocated_image_mem(
        &mut self,
        camera: CameraHandle,
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        buffer: &mut [u8],
    ) -> SdkResult<MemoryId>;

    /// `is_SetImageMem`: make a registered buffer the active one.
    fn set_image_mem(
        &mut self,
        camera: CameraHandle,
        buffer: &mut [u8],
        memory: MemoryId,
    ) -> SdkResult<()>;

    /// `is_FreeImageMem`: unregister a buffer.
    fn free_image_mem(
        &mut self,
        camera: CameraHandle,
        buffer: &mut [u8],
        memory: MemoryId,
    ) -> SdkResult<()>;

    /// `is_SetColorMode`.
    fn set_color_mode(&mut self, camera: CameraHandle, mode: ColorMode) -> SdkResult<()>;

    /// `is_SetOptimalCameraTiming` with `IS_BEST_PCLK_RUN_ONCE`.
    fn set_optimal_camera_timing(
        &mut self,
        camera: CameraHandle,
        timeout: Duration,
    ) -> SdkResult<CameraTiming>;

    /// `is_CaptureVideo`.
    fn capture_video(&mut self, camera: CameraHandle, wait: Wait) -> SdkResult<()>;

    /// `is_FreezeVideo`.
    fn freeze_video(&mut self, camera: CameraHandle, wait: Wait) -> SdkResult<()>;

    /// `is_SetAutoParameter`.
    fn set_auto_parameter(
        &mut self,
        camera: CameraHandle,
        parameter: AutoParameter,
        value: f64,
    ) -> SdkResult<()>;

    /// `is_Exposure` with `IS_EXPOSURE_CMD_SET_EXPOSURE`. Returns the applied value.
    fn set_exposure(&mut self, camera: CameraHandle, millis: f64) -> SdkResult<f64>;

    /// `is_SetHWGainFactor` with `IS_SET_MASTER_GAIN_FACTOR`. Returns the applied factor.
    fn set_master_gain_factor(&mut self, camera: CameraHandle, factor: i32) -> SdkResult<i32>;

    /// `is_SetBinning`.
    fn set_binning(&mut self, camera: CameraHandle, mode: BinningMode) -> SdkResult<()>;

    /// `is_AOI` with `IS_AOI_IMAGE_SET_AOI`.
    fn set_aoi(&mut self, camera: CameraHandle, rect: AoiRect) -> SdkResult<()>;

    /// `is_PixelClock` with `IS_PIXELCLOCK_CMD_SET`.
    fn set_pixel_clock(&mut self, camera: CameraHandle, mhz: u32) -> SdkResult<()>;
}
