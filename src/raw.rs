//! Command codes from `uEye.h` used by the native binding.

use std::ffi::{c_int, c_uint};

/// `IS_SE_STARTER_FW_UPLOAD`, for `is_GetDuration`.
pub const IS_SE_STARTER_FW_UPLOAD: c_uint = 0x0000_0001;
/// `IS_BEST_PCLK_RUN_ONCE`, for `is_SetOptimalCameraTiming`.
pub const IS_BEST_PCLK_RUN_ONCE: c_int = 0;
/// `IS_EXPOSURE_CMD_SET_EXPOSURE`, for `is_Exposure`.
pub const IS_EXPOSURE_CMD_SET_EXPOSURE: c_uint = 12;
/// `IS_GET_MASTER_GAIN_FACTOR`, for `is_SetHWGainFactor`. Reads only.
pub const IS_GET_MASTER_GAIN_FACTOR: c_int = 0x8000;
/// `IS_SET_MASTER_GAIN_FACTOR`, for `is_SetHWGainFactor`.
pub const IS_SET_MASTER_GAIN_FACTOR: c_int = 0x8004;
/// `IS_AOI_IMAGE_SET_AOI`, for `is_AOI`.
pub const IS_AOI_IMAGE_SET_AOI: c_uint = 0x0001;
/// `IS_PIXELCLOCK_CMD_SET`, for `is_PixelClock`.
pub const IS_PIXELCLOCK_CMD_SET: c_uint = 6;
