//! Native uEye SDK binding (`libueye_api`).
#![allow(unsafe_code)]

use std::ffi::{c_char, c_double, c_int, c_uchar, c_uint, c_void};
use std::time::Duration;

use crate::binning::BinningMode;
use crate::raw::{
    IS_AOI_IMAGE_SET_AOI, IS_BEST_PCLK_RUN_ONCE, IS_EXPOSURE_CMD_SET_EXPOSURE,
    IS_PIXELCLOCK_CMD_SET, IS_SET_MASTER_GAIN_FACTOR, IS_SE_STARTER_FW_UPLOAD,
};
use crate::traits::{
    AoiRect, AutoParameter, BoardInfo, CameraHandle, CameraTiming, ColorMode, InitRequest,
    MemoryId, SdkResult, SensorInfo, Status, UeyeSdk, Wait,
};

type Hids = u32;

#[repr(C)]
#[allow(dead_code)]
struct RawBoardInfo {
    ser_no: [c_char; 12],
    id: [c_char; 20],
    version: [c_char; 10],
    date: [c_char; 12],
    select: c_uchar,
    kind: c_uchar,
    reserved: [c_char; 8],
}

#[repr(C)]
#[allow(dead_code)]
struct RawSensorInfo {
    sensor_id: u16,
    sensor_name: [c_char; 32],
    color_mode: c_char,
    max_width: u32,
    max_height: u32,
    master_gain: c_int,
    r_gain: c_int,
    g_gain: c_int,
    b_gain: c_int,
    glob_shutter: c_int,
    pixel_size: u16,
    upper_left_bayer_pixel: c_char,
    reserved: [c_char; 13],
}

#[repr(C)]
#[allow(dead_code)]
struct RawRect {
    x: c_int,
    y: c_int,
    width: c_int,
    height: c_int,
}

#[link(name = "ueye_api")]
extern "C" {
    fn is_InitCamera(camera: *mut Hids, window: *mut c_void) -> c_int;
    fn is_ExitCamera(camera: Hids) -> c_int;
    fn is_GetDuration(camera: Hids, mode: c_uint, time: *mut c_int) -> c_int;
    fn is_GetCameraInfo(camera: Hids, info: *mut RawBoardInfo) -> c_int;
    fn is_GetSensorInfo(camera: Hids, info: *mut RawSensorInfo) -> c_int;
    fn is_SetAllocatedImageMem(
        camera: Hids,
        width: c_int,
        height: c_int,
        bits_per_pixel: c_int,
        memory: *mut c_char,
        id: *mut c_int,
    ) -> c_int;
    fn is_SetImageMem(camera: Hids, memory: *mut c_char, id: c_int) -> c_int;
    fn is_FreeImageMem(camera: Hids, memory: *mut c_char, id: c_int) -> c_int;
    fn is_SetColorMode(camera: Hids, mode: c_int) -> c_int;
    fn is_SetOptimalCameraTiming(
        camera: Hids,
        mode: c_int,
        timeout: c_int,
        max_pixel_clock: *mut c_int,
        max_frame_rate: *mut c_double,
    ) -> c_int;
    fn is_CaptureVideo(camera: Hids, wait: c_int) -> c_int;
    fn is_FreezeVideo(camera: Hids, wait: c_int) -> c_int;
    fn is_SetAutoParameter(
        camera: Hids,
        param: c_int,
        value: *mut c_double,
        value2: *mut c_double,
    ) -> c_int;
    fn is_Exposure(camera: Hids, command: c_uint, param: *mut c_void, size: c_uint) -> c_int;
    fn is_SetHWGainFactor(camera: Hids, mode: c_int, factor: c_int) -> c_int;
    fn is_SetBinning(camera: Hids, mode: c_int) -> c_int;
    fn is_AOI(camera: Hids, command: c_uint, param: *mut c_void, size: c_uint) -> c_int;
    fn is_PixelClock(camera: Hids, command: c_uint, param: *mut c_void, size: c_uint) -> c_int;
}

#[allow(clippy::cast_sign_loss)]
fn fixed_str(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn dim(value: u32) -> SdkResult<c_int> {
    c_int::try_from(value).map_err(|_| Status::INVALID_PARAMETER)
}

fn size_of<T>() -> c_uint {
    #[allow(clippy::cast_possible_truncation)]
    {
        std::mem::size_of::<T>() as c_uint
    }
}

/// The installed uEye driver.
#[derive(Debug, Default)]
pub struct UeyeDriver;

impl UeyeDriver {
    /// Bind to the system uEye library.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl UeyeSdk for UeyeDriver {
    fn init_camera(&mut self, request: InitRequest) -> SdkResult<CameraHandle> {
        let mut camera: Hids = request.0;
        // SAFETY: `camera` is a valid out-pointer; a null window handle is allowed.
        Status(unsafe { is_InitCamera(&mut camera, std::ptr::null_mut()) }).check()?;
        Ok(CameraHandle(camera))
    }

    fn exit_camera(&mut self, camera: CameraHandle) -> SdkResult<()> {
        // SAFETY: plain value arguments.
        Status(unsafe { is_ExitCamera(camera.0) }).check()
    }

    fn firmware_upload_duration(&mut self, request: InitRequest) -> SdkResult<Duration> {
        let mut seconds: c_int = 0;
        // SAFETY: `seconds` is a valid out-pointer.
        Status(unsafe { is_GetDuration(request.0, IS_SE_STARTER_FW_UPLOAD, &mut seconds) })
            .check()?;
        Ok(Duration::from_secs(u64::try_from(seconds).unwrap_or(0)))
    }

    fn camera_info(&mut self, camera: CameraHandle) -> SdkResult<BoardInfo> {
        let mut raw = RawBoardInfo {
            ser_no: [0; 12],
            id: [0; 20],
            version: [0; 10],
            date: [0; 12],
            select: 0,
            kind: 0,
            reserved: [0; 8],
        };
        // SAFETY: `raw` matches the `BOARDINFO` layout.
        Status(unsafe { is_GetCameraInfo(camera.0, &mut raw) }).check()?;
        Ok(BoardInfo {
            serial_number: fixed_str(&raw.ser_no),
            id: fixed_str(&raw.id),
            version: fixed_str(&raw.version),
            date: fixed_str(&raw.date),
        })
    }

    fn sensor_info(&mut self, camera: CameraHandle) -> SdkResult<SensorInfo> {
        let mut raw = RawSensorInfo {
            sensor_id: 0,
            sensor_name: [0; 32],
            color_mode: 0,
            max_width: 0,
            max_height: 0,
            master_gain: 0,
            r_gain: 0,
            g_gain: 0,
            b_gain: 0,
            glob_shutter: 0,
            pixel_size: 0,
            upper_left_bayer_pixel: 0,
            reserved: [0; 13],
        };
        // SAFETY: `raw` matches the `SENSORINFO` layout.
        Status(unsafe { is_GetSensorInfo(camera.0, &mut raw) }).check()?;
        Ok(SensorInfo {
            sensor_id: raw.sensor_id,
            name: fixed_str(&raw.sensor_name),
            max_width: raw.max_width,
            max_height: raw.max_height,
        })
    }

    fn set_allocated_image_mem(
        &mut self,
        camera: CameraHandle,
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        buffer: &mut [u8],
    ) -> SdkResult<MemoryId> {
        let needed = width as usize * height as usize * (bits_per_pixel as usize).div_ceil(8);
        if buffer.len() < needed {
            return Err(Status::INVALID_PARAMETER);
        }
        let mut id: c_int = 0;
        // SAFETY: the buffer holds `needed` bytes and the caller keeps it alive
        // and unmoved until `free_image_mem`.
        Status(unsafe {
            is_SetAllocatedImageMem(
                camera.0,
                dim(width)?,
                dim(height)?,
                dim(bits_per_pixel)?,
                buffer.as_mut_ptr().cast(),
                &mut id,
            )
        })
        .check()?;
        Ok(MemoryId(id))
    }

    fn set_image_mem(
        &mut self,
        camera: CameraHandle,
        buffer: &mut [u8],
        memory: MemoryId,
    ) -> SdkResult<()> {
        // SAFETY: the buffer was registered under `memory`.
        Status(unsafe { is_SetImageMem(camera.0, buffer.as_mut_ptr().cast(), memory.0) }).check()
    }

    fn free_image_mem(
        &mut self,
        camera: CameraHandle,
        buffer: &mut [u8],
        memory: MemoryId,
    ) -> SdkResult<()> {
        // SAFETY: the buffer was registered under `memory`.
        Status(unsafe { is_FreeImageMem(camera.0, buffer.as_mut_ptr().cast(), memory.0) }).check()
    }

    fn set_color_mode(&mut self, camera: CameraHandle, mode: ColorMode) -> SdkResult<()> {
        // SAFETY: plain value arguments.
        Status(unsafe { is_SetColorMode(camera.0, mode.raw()) }).check()
    }

    fn set_optimal_camera_timing(
        &mut self,
        camera: CameraHandle,
        timeout: Duration,
    ) -> SdkResult<CameraTiming> {
        let timeout = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
        let mut max_pixel_clock: c_int = 0;
        let mut frame_rate: c_double = 0.0;
        // SAFETY: both out-pointers are valid.
        Status(unsafe {
            is_SetOptimalCameraTiming(
                camera.0,
                IS_BEST_PCLK_RUN_ONCE,
                timeout,
                &mut max_pixel_clock,
                &mut frame_rate,
            )
        })
        .check()?;
        Ok(CameraTiming {
            max_pixel_clock,
            frame_rate,
        })
    }

    fn capture_video(&mut self, camera: CameraHandle, wait: Wait) -> SdkResult<()> {
        // SAFETY: plain value arguments.
        Status(unsafe { is_CaptureVideo(camera.0, wait.raw()) }).check()
    }

    fn freeze_video(&mut self, camera: CameraHandle, wait: Wait) -> SdkResult<()> {
        // SAFETY: plain value arguments.
        Status(unsafe { is_FreezeVideo(camera.0, wait.raw()) }).check()
    }

    fn set_auto_parameter(
        &mut self,
        camera: CameraHandle,
        parameter: AutoParameter,
        value: f64,
    ) -> SdkResult<()> {
        let mut value = value;
        let mut unused: c_double = 0.0;
        // SAFETY: both value pointers are valid for the call.
        Status(unsafe { is_SetAutoParameter(camera.0, parameter.raw(), &mut value, &mut unused) })
            .check()
    }

    fn set_exposure(&mut self, camera: CameraHandle, millis: f64) -> SdkResult<f64> {
        let mut millis: c_double = millis;
        // SAFETY: the parameter is a single double, as the command expects.
        Status(unsafe {
            is_Exposure(
                camera.0,
                IS_EXPOSURE_CMD_SET_EXPOSURE,
                std::ptr::addr_of_mut!(millis).cast(),
                size_of::<c_double>(),
            )
        })
        .check()?;
        Ok(millis)
    }

    fn set_master_gain_factor(&mut self, camera: CameraHandle, factor: i32) -> SdkResult<i32> {
        // Returns the applied factor rather than a status.
        // SAFETY: plain value arguments.
        let applied = unsafe { is_SetHWGainFactor(camera.0, IS_SET_MASTER_GAIN_FACTOR, factor) };
        if applied < 0 {
            Err(Status(applied))
        } else {
            Ok(applied)
        }
    }

    fn set_binning(&mut self, camera: CameraHandle, mode: BinningMode) -> SdkResult<()> {
        // SAFETY: plain value arguments.
        Status(unsafe { is_SetBinning(camera.0, mode.0) }).check()
    }

    fn set_aoi(&mut self, camera: CameraHandle, rect: AoiRect) -> SdkResult<()> {
        let mut raw = RawRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        };
        // SAFETY: `raw` matches the `IS_RECT` layout.
        Status(unsafe {
            is_AOI(
                camera.0,
                IS_AOI_IMAGE_SET_AOI,
                std::ptr::addr_of_mut!(raw).cast(),
                size_of::<RawRect>(),
            )
        })
        .check()
    }

    fn set_pixel_clock(&mut self, camera: CameraHandle, mhz: u32) -> SdkResult<()> {
        let mut mhz: c_uint = mhz;
        // SAFETY: the parameter is a single UINT, as the command expects.
        Status(unsafe {
            is_PixelClock(
                camera.0,
                IS_PIXELCLOCK_CMD_SET,
                std::ptr::addr_of_mut!(mhz).cast(),
                size_of::<c_uint>(),
            )
        })
        .check()
    }
}
