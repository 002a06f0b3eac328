//! uEye device built on top of an [`UeyeSdk`] implementation.

use std::time::Duration;

use crate::binning::{self, Axis, BinningMode, BinningOutcome};
use crate::config::DeviceConfig;
use crate::logging::{LogFacade, Logger};
use crate::traits::{
    AutoParameter, CameraError, CameraHandle, CameraTiming, Feature, Frame, InitRequest,
    MemoryId, Result, Roi, Specification, Status, UeyeSdk, Wait,
};

/// Lifecycle of a [`Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Constructed, no camera handle yet.
    Uninitialized,
    /// Camera handle held, not capturing.
    Opened,
    /// Continuous capture requested.
    Capturing,
    /// Capture stopped.
    Stopped,
    /// Handle released by [`Device::close`].
    Closed,
}

/// Results of a disable-auto then set-manual pair.
///
/// The second step runs whatever the first returned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ManualControlOutcome {
    /// Switching the automatic control off.
    pub disable_auto: Result<()>,
    /// Applying the manual value.
    pub apply: Result<()>,
}

impl ManualControlOutcome {
    /// Whether both steps succeeded.
    pub const fn is_ok(&self) -> bool {
        self.disable_auto.is_ok() && self.apply.is_ok()
    }

    /// First failure, if any.
    pub fn into_result(self) -> Result<()> {
        self.disable_auto.and(self.apply)
    }
}

/// Everything acquired between open and close.
struct Session {
    camera: CameraHandle,
    memory: Option<MemoryId>,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    timing: Option<CameraTiming>,
    prepared: bool,
}

impl Session {
    const fn new(camera: CameraHandle) -> Self {
        Self {
            camera,
            memory: None,
            pixels: Vec::new(),
            width: 0,
            height: 0,
            timing: None,
            prepared: false,
        }
    }
}

/// A uEye camera.
///
/// Dropping an open device frees its image memory and exits the camera.
pub struct Device<S: UeyeSdk, L: Logger = LogFacade> {
    sdk: S,
    logger: L,
    config: DeviceConfig,
    state: DeviceState,
    session: Option<Session>,
    specification: Option<Specification>,
}

impl<S: UeyeSdk> Device<S> {
    /// Create a device that logs through the `log` crate.
    pub fn new(sdk: S) -> Self {
        Self::with_logger(sdk, LogFacade)
    }
}

impl<S: UeyeSdk, L: Logger> Device<S, L> {
    /// Create a device with an injected logger.
    pub fn with_logger(sdk: S, logger: L) -> Self {
        Self {
            sdk,
            logger,
            config: DeviceConfig::default(),
            state: DeviceState::Uninitialized,
            session: None,
            specification: None,
        }
    }

    /// Replace the configuration. Takes effect on the next open.
    #[must_use]
    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Open the camera, describe it and bind a capture buffer.
    ///
    /// On failure after initialisation the handle is released again and the
    /// device returns to [`DeviceState::Uninitialized`].
    pub fn open(&mut self, device_id: u32) -> Result<Specification> {
        self.connect(device_id)?;

        let result = self.describe().and_then(|spec| {
            self.prepare_capture()?;
            Ok(spec)
        });

        match result {
            Ok(spec) => {
                self.specification = Some(spec.clone());
                Ok(spec)
            }
            Err(err) => {
                if let Some(session) = self.session.take() {
                    let _ = self.release(session);
                }
                self.state = DeviceState::Uninitialized;
                Err(err)
            }
        }
    }

    /// Initialise the camera, uploading starter firmware if the driver asks for it.
    pub fn connect(&mut self, device_id: u32) -> Result<()> {
        if self.session.is_some() {
            return Err(CameraError::AlreadyOpen);
        }

        let request = InitRequest::by_device_id(self.config.sdk_device_id(device_id));
        let result = match self.sdk.init_camera(request) {
            Err(status) if status == Status::STARTER_FW_UPLOAD_NEEDED => {
                match self.sdk.firmware_upload_duration(request) {
                    Ok(wait) => self.logger.warn(&format!(
                        "Camera firmware upload required, please wait {}s",
                        wait.as_secs()
                    )),
                    Err(_) => self.logger.warn("Camera firmware upload required"),
                }
                self.sdk.init_camera(request.allow_firmware_upload())
            }
            other => other,
        };

        let camera = result.map_err(|status| {
            self.logger
                .error(&format!("Couldn't initialise camera {device_id} ({status})"));
            CameraError::InitFailed { device_id, status }
        })?;

        self.session = Some(Session::new(camera));
        self.state = DeviceState::Opened;
        Ok(())
    }

    /// Query board and sensor information. Changes no device state.
    pub fn describe(&mut self) -> Result<Specification> {
        let camera = self.camera()?;

        let board = self.sdk.camera_info(camera).map_err(|status| {
            sdk_error(&self.logger, "Couldn't read camera info", "is_GetCameraInfo", status)
        })?;
        let sensor = self.sdk.sensor_info(camera).map_err(|status| {
            sdk_error(&self.logger, "Couldn't read sensor info", "is_GetSensorInfo", status)
        })?;

        Ok(Specification::new(
            sensor.max_width,
            sensor.max_height,
            self.config.manufacturer().to_owned(),
            board.id,
            board.serial_number,
        )
        .with_features(Feature::UEYE))
    }

    /// Allocate a full-sensor pixel buffer, bind it as image memory, set the
    /// colour mode and run the optimal timing search.
    ///
    /// Returns the timing the driver chose, or `None` if the search failed.
    /// A second call keeps the existing buffer.
    pub fn prepare_capture(&mut self) -> Result<Option<CameraTiming>> {
        let color_mode = self.config.color_mode();
        let timeout = self.config.timing_timeout();
        let session = self.session.as_mut().ok_or(CameraError::NotOpen)?;
        if session.prepared {
            return Ok(session.timing);
        }
        let camera = session.camera;

        // The old buffer stays registered with the driver until the free succeeds.
        if let Some(memory) = session.memory {
            self.sdk
                .free_image_mem(camera, &mut session.pixels, memory)
                .map_err(|status| {
                    sdk_error(
                        &self.logger,
                        "Couldn't free image memory",
                        "is_FreeImageMem",
                        status,
                    )
                })?;
            session.memory = None;
        }

        let sensor = self.sdk.sensor_info(camera).map_err(|status| {
            sdk_error(&self.logger, "Couldn't read sensor info", "is_GetSensorInfo", status)
        })?;

        session.width = sensor.max_width;
        session.height = sensor.max_height;
        session.pixels = vec![0; sensor.max_width as usize * sensor.max_height as usize];

        let memory = self
            .sdk
            .set_allocated_image_mem(
                camera,
                session.width,
                session.height,
                color_mode.bits_per_pixel(),
                &mut session.pixels,
            )
            .map_err(|status| {
                sdk_error(
                    &self.logger,
                    "Couldn't allocate image memory",
                    "is_SetAllocatedImageMem",
                    status,
                )
            })?;
        session.memory = Some(memory);

        self.sdk
            .set_image_mem(camera, &mut session.pixels, memory)
            .map_err(|status| {
                sdk_error(&self.logger, "Couldn't set image memory", "is_SetImageMem", status)
            })?;

        self.sdk.set_color_mode(camera, color_mode).map_err(|status| {
            sdk_error(&self.logger, "Couldn't set color mode", "is_SetColorMode", status)
        })?;

        session.timing = match self.sdk.set_optimal_camera_timing(camera, timeout) {
            Ok(timing) => Some(timing),
            Err(status) => {
                self.logger
                    .warn(&format!("Couldn't find optimal camera timing ({status})"));
                None
            }
        };
        session.prepared = true;

        Ok(session.timing)
    }

    /// Release image memory and the camera handle.
    ///
    /// Does nothing if the device is not open.
    pub fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        self.state = DeviceState::Closed;
        self.release(session)
    }

    /// Start continuous capture without waiting for the first frame.
    pub fn start_capture(&mut self) -> Result<()> {
        let camera = self.camera()?;
        self.sdk
            .capture_video(camera, Wait::DontWait)
            .map_err(|status| {
                sdk_error(&self.logger, "Couldn't start capture", "is_CaptureVideo", status)
            })?;
        self.state = DeviceState::Capturing;
        Ok(())
    }

    /// Stop capture without waiting for the current frame.
    pub fn stop_capture(&mut self) -> Result<()> {
        let camera = self.camera()?;
        self.sdk
            .freeze_video(camera, Wait::DontWait)
            .map_err(|status| {
                sdk_error(&self.logger, "Couldn't stop capture", "is_FreezeVideo", status)
            })?;
        self.state = DeviceState::Stopped;
        Ok(())
    }

    /// Capture a single frame, waiting for it to arrive.
    pub fn grab_frame(&mut self) -> Result<Frame> {
        let camera = self.camera()?;
        if !self.session.as_ref().is_some_and(|session| session.prepared) {
            return Err(CameraError::NoImageMemory);
        }

        self.sdk.freeze_video(camera, Wait::Wait).map_err(|status| {
            sdk_error(&self.logger, "Couldn't capture frame", "is_FreezeVideo", status)
        })?;
        if self.state == DeviceState::Capturing {
            self.state = DeviceState::Stopped;
        }

        let session = self.session.as_ref().ok_or(CameraError::NotOpen)?;
        Ok(Frame {
            width: session.width,
            height: session.height,
            data: session.pixels.clone(),
        })
    }

    /// Switch off auto exposure, then set a manual exposure time.
    pub fn set_exposure(&mut self, exposure: Duration) -> Result<ManualControlOutcome> {
        let camera = self.camera()?;
        self.warn_if_capturing("exposure");

        let disable_auto = self
            .sdk
            .set_auto_parameter(camera, AutoParameter::Shutter, 0.0)
            .map_err(|status| {
                sdk_error(
                    &self.logger,
                    "Couldn't stop auto exposure",
                    "is_SetAutoParameter",
                    status,
                )
            });

        #[allow(clippy::cast_precision_loss)]
        let millis = exposure.as_micros() as f64 / 1000.0;
        let apply = self
            .sdk
            .set_exposure(camera, millis)
            .map(|_| ())
            .map_err(|status| {
                sdk_error(&self.logger, "Couldn't set exposure", "is_Exposure", status)
            });

        Ok(ManualControlOutcome {
            disable_auto,
            apply,
        })
    }

    /// Switch off auto gain, then set the master gain. `gain` runs 0.0 to 1.0.
    pub fn set_gain(&mut self, gain: f32) -> Result<ManualControlOutcome> {
        let camera = self.camera()?;
        self.warn_if_capturing("gain");

        let disable_auto = self
            .sdk
            .set_auto_parameter(camera, AutoParameter::Gain, 0.0)
            .map_err(|status| {
                sdk_error(&self.logger, "Couldn't stop auto gain", "is_SetAutoParameter", status)
            });

        #[allow(clippy::cast_possible_truncation)]
        let factor = (f64::from(gain) * 100.0) as i32;
        let apply = self
            .sdk
            .set_master_gain_factor(camera, factor)
            .map(|_| ())
            .map_err(|status| {
                sdk_error(&self.logger, "Couldn't set gain", "is_SetHWGainFactor", status)
            });

        Ok(ManualControlOutcome {
            disable_auto,
            apply,
        })
    }

    /// Set horizontal and vertical binning.
    ///
    /// Fails without touching the camera if either factor is outside `1..=16`.
    /// `1x1` disables binning. Otherwise each axis is resolved on its own; an
    /// axis with no matching mode (factor 1 included) is reported in the
    /// outcome and the other axis is still applied.
    pub fn set_binning(&mut self, x: u32, y: u32) -> Result<BinningOutcome> {
        let camera = self.camera()?;

        let mut out_of_range: Vec<CameraError> = [
            binning::check_range(Axis::Horizontal, x),
            binning::check_range(Axis::Vertical, y),
        ]
        .into_iter()
        .filter_map(|range| range.err())
        .inspect(|err| self.logger.error(&err.to_string()))
        .collect();
        if !out_of_range.is_empty() {
            return Err(out_of_range.swap_remove(0));
        }

        self.warn_if_capturing("binning");

        if x == 1 && y == 1 {
            let sent = self
                .sdk
                .set_binning(camera, BinningMode::DISABLE)
                .map_err(|status| {
                    sdk_error(&self.logger, "Failed to set binning", "is_SetBinning", status)
                });
            return Ok(BinningOutcome {
                horizontal: sent.clone(),
                vertical: sent,
            });
        }

        let horizontal = binning::resolve(Axis::Horizontal, x);
        let vertical = binning::resolve(Axis::Vertical, y);
        for err in [&horizontal, &vertical]
            .into_iter()
            .filter_map(|axis| axis.as_ref().err())
        {
            self.logger.error(&err.to_string());
        }

        if horizontal.is_err() && vertical.is_err() {
            return Ok(BinningOutcome {
                horizontal: horizontal.map(|_| ()),
                vertical: vertical.map(|_| ()),
            });
        }

        let mode = horizontal.as_ref().copied().unwrap_or_default()
            | vertical.as_ref().copied().unwrap_or_default();
        let sent = self.sdk.set_binning(camera, mode).map_err(|status| {
            sdk_error(&self.logger, "Failed to set binning", "is_SetBinning", status)
        });

        let applied = |axis: Result<BinningMode>| axis.and_then(|_| sent.clone());
        Ok(BinningOutcome {
            horizontal: applied(horizontal),
            vertical: applied(vertical),
        })
    }

    /// Set the sensor area of interest. Coordinates are truncated to whole pixels.
    pub fn set_roi(&mut self, roi: Roi) -> Result<()> {
        let camera = self.camera()?;
        self.warn_if_capturing("ROI");

        self.sdk.set_aoi(camera, roi.to_aoi()).map_err(|status| {
            sdk_error(&self.logger, "Couldn't set ROI", "is_AOI", status)
        })
    }

    /// Set the sensor pixel clock in MHz.
    pub fn set_pixel_clock(&mut self, mhz: u32) -> Result<()> {
        let camera = self.camera()?;
        self.warn_if_capturing("pixel clock");

        self.sdk.set_pixel_clock(camera, mhz).map_err(|status| {
            sdk_error(&self.logger, "Couldn't set pixel clock", "is_PixelClock", status)
        })
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> DeviceState {
        self.state
    }

    /// Specification returned by the last successful [`Device::open`].
    pub const fn specification(&self) -> Option<&Specification> {
        self.specification.as_ref()
    }

    /// Timing chosen when the capture buffer was prepared.
    pub fn timing(&self) -> Option<CameraTiming> {
        self.session.as_ref().and_then(|session| session.timing)
    }

    /// The bound pixel buffer, one byte per pixel.
    ///
    /// `None` while capturing: the driver writes into the buffer from its own
    /// thread until capture is stopped.
    pub fn pixels(&self) -> Option<&[u8]> {
        if self.state == DeviceState::Capturing {
            return None;
        }
        self.session
            .as_ref()
            .filter(|session| session.prepared)
            .map(|session| session.pixels.as_slice())
    }

    /// Active configuration.
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The underlying SDK.
    pub const fn sdk(&self) -> &S {
        &self.sdk
    }

    fn camera(&self) -> Result<CameraHandle> {
        self.session
            .as_ref()
            .map(|session| session.camera)
            .ok_or(CameraError::NotOpen)
    }

    fn warn_if_capturing(&self, what: &str) {
        if self.state == DeviceState::Capturing {
            self.logger
                .warn(&format!("Changing {what} while capturing"));
        }
    }

    fn release(&mut self, mut session: Session) -> Result<()> {
        let freed = match session.memory.take() {
            Some(memory) => self
                .sdk
                .free_image_mem(session.camera, &mut session.pixels, memory)
                .map_err(|status| {
                    sdk_error(
                        &self.logger,
                        "Couldn't free image memory",
                        "is_FreeImageMem",
                        status,
                    )
                }),
            None => Ok(()),
        };

        let exited = self.sdk.exit_camera(session.camera).map_err(|status| {
            sdk_error(&self.logger, "Couldn't exit camera", "is_ExitCamera", status)
        });

        freed.and(exited)
    }
}

impl<S: UeyeSdk, L: Logger> Drop for Device<S, L> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = self.release(session);
        }
    }
}

fn sdk_error<L: Logger>(
    logger: &L,
    msg: &str,
    operation: &'static str,
    status: Status,
) -> CameraError {
    logger.error(&format!("{msg} ({status})"));
    CameraError::sdk(operation, status)
}
