//! Simulated uEye driver for testing without hardware.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use crate::binning::BinningMode;
use crate::logging::Logger;
use crate::traits::{
    AoiRect, AutoParameter, BoardInfo, CameraHandle, CameraTiming, ColorMode, InitRequest,
    MemoryId, SdkResult, SensorInfo, Status, UeyeSdk, Wait,
};

/// One recorded SDK call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitCamera(InitRequest),
    ExitCamera(CameraHandle),
    FirmwareUploadDuration(InitRequest),
    CameraInfo,
    SensorInfo,
    SetAllocatedImageMem { width: u32, height: u32, bits: u32, len: usize },
    SetImageMem(MemoryId),
    FreeImageMem(MemoryId),
    SetColorMode(ColorMode),
    SetOptimalCameraTiming(Duration),
    CaptureVideo(Wait),
    FreezeVideo(Wait),
    SetAutoParameter(AutoParameter, f64),
    SetExposure(f64),
    SetMasterGainFactor(i32),
    SetBinning(BinningMode),
    SetAoi(AoiRect),
    SetPixelClock(u32),
}

/// Call names used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ExitCamera,
    FirmwareUploadDuration,
    CameraInfo,
    SensorInfo,
    SetAllocatedImageMem,
    SetImageMem,
    FreeImageMem,
    SetColorMode,
    SetOptimalCameraTiming,
    CaptureVideo,
    FreezeVideo,
    SetAutoParameter,
    SetExposure,
    SetMasterGainFactor,
    SetBinning,
    SetAoi,
    SetPixelClock,
}

/// Shared view of the calls a [`MockSdk`] received.
pub type Journal = Rc<RefCell<Vec<Call>>>;

/// Mock SDK that records every call and can be told to fail any of them.
pub struct MockSdk {
    board: BoardInfo,
    sensor: SensorInfo,
    timing: CameraTiming,
    init_results: VecDeque<SdkResult<()>>,
    upload_duration: Duration,
    /// Status to fail with, and how many more times (`None` for always).
    failures: HashMap<CallKind, (Status, Option<u32>)>,
    fill: u8,
    next_memory: i32,
    journal: Journal,
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSdk {
    /// Create a mock with a 64x48 sensor that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: BoardInfo {
                serial_number: "4102781234".to_owned(),
                id: "UI-1240LE-M".to_owned(),
                version: "V1.0".to_owned(),
                date: "01.01.2020".to_owned(),
            },
            sensor: SensorInfo {
                sensor_id: 0x55,
                name: "UI124xLE-M".to_owned(),
                max_width: 64,
                max_height: 48,
            },
            timing: CameraTiming {
                max_pixel_clock: 86,
                frame_rate: 25.8,
            },
            init_results: VecDeque::new(),
            upload_duration: Duration::from_secs(12),
            failures: HashMap::new(),
            fill: 0,
            next_memory: 1,
            journal: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Set the reported sensor size.
    #[must_use]
    pub fn with_sensor_size(mut self, width: u32, height: u32) -> Self {
        self.sensor.max_width = width;
        self.sensor.max_height = height;
        self
    }

    /// Queue results for successive `init_camera` calls. Once drained, init succeeds.
    #[must_use]
    pub fn with_init_results<I: IntoIterator<Item = SdkResult<()>>>(mut self, results: I) -> Self {
        self.init_results.extend(results);
        self
    }

    /// Make every call of `kind` fail with `status`.
    #[must_use]
    pub fn failing(mut self, kind: CallKind, status: Status) -> Self {
        self.failures.insert(kind, (status, None));
        self
    }

    /// Make the next call of `kind` fail with `status`; later calls succeed.
    #[must_use]
    pub fn failing_once(mut self, kind: CallKind, status: Status) -> Self {
        self.failures.insert(kind, (status, Some(1)));
        self
    }

    /// Value written into image memory when it is registered.
    #[must_use]
    pub fn with_fill(mut self, value: u8) -> Self {
        self.fill = value;
        self
    }

    /// Handle onto the recorded calls, usable after the mock is dropped.
    #[must_use]
    pub fn journal(&self) -> Journal {
        Rc::clone(&self.journal)
    }

    /// Snapshot of the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.journal.borrow().clone()
    }

    fn record(&mut self, call: Call, kind: Option<CallKind>) -> SdkResult<()> {
        self.journal.borrow_mut().push(call);
        let Some(kind) = kind else {
            return Ok(());
        };
        let Some(&(status, remaining)) = self.failures.get(&kind) else {
            return Ok(());
        };
        match remaining {
            Some(0 | 1) => {
                self.failures.remove(&kind);
            }
            Some(n) => {
                self.failures.insert(kind, (status, Some(n - 1)));
            }
            None => {}
        }
        Err(status)
    }
}

impl UeyeSdk for MockSdk {
    fn init_camera(&mut self, request: InitRequest) -> SdkResult<CameraHandle> {
        self.record(Call::InitCamera(request), None)?;
        self.init_results.pop_front().unwrap_or(Ok(()))?;
        Ok(CameraHandle(
            request.0 & !(InitRequest::USE_DEVICE_ID | InitRequest::ALLOW_STARTER_FW_UPLOAD),
        ))
    }

    fn exit_camera(&mut self, camera: CameraHandle) -> SdkResult<()> {
        self.record(Call::ExitCamera(camera), Some(CallKind::ExitCamera))
    }

    fn firmware_upload_duration(&mut self, request: InitRequest) -> SdkResult<Duration> {
        self.record(
            Call::FirmwareUploadDuration(request),
            Some(CallKind::FirmwareUploadDuration),
        )?;
        Ok(self.upload_duration)
    }

    fn camera_info(&mut self, _camera: CameraHandle) -> SdkResult<BoardInfo> {
        self.record(Call::CameraInfo, Some(CallKind::CameraInfo))?;
        Ok(self.board.clone())
    }

    fn sensor_info(&mut self, _camera: CameraHandle) -> SdkResult<SensorInfo> {
        self.record(Call::SensorInfo, Some(CallKind::SensorInfo))?;
        Ok(self.sensor.clone())
    }

    fn set_allocated_image_mem(
        &mut self,
        _camera: CameraHandle,
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        buffer: &mut [u8],
    ) -> SdkResult<MemoryId> {
        self.record(
            Call::SetAllocatedImageMem {
                width,
                height,
                bits: bits_per_pixel,
                len: buffer.len(),
            },
            Some(CallKind::SetAllocatedImageMem),
        )?;
        buffer.fill(self.fill);
        let memory = MemoryId(self.next_memory);
        self.next_memory += 1;
        Ok(memory)
    }

    fn set_image_mem(
        &mut self,
        _camera: CameraHandle,
        _buffer: &mut [u8],
        memory: MemoryId,
    ) -> SdkResult<()> {
        self.record(Call::SetImageMem(memory), Some(CallKind::SetImageMem))
    }

    fn free_image_mem(
        &mut self,
        _camera: CameraHandle,
        _buffer: &mut [u8],
        memory: MemoryId,
    ) -> SdkResult<()> {
        self.record(Call::FreeImageMem(memory), Some(CallKind::FreeImageMem))
    }

    fn set_color_mode(&mut self, _camera: CameraHandle, mode: ColorMode) -> SdkResult<()> {
        self.record(Call::SetColorMode(mode), Some(CallKind::SetColorMode))
    }

    fn set_optimal_camera_timing(
        &mut self,
        _camera: CameraHandle,
        timeout: Duration,
    ) -> SdkResult<CameraTiming> {
        self.record(
            Call::SetOptimalCameraTiming(timeout),
            Some(CallKind::SetOptimalCameraTiming),
        )?;
        Ok(self.timing)
    }

    fn capture_video(&mut self, _camera: CameraHandle, wait: Wait) -> SdkResult<()> {
        self.record(Call::CaptureVideo(wait), Some(CallKind::CaptureVideo))
    }

    fn freeze_video(&mut self, _camera: CameraHandle, wait: Wait) -> SdkResult<()> {
        self.record(Call::FreezeVideo(wait), Some(CallKind::FreezeVideo))
    }

    fn set_auto_parameter(
        &mut self,
        _camera: CameraHandle,
        parameter: AutoParameter,
        value: f64,
    ) -> SdkResult<()> {
        self.record(
            Call::SetAutoParameter(parameter, value),
            Some(CallKind::SetAutoParameter),
        )
    }

    fn set_exposure(&mut self, _camera: CameraHandle, millis: f64) -> SdkResult<f64> {
        self.record(Call::SetExposure(millis), Some(CallKind::SetExposure))?;
        Ok(millis)
    }

    fn set_master_gain_factor(&mut self, _camera: CameraHandle, factor: i32) -> SdkResult<i32> {
        self.record(
            Call::SetMasterGainFactor(factor),
            Some(CallKind::SetMasterGainFactor),
        )?;
        Ok(factor)
    }

    fn set_binning(&mut self, _camera: CameraHandle, mode: BinningMode) -> SdkResult<()> {
        self.record(Call::SetBinning(mode), Some(CallKind::SetBinning))
    }

    fn set_aoi(&mut self, _camera: CameraHandle, rect: AoiRect) -> SdkResult<()> {
        self.record(Call::SetAoi(rect), Some(CallKind::SetAoi))
    }

    fn set_pixel_clock(&mut self, _camera: CameraHandle, mhz: u32) -> SdkResult<()> {
        self.record(Call::SetPixelClock(mhz), Some(CallKind::SetPixelClock))
    }
}

/// Severity of a recorded log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warn,
    Error,
}

/// Logger that keeps every message for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    lines: Rc<RefCell<Vec<(Level, String)>>>,
}

impl RecordingLogger {
    /// Create an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded lines.
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    /// Messages recorded at `level`.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn warn(&self, msg: &str) {
        self.lines.borrow_mut().push((Level::Warn, msg.to_owned()));
    }

    fn error(&self, msg: &str) {
        self.lines.borrow_mut().push((Level::Error, msg.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_calls() {
        let mut sdk = MockSdk::new();
        let camera = sdk
            .init_camera(InitRequest::by_device_id(1001))
            .expect("init should succeed");
        assert_eq!(camera, CameraHandle(1001));

        sdk.set_aoi(camera, AoiRect { x: 0, y: 0, width: 8, height: 8 })
            .expect("set_aoi should succeed");

        assert_eq!(sdk.calls().len(), 2);
    }

    #[test]
    fn test_mock_scripted_init() {
        let mut sdk =
            MockSdk::new().with_init_results([Err(Status::STARTER_FW_UPLOAD_NEEDED), Ok(())]);
        let request = InitRequest::by_device_id(1001);

        assert_eq!(
            sdk.init_camera(request),
            Err(Status::STARTER_FW_UPLOAD_NEEDED)
        );
        assert!(sdk.init_camera(request).is_ok());
        assert!(sdk.init_camera(request).is_ok());
    }

    #[test]
    fn test_mock_failure_still_records() {
        let mut sdk = MockSdk::new().failing(CallKind::SetBinning, Status::NO_SUCCESS);
        let result = sdk.set_binning(CameraHandle(1), BinningMode::DISABLE);

        assert_eq!(result, Err(Status::NO_SUCCESS));
        assert_eq!(sdk.calls(), vec![Call::SetBinning(BinningMode::DISABLE)]);
    }

    #[test]
    fn test_mock_fails_once() {
        let mut sdk = MockSdk::new().failing_once(CallKind::SetColorMode, Status::NOT_SUPPORTED);
        let camera = CameraHandle(1);

        assert_eq!(
            sdk.set_color_mode(camera, ColorMode::Mono8),
            Err(Status::NOT_SUPPORTED)
        );
        assert!(sdk.set_color_mode(camera, ColorMode::Mono8).is_ok());
        assert_eq!(sdk.calls().len(), 2);
    }

    #[test]
    fn test_mock_firmware_duration_can_fail() {
        let mut sdk =
            MockSdk::new().failing(CallKind::FirmwareUploadDuration, Status::NO_SUCCESS);
        let request = InitRequest::by_device_id(1001);

        assert_eq!(
            sdk.firmware_upload_duration(request),
            Err(Status::NO_SUCCESS)
        );
        assert_eq!(sdk.calls(), vec![Call::FirmwareUploadDuration(request)]);
    }

    #[test]
    fn test_mock_fills_registered_memory() {
        let mut sdk = MockSdk::new().with_fill(0x7f);
        let mut buffer = vec![0u8; 16];
        let memory = sdk
            .set_allocated_image_mem(CameraHandle(1), 4, 4, 8, &mut buffer)
            .expect("set_allocated_image_mem should succeed");

        assert_eq!(memory, MemoryId(1));
        assert!(buffer.iter().all(|&b| b == 0x7f));
    }

    #[test]
    fn test_recording_logger() {
        let logger = RecordingLogger::new();
        logger.warn("slow");
        logger.error("broken");

        assert_eq!(logger.messages(Level::Warn), vec!["slow".to_owned()]);
        assert_eq!(logger.messages(Level::Error), vec!["broken".to_owned()]);
        assert_eq!(logger.lines().len(), 2);
    }
}
