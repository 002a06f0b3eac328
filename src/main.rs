//! ueye-capture binary for checking a camera from the command line.

use std::time::Duration;

use clap::Parser;
use ueye_capture::{Device, Roi, UeyeDriver};

/// Open a uEye camera, print what it reports and grab one frame.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Framework device id (the configured offset is added before addressing the camera).
    #[arg(default_value_t = 0)]
    device_id: u32,

    /// Exposure time in microseconds.
    #[arg(long)]
    exposure: Option<u64>,

    /// Gain from 0.0 to 1.0.
    #[arg(long)]
    gain: Option<f32>,

    /// Binning as two factors, e.g. `--binning 2 2`.
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    binning: Option<Vec<u32>>,

    /// Region of interest as x y width height.
    #[arg(long, num_args = 4, value_names = ["X", "Y", "W", "H"])]
    roi: Option<Vec<f32>>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run(&Args::parse()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> ueye_capture::traits::Result<()> {
    let mut device = Device::new(UeyeDriver::new());
    let spec = device.open(args.device_id)?;

    println!("Camera: {} {}", spec.manufacturer, spec.model);
    println!("Serial: {}", spec.serial);
    println!("Sensor: {}x{}", spec.sensor_width, spec.sensor_height);
    println!("Features: {:?}", spec.features());
    if let Some(timing) = device.timing() {
        println!(
            "Timing: {} MHz, {:.1} fps",
            timing.max_pixel_clock, timing.frame_rate
        );
    }

    if let Some(micros) = args.exposure {
        device
            .set_exposure(Duration::from_micros(micros))?
            .into_result()?;
    }
    if let Some(gain) = args.gain {
        device.set_gain(gain)?.into_result()?;
    }
    if let Some([x, y]) = args.binning.as_deref() {
        device.set_binning(*x, *y)?.into_result()?;
    }
    if let Some([x, y, width, height]) = args.roi.as_deref() {
        device.set_roi(Roi::new(*x, *y, *width, *height))?;
    }

    let frame = device.grab_frame()?;
    #[allow(clippy::cast_precision_loss)]
    let mean = frame.data.iter().map(|&p| u64::from(p)).sum::<u64>() as f64
        / frame.data.len().max(1) as f64;
    println!(
        "Frame: {}x{}, {} bytes, mean level {mean:.1}",
        frame.width,
        frame.height,
        frame.data.len()
    );

    device.close()
}
