// src/main.rs
mod config;
mod drivers;
mod engine;
mod lowpass;
mod recorder;
mod types;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use crate::config::DaqConfig;
use crate::drivers::{
    available_ports, plot_path, render_dataset_png, ChannelTransport, Dataset, FilterPipeline,
    LineTransport, PipelineOutcome, PlotStyle, ResponseAnalyzer, SerialTransport, SimulatedAdc,
    SystemClock,
};
use crate::engine::{spawn_device, SamplingController};
use crate::lowpass::LowPassFilter;
use crate::recorder::{clean_capture_file, default_capture_path, CaptureSession};
#[derive(Parser, Debug)]
#[command(author, version, about = "Four-channel DAQ capture and low-pass post-processing", long_about = None)]
struct Cli {
    /// JSON file overriding device, filter and host defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Cmd,
}
#[derive(Subcommand, Debug)]
enum Cmd {
    /// List serial ports
    Ports,
    /// Record one session from a device on a serial port, then clean, filter and plot it
    Record {
        #[arg(long)]
        port: String,
        /// Directory for the capture files
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Only capture and clean
        #[arg(long)]
        raw_only: bool,
    },
    /// Run the device engine against a simulated converter and capture it in-process
    Simulate {
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Seed for the simulated noise
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Frequency of the simulated signal in Hz
        #[arg(long, default_value_t = 1.0)]
        signal_hz: f32,
    },
    /// Low-pass filter a captured CSV file into <stem>_filtered<ext>
    Filter {
        file: PathBuf,
        /// Also render <stem>_filtered_plot.png
        #[arg(long)]
        plot: bool,
    },
    /// Strip protocol noise from a raw capture into <stem>_clean<ext>
    Clean { file: PathBuf },
    /// Print the frequency response of the configured filter
    Response {
        /// Sampling rate to design for; defaults to the device sample interval
        #[arg(long)]
        sample_rate: Option<f64>,
    },
}
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = DaqConfig::load(cli.config.as_deref())?;
    match cli.command {
        Cmd::Ports => {
            let ports = available_ports()?;
            if ports.is_empty() {
                println!("No serial ports found.");
            }
            for (i, port) in ports.iter().enumerate() {
                println!("{i}: {port}");
            }
        }
        Cmd::Record {
            port,
            out,
            raw_only,
        } => {
            let transport =
                SerialTransport::open(&port, config.device.baud_rate, Duration::from_millis(100))
                    .with_context(|| format!("opening {port}"))?;
            info!("connected to {port}");
            let path = record(transport, &config, &out)?;
            let clean = clean_capture_file(&path)?;
            if !raw_only {
                filter_and_plot(&clean.path, &config)?;
            }
        }
        Cmd::Simulate {
            out,
            seed,
            signal_hz,
        } => {
            let (device_end, host_end) = ChannelTransport::pair();
            let adc = SimulatedAdc::new(
                seed,
                config.device.max_raw_value,
                signal_hz,
                config.device.sample_interval_ms,
            );
            let controller =
                SamplingController::new(config.device, adc, SystemClock::new(), device_end);
            let device = spawn_device(
                controller,
                Duration::from_millis(config.host.poll_interval_ms),
            );
            let path = record(host_end, &config, &out)?;
            match device.join() {
                Ok(result) => result.context("simulated device")?,
                Err(_) => warn!("simulated device thread panicked"),
            }
            filter_and_plot(&path, &config)?;
        }
        Cmd::Filter { file, plot } => {
            if plot {
                filter_and_plot(&file, &config)?;
            } else {
                let outcome = FilterPipeline::new(config.filter).run(&file)?;
                print_outcome(&outcome);
            }
        }
        Cmd::Clean { file } => {
            let report = clean_capture_file(&file)?;
            println!(
                "{}: {} rows kept, {} lines dropped{}",
                report.path.display(),
                report.rows_kept,
                report.lines_dropped,
                if report.header_found { "" } else { ", header inserted" }
            );
        }
        Cmd::Response { sample_rate } => {
            let fs = sample_rate
                .unwrap_or(1000.0 / f64::from(config.device.sample_interval_ms.max(1)));
            let filter = LowPassFilter::butterworth(config.filter.order, config.filter.cutoff_hz, fs)?;
            let response = ResponseAnalyzer::default().compute(&filter);
            println!(
                "order {} Butterworth ({} sections), cutoff {} Hz at {:.1} Hz sampling",
                response.order,
                filter.section_count(),
                response.cutoff_hz,
                response.sample_rate_hz
            );
            if let Some(summary) = response.summary() {
                println!("{summary}");
            }
        }
    }
    Ok(())
}
/// Waits for the banner and captures one session. The transport is closed on return.
fn record<T: LineTransport>(transport: T, config: &DaqConfig, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut session = CaptureSession::new(transport, config.host);
    if !session.wait_for_ready()? {
        warn!("device did not send its ready banner, starting anyway");
    }
    let path = default_capture_path(dir);
    let report = session.capture(&path)?;
    println!(
        "Saved {} rows ({} lines) to {}",
        report.rows_received,
        report.lines_written,
        report.path.display()
    );
    Ok(path)
}
fn filter_and_plot(input: &Path, config: &DaqConfig) -> Result<()> {
    let outcome = FilterPipeline::new(config.filter).run(input)?;
    let (dataset, _) = Dataset::load(&outcome.output_path)?;
    let style = PlotStyle {
        full_scale_voltage: f64::from(config.device.full_scale_voltage),
        ..PlotStyle::default()
    };
    let png = render_dataset_png(&dataset, style)?;
    let plot = plot_path(&outcome.output_path);
    fs::write(&plot, png).with_context(|| format!("writing {}", plot.display()))?;
    print_outcome(&outcome);
    println!("{}", plot.display());
    Ok(())
}
fn print_outcome(outcome: &PipelineOutcome) {
    println!(
        "{}: {} rows ({} dropped) at {:.1} Hz, filtered {}",
        outcome.output_path.display(),
        outcome.load.rows_kept,
        outcome.load.rows_dropped,
        outcome.rate.sample_rate_hz,
        outcome.filtered_channels.join(", ")
    );
}
