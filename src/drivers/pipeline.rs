use std::ffi::OsString;
use std::path::{Path, PathBuf};
use log::{debug, info};
use crate::config::FilterConfig;
use crate::drivers::buffer::{Dataset, LoadReport};
use crate::drivers::error::DaqError;
use crate::drivers::estimator::{estimate_sampling_rate, RateEstimate};
use crate::lowpass::LowPassFilter;
use crate::types::{CHANNEL_COLUMNS, FILTERED_SUFFIX, TIME_COLUMN};
/// Summary of one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    pub output_path: PathBuf,
    pub load: LoadReport,
    pub rate: RateEstimate,
    /// Channel columns that received a filtered counterpart, in order.
    pub filtered_channels: Vec<String>,
}
/// Load -> clean -> estimate rate -> low-pass each channel -> write `<stem>_filtered<ext>`.
///
/// Each run is independent: the rate is recomputed from the data every time.
pub struct FilterPipeline {
    config: FilterConfig,
}
impl FilterPipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }
    pub fn run(&self, input: &Path) -> Result<PipelineOutcome, DaqError> {
        let (mut dataset, load) = Dataset::load(input)?;
        if load.headerless {
            info!("{} has no header line, using the default column names", input.display());
        }
        info!(
            "loaded {} rows from {} ({} dropped)",
            load.rows_kept,
            input.display(),
            load.rows_dropped
        );
        let (rate, filtered_channels) = self.process(&mut dataset)?;
        let output_path = filtered_path(input);
        dataset.save(&output_path)?;
        info!("filtered data saved to {}", output_path.display());
        Ok(PipelineOutcome {
            output_path,
            load,
            rate,
            filtered_channels,
        })
    }
    /// Adds the `_filtered` columns in place. On error the dataset is left untouched.
    pub fn process(&self, dataset: &mut Dataset) -> Result<(RateEstimate, Vec<String>), DaqError> {
        let times = dataset
            .column(TIME_COLUMN)
            .ok_or_else(|| DaqError::MissingColumn(TIME_COLUMN.to_string()))?;
        let rate = estimate_sampling_rate(times)?;
        info!(
            "estimated sampling rate {:.1} Hz (median spacing {} ms)",
            rate.sample_rate_hz, rate.median_interval_ms
        );
        let filter = LowPassFilter::butterworth(
            self.config.order,
            self.config.cutoff_hz,
            rate.sample_rate_hz,
        )?;
        debug!(
            "low-pass designed with {} section(s), dc gain {:.6}",
            filter.section_count(),
            filter.dc_gain()
        );
        let mut derived = Vec::new();
        for channel in CHANNEL_COLUMNS {
            let Some(values) = dataset.column(channel) else {
                debug!("channel {channel} not present, skipping");
                continue;
            };
            derived.push((channel.to_string(), filter.apply_zero_phase(values)));
        }
        let mut filtered_channels = Vec::with_capacity(derived.len());
        for (channel, values) in derived {
            dataset.add_column(format!("{channel}{FILTERED_SUFFIX}"), values)?;
            filtered_channels.push(channel);
        }
        Ok((rate, filtered_channels))
    }
}
/// `data.csv` -> `data_filtered.csv`; a name without extension just gets the suffix.
pub fn filtered_path(input: &Path) -> PathBuf {
    with_suffix(input, FILTERED_SUFFIX)
}
/// Inserts `suffix` between the file stem and its extension.
pub fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = input.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}
