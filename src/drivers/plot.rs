use std::io::Cursor;
use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::drivers::buffer::Dataset;
use crate::drivers::error::DaqError;
use crate::drivers::pipeline::with_suffix;
use crate::types::{CHANNEL_COLUMNS, FILTERED_SUFFIX, TIME_COLUMN};
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Top of the voltage axis; the bottom is always 0 V.
    pub full_scale_voltage: f64,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 500,
            background: RGBColor(10, 10, 10),
            palette: vec![BLUE, RED, GREEN, YELLOW],
            full_scale_voltage: 5.0,
        }
    }
}
/// Raw channels faint, their `_filtered` counterparts solid, over elapsed time.
pub fn render_dataset_png(dataset: &Dataset, style: PlotStyle) -> Result<Vec<u8>, DaqError> {
    let times = dataset
        .column(TIME_COLUMN)
        .ok_or_else(|| DaqError::MissingColumn(TIME_COLUMN.to_string()))?;
    if times.is_empty() {
        return Err(DaqError::EmptyDataset);
    }
    let t_min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let t_max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let x_range = if t_max - t_min < f64::EPSILON {
        t_min - 1.0..t_max + 1.0
    } else {
        t_min..t_max
    };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Raw vs filtered", ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_range, 0f64..style.full_scale_voltage)?;
        chart
            .configure_mesh()
            .x_desc("Time (ms)")
            .y_desc("Voltage (V)")
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        for (idx, channel) in CHANNEL_COLUMNS.iter().enumerate() {
            let color = style.palette[idx % style.palette.len()];
            if let Some(raw) = dataset.column(channel) {
                let series = times.iter().copied().zip(raw.iter().copied());
                chart.draw_series(LineSeries::new(series, color.mix(0.3)))?;
            }
            let filtered_name = format!("{channel}{FILTERED_SUFFIX}");
            if let Some(filtered) = dataset.column(&filtered_name) {
                let series = times.iter().copied().zip(filtered.iter().copied());
                chart
                    .draw_series(LineSeries::new(series, color.stroke_width(2)))?
                    .label(filtered_name)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
        }
        chart
            .configure_series_labels()
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// `data_filtered.csv` -> `data_filtered_plot.png`, next to the file it was drawn from.
pub fn plot_path(filtered: &Path) -> PathBuf {
    with_suffix(filtered, "_plot").with_extension("png")
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DaqError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| DaqError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
