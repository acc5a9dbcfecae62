use thiserror::Error;
use crate::lowpass::FilterError;
#[derive(Debug, Error)]
pub enum DaqError {
    #[error("need at least 2 timestamps to estimate a sampling rate, found {found}")]
    InsufficientData { found: usize },
    #[error("median sample spacing is {median_ms} ms; cannot derive a sampling rate")]
    DegenerateSampling { median_ms: f64 },
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("dataset has no column named {0:?}")]
    MissingColumn(String),
    #[error("dataset has no rows left after cleaning")]
    EmptyDataset,
    #[error("column {name:?} has {actual} values, dataset has {expected} rows")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("transport peer disconnected")]
    Disconnected,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for DaqError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        DaqError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for DaqError {
    fn from(value: image::ImageError) -> Self {
        DaqError::Plot(value.to_string())
    }
}
