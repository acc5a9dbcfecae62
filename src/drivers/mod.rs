// src/drivers/mod.rs
// 设备侧接口 + 主机侧信号链
pub mod buffer;
pub mod error;
pub mod estimator;
pub mod fft;
pub mod pipeline;
pub mod plot;
pub mod source;
pub mod transport;
// 公开导出常用类型，方便外部调用
pub use buffer::Dataset;
pub use error::DaqError;
pub use pipeline::{FilterPipeline, PipelineOutcome};
pub use fft::ResponseAnalyzer;
pub use plot::{plot_path, render_dataset_png, PlotStyle};
pub use source::{SimulatedAdc, SystemClock};
pub use transport::{available_ports, ChannelTransport, LineTransport, SerialTransport};
