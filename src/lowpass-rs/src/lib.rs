pub mod config;
pub mod error;
pub mod filter;
pub use error::FilterError;
pub use filter::LowPassFilter;
