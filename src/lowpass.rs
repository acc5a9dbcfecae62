// Adapter module to surface the filter library kept under `lowpass-rs/`.
// The sources are compiled in directly so the crate and the library stay in sync.
#[path = "lowpass-rs/src/lib.rs"]
mod lowpass_rs;

pub use lowpass_rs::*;
