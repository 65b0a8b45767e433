//! haarindex: in-memory Haar wavelet image similarity index.

pub mod config;
pub mod error;
pub mod index;
pub mod metrics;
pub mod signature;
pub mod storage;
pub mod telemetry;
pub mod types;
