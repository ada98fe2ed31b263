//! Core types, configuration, and error handling for the KA-CHOW graph engine.
//!
//! This crate provides the shared foundation used by all other kachow crates:
//! - [`KachowError`]: unified error type using `thiserror`
//! - [`KachowConfig`]: configuration loaded from `.kachow.toml`
//! - Quality metric records: [`MetricsRecord`], [`ProjectMetrics`], [`QualityGate`]
//! - The [`MetricsSource`] seam implemented by metrics providers
//! - [`OutputFormat`] for CLI rendering

mod config;
mod error;
mod metrics;
mod types;

pub use config::{
    HistoryConfig, KachowConfig, MetricsConfig, MetricsProvider, ScanConfig,
    DEFAULT_EXCLUDED_DIRS, DEFAULT_EXTENSIONS,
};
pub use error::KachowError;
pub use metrics::{MetricsSource, NoMetrics};
pub use types::{MetricsRecord, OutputFormat, ProjectMetrics, QualityGate};

/// A convenience `Result` type for kachow operations.
pub type Result<T> = std::result::Result<T, KachowError>;
