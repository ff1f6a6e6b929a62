//! Error types for report loading, extraction, plotting and manifests.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading or classifying a benchmark report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid benchmark report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("benchmark '{name}' is missing field '{field}'")]
    MissingField { name: String, field: &'static str },

    #[error("benchmark '{name}': unsupported complexity '{big_o}' (expected N^k, N or (1))")]
    UnsupportedComplexity { name: String, big_o: String },

    #[error("benchmark '{name}': unknown time unit '{unit}'")]
    UnknownTimeUnit { name: String, unit: String },
}

/// Failure while building a series for one key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no BigO record matches key '{key}'")]
    MissingAggregate { key: String },

    #[error("{count} BigO records match key '{key}'; use a more specific key")]
    AmbiguousAggregate { key: String, count: usize },

    #[error("no sized samples match key '{key}'")]
    NoSamples { key: String },

    #[error("key '{key}' has more than one sample for N = {n}")]
    DuplicateSize { key: String, n: u64 },

    #[error("key '{key}' matches '{name}', whose size suffix '{suffix}' is not an integer")]
    MalformedName {
        key: String,
        name: String,
        suffix: String,
    },
}

/// Failure while validating or rendering a chart
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("nothing to plot: no series given")]
    NoSeries,

    #[error("slope overlay needs a common big-O exponent, got {exponents:?}")]
    MixedComplexity { exponents: Vec<u32> },

    #[error("slope lists differ in length: {series} series, {factors} factors, {ranges} ranges")]
    SlopeLengthMismatch {
        series: usize,
        factors: usize,
        ranges: usize,
    },

    #[error("slope {entry} references series {index}, but only {len} were given")]
    SlopeSeriesOutOfRange { entry: usize, index: usize, len: usize },

    #[error("slope {entry} range {start}..{end} selects no points of a {len}-point series")]
    SlopeRangeOutOfBounds {
        entry: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("log base must be greater than 1, got {0}")]
    InvalidLogBase(f64),

    #[error("{axis} axis is logarithmic but contains non-positive value {value}")]
    NonPositiveOnLogAxis { axis: char, value: f64 },

    #[error("y limits are empty: min {min} >= max {max}")]
    InvalidLimits { min: f64, max: f64 },

    #[error("unsupported output format for {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to write chart {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("drawing failed: {0}")]
    Backend(String),

    #[error("failed to launch viewer '{command}'")]
    Viewer {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while loading a chart manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("chart '{chart}': invalid plot options: {source}")]
    Options {
        chart: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("chart '{chart}' names no benchmark keys")]
    NoKeys { chart: String },
}
