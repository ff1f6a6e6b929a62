//! bigoplot - log-log performance charts from Google Benchmark reports.
//!
//! A report is loaded once and classified into [`report::Sample`]s. Each
//! chart then extracts one [`series::Series`] per benchmark key and hands
//! them to [`plot::plot`], which can overlay a big-O reference line built
//! from the fitted coefficients.

pub mod axis;
pub mod error;
pub mod manifest;
pub mod plot;
pub mod report;
pub mod series;
pub mod style;

pub use error::{ExtractError, ManifestError, PlotError, ReportError};
pub use manifest::{ChartJob, Manifest};
pub use plot::{plot, Output, PlotOptions, Slopes};
pub use report::{Report, Sample};
pub use series::{extract, Point, Series};
pub use style::PlotStyle;
