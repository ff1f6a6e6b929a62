//! Benchmark report loading.
//!
//! A report is the JSON document written by Google Benchmark with
//! `--benchmark_format=json`. Only the `benchmarks` array is read. Every
//! record is classified exactly once, at load time, into a [`Sample`]:
//! a timed run at some input size, the fitted "BigO" descriptor of a
//! family, or anything else the harness emits (RMS, mean, stddev, ...).

use crate::error::ReportError;
use serde::Deserialize;
use std::path::Path;

const SIZE_SEPARATOR: char = '/';
const BIG_O_MARKER: &str = "BigO";

/// One entry of the `benchmarks` array, as written by the harness
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkRecord {
    pub name: String,
    #[serde(default)]
    pub cpu_time: Option<f64>,
    #[serde(default)]
    pub cpu_coefficient: Option<f64>,
    #[serde(default)]
    pub big_o: Option<String>,
    #[serde(default)]
    pub time_unit: Option<String>,
    #[serde(default)]
    pub run_type: Option<String>,
    #[serde(default)]
    pub aggregate_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    benchmarks: Vec<BenchmarkRecord>,
}

/// A classified benchmark record. Times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// A timed run at input size `n`
    Sized { name: String, n: u64, cpu_time: f64 },
    /// The fitted asymptotic descriptor of a benchmark family
    Aggregate { name: String, cte: f64, big_o: u32 },
    /// A run whose size suffix is not an integer (`/real_time`,
    /// `/threads:8`, ...). Only an error for keys that select it.
    Malformed { name: String, suffix: String },
    /// Records that carry no plottable data
    Other { name: String },
}

impl Sample {
    pub fn name(&self) -> &str {
        match self {
            Sample::Sized { name, .. }
            | Sample::Aggregate { name, .. }
            | Sample::Malformed { name, .. }
            | Sample::Other { name } => name,
        }
    }
}

/// Seconds per unit of the record's `time_unit` (nanoseconds when absent)
fn seconds_per_unit(record: &BenchmarkRecord) -> Result<f64, ReportError> {
    match record.time_unit.as_deref().unwrap_or("ns") {
        "ns" => Ok(1e9),
        "us" => Ok(1e6),
        "ms" => Ok(1e3),
        "s" => Ok(1.0),
        unit => Err(ReportError::UnknownTimeUnit {
            name: record.name.clone(),
            unit: unit.to_string(),
        }),
    }
}

/// Parse the exponent of a polynomial complexity string.
///
/// `N^k` gives `k`, `N` gives 1 and `(1)` gives 0. Logarithmic fits
/// (`lgN`, `NlgN`) have no integer exponent and are rejected.
pub fn parse_big_o(big_o: &str) -> Option<u32> {
    let big_o = big_o.trim();
    match big_o {
        "N" => Some(1),
        "(1)" => Some(0),
        _ => {
            let (base, exponent) = big_o.rsplit_once('^')?;
            if base.trim() != "N" {
                return None;
            }
            exponent.trim().parse().ok()
        }
    }
}

fn is_big_o(record: &BenchmarkRecord) -> bool {
    record.aggregate_name.as_deref() == Some(BIG_O_MARKER) || record.name.contains(BIG_O_MARKER)
}

/// Decide what a raw record is
pub fn classify(record: &BenchmarkRecord) -> Result<Sample, ReportError> {
    let name = record.name.clone();

    if is_big_o(record) {
        let scale = seconds_per_unit(record)?;
        let coefficient = record.cpu_coefficient.ok_or_else(|| ReportError::MissingField {
            name: name.clone(),
            field: "cpu_coefficient",
        })?;
        let big_o_text = record.big_o.as_deref().ok_or_else(|| ReportError::MissingField {
            name: name.clone(),
            field: "big_o",
        })?;
        let big_o = parse_big_o(big_o_text).ok_or_else(|| ReportError::UnsupportedComplexity {
            name: name.clone(),
            big_o: big_o_text.to_string(),
        })?;
        return Ok(Sample::Aggregate {
            name,
            cte: coefficient / scale,
            big_o,
        });
    }

    // mean/median/stddev/RMS rows of repeated or complexity runs
    if record.run_type.as_deref() == Some("aggregate") {
        return Ok(Sample::Other { name });
    }

    if let Some((_, suffix)) = name.rsplit_once(SIZE_SEPARATOR) {
        let Ok(n) = suffix.parse::<u64>() else {
            let suffix = suffix.to_string();
            return Ok(Sample::Malformed { name, suffix });
        };
        let scale = seconds_per_unit(record)?;
        let cpu_time = record.cpu_time.ok_or_else(|| ReportError::MissingField {
            name: name.clone(),
            field: "cpu_time",
        })?;
        return Ok(Sample::Sized {
            name,
            n,
            cpu_time: cpu_time / scale,
        });
    }

    Ok(Sample::Other { name })
}

/// A loaded benchmark report with every record classified
#[derive(Debug, Clone, Default)]
pub struct Report {
    samples: Vec<Sample>,
}

impl Report {
    /// Load and classify a report file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and classify a report from its JSON text
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let raw: RawReport = serde_json::from_str(json)?;
        Self::from_records(&raw.benchmarks)
    }

    pub fn from_records(records: &[BenchmarkRecord]) -> Result<Self, ReportError> {
        let samples = records
            .iter()
            .map(|record| {
                let sample = classify(record)?;
                match &sample {
                    Sample::Other { name } => {
                        tracing::debug!(
                            benchmark = %name,
                            "skipping record without size or BigO data"
                        );
                    }
                    Sample::Malformed { name, suffix } => {
                        tracing::debug!(
                            benchmark = %name,
                            %suffix,
                            "size suffix is not an integer"
                        );
                    }
                    _ => {}
                }
                Ok(sample)
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        tracing::debug!(records = samples.len(), "classified benchmark report");
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> BenchmarkRecord {
        BenchmarkRecord {
            name: name.to_string(),
            cpu_time: None,
            cpu_coefficient: None,
            big_o: None,
            time_unit: None,
            run_type: None,
            aggregate_name: None,
        }
    }

    #[test]
    fn test_parse_big_o() {
        assert_eq!(parse_big_o("N^1"), Some(1));
        assert_eq!(parse_big_o("N^3"), Some(3));
        assert_eq!(parse_big_o("N"), Some(1));
        assert_eq!(parse_big_o("(1)"), Some(0));
        assert_eq!(parse_big_o("lgN"), None);
        assert_eq!(parse_big_o("NlgN"), None);
        assert_eq!(parse_big_o("N^x"), None);
    }

    #[test]
    fn test_classify_sized() {
        let mut r = record("copy_matrix_ET/128");
        r.cpu_time = Some(2500.0);
        let sample = classify(&r).unwrap();
        assert_eq!(
            sample,
            Sample::Sized {
                name: "copy_matrix_ET/128".to_string(),
                n: 128,
                cpu_time: 2500.0 / 1e9,
            }
        );
    }

    #[test]
    fn test_classify_uses_time_unit() {
        let mut r = record("copy_matrix_ET/8");
        r.cpu_time = Some(3.0);
        r.time_unit = Some("us".to_string());
        match classify(&r).unwrap() {
            Sample::Sized { cpu_time, .. } => assert_eq!(cpu_time, 3.0 / 1e6),
            other => panic!("unexpected sample {:?}", other),
        }

        r.time_unit = Some("fortnights".to_string());
        assert!(matches!(
            classify(&r),
            Err(ReportError::UnknownTimeUnit { .. })
        ));
    }

    #[test]
    fn test_classify_aggregate_by_name_or_aggregate_name() {
        let mut r = record("LU_factorization_RG_BigO");
        r.cpu_coefficient = Some(4.0);
        r.big_o = Some("N^3".to_string());
        assert_eq!(
            classify(&r).unwrap(),
            Sample::Aggregate {
                name: "LU_factorization_RG_BigO".to_string(),
                cte: 4.0 / 1e9,
                big_o: 3,
            }
        );

        let mut r = record("LU_factorization_RG");
        r.run_type = Some("aggregate".to_string());
        r.aggregate_name = Some("BigO".to_string());
        r.cpu_coefficient = Some(4.0);
        r.big_o = Some("N^3".to_string());
        assert!(matches!(classify(&r).unwrap(), Sample::Aggregate { big_o: 3, .. }));
    }

    #[test]
    fn test_classify_aggregate_requires_fields() {
        let mut r = record("op_BigO");
        r.big_o = Some("N^2".to_string());
        assert!(matches!(
            classify(&r),
            Err(ReportError::MissingField { field: "cpu_coefficient", .. })
        ));

        r.cpu_coefficient = Some(1.0);
        r.big_o = Some("NlgN".to_string());
        assert!(matches!(
            classify(&r),
            Err(ReportError::UnsupportedComplexity { .. })
        ));
    }

    #[test]
    fn test_classify_skips_other_records() {
        let r = record("op_A_ET_RMS");
        assert_eq!(
            classify(&r).unwrap(),
            Sample::Other { name: "op_A_ET_RMS".to_string() }
        );

        let mut r = record("op_A_ET/10_mean");
        r.run_type = Some("aggregate".to_string());
        r.aggregate_name = Some("mean".to_string());
        assert!(matches!(classify(&r).unwrap(), Sample::Other { .. }));
    }

    #[test]
    fn test_classify_marks_malformed_size() {
        let mut r = record("op_A_ET/real_time");
        r.cpu_time = Some(1.0);
        assert_eq!(
            classify(&r).unwrap(),
            Sample::Malformed {
                name: "op_A_ET/real_time".to_string(),
                suffix: "real_time".to_string(),
            }
        );
    }

    #[test]
    fn test_unrelated_malformed_record_does_not_fail_load() {
        let json = r#"{"benchmarks": [
            {"name": "op_A_ET/10", "cpu_time": 100},
            {"name": "op_A_ET/100", "cpu_time": 900},
            {"name": "op_A_ET_BigO", "cpu_coefficient": 1000, "big_o": "N^1"},
            {"name": "other_bench/64/real_time", "cpu_time": 5},
            {"name": "other_bench/threads:8", "cpu_time": 5}
        ]}"#;
        let report = Report::from_json(json).unwrap();
        assert_eq!(report.samples().len(), 5);
        assert!(matches!(report.samples()[3], Sample::Malformed { .. }));
    }

    #[test]
    fn test_report_from_json() {
        let json = r#"{
            "context": {"num_cpus": 8},
            "benchmarks": [
                {"name": "op_A_ET/10", "cpu_time": 100, "real_time": 120, "iterations": 1000},
                {"name": "op_A_ET_BigO", "cpu_coefficient": 1000, "big_o": "N^1"},
                {"name": "op_A_ET_RMS", "rms": 0.01}
            ]
        }"#;
        let report = Report::from_json(json).unwrap();
        assert_eq!(report.samples().len(), 3);
        assert!(!report.is_empty());
        assert_eq!(report.samples()[2].name(), "op_A_ET_RMS");
    }

    #[test]
    fn test_report_requires_benchmarks_array() {
        assert!(matches!(
            Report::from_json(r#"{"context": {}}"#),
            Err(ReportError::Json(_))
        ));
    }
}
