//! Series extraction from classified benchmark samples.

use crate::error::ExtractError;
use crate::report::Sample;

/// One measured point: input size and CPU time in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub n: u64,
    pub cpu_time: f64,
}

/// The data of one plotted curve
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// Sorted strictly ascending by `n`
    pub points: Vec<Point>,
    /// Fitted coefficient in seconds
    pub cte: f64,
    pub big_o: u32,
}

impl Series {
    /// Legend text: the variant suffix after the last `_` of the label
    pub fn legend_label(&self) -> &str {
        self.label.rsplit('_').next().unwrap_or(&self.label)
    }

    pub fn sizes(&self) -> impl Iterator<Item = u64> + '_ {
        self.points.iter().map(|p| p.n)
    }

    pub fn cpu_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.cpu_time)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Build the series for every sample whose name contains `key`.
///
/// The key must match exactly one BigO record and at least one sized
/// sample, no two sized samples may share an input size, and no matched
/// run may carry a non-integer size suffix.
pub fn extract(samples: &[Sample], key: &str) -> Result<Series, ExtractError> {
    let mut points = Vec::new();
    let mut aggregates = Vec::new();

    for sample in samples.iter().filter(|s| s.name().contains(key)) {
        match sample {
            Sample::Sized { n, cpu_time, .. } => points.push(Point {
                n: *n,
                cpu_time: *cpu_time,
            }),
            Sample::Aggregate { cte, big_o, .. } => aggregates.push((*cte, *big_o)),
            Sample::Malformed { name, suffix } => {
                return Err(ExtractError::MalformedName {
                    key: key.to_string(),
                    name: name.clone(),
                    suffix: suffix.clone(),
                })
            }
            Sample::Other { .. } => {}
        }
    }

    let (cte, big_o) = match aggregates.as_slice() {
        [] => {
            return Err(ExtractError::MissingAggregate {
                key: key.to_string(),
            })
        }
        [single] => *single,
        many => {
            return Err(ExtractError::AmbiguousAggregate {
                key: key.to_string(),
                count: many.len(),
            })
        }
    };

    if points.is_empty() {
        return Err(ExtractError::NoSamples {
            key: key.to_string(),
        });
    }

    points.sort_by_key(|p| p.n);
    if let Some(pair) = points.windows(2).find(|w| w[0].n == w[1].n) {
        return Err(ExtractError::DuplicateSize {
            key: key.to_string(),
            n: pair[0].n,
        });
    }

    tracing::debug!(key, points = points.len(), big_o, "extracted series");

    Ok(Series {
        label: key.to_string(),
        points,
        cte,
        big_o,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;

    fn sized(name: &str, n: u64, cpu_time: f64) -> Sample {
        Sample::Sized {
            name: name.to_string(),
            n,
            cpu_time,
        }
    }

    fn big_o(name: &str, cte: f64, big_o: u32) -> Sample {
        Sample::Aggregate {
            name: name.to_string(),
            cte,
            big_o,
        }
    }

    #[test]
    fn test_extract_reference_scenario() {
        let json = r#"{"benchmarks": [
            {"name": "op_A_ET/10", "cpu_time": 100},
            {"name": "op_A_ET/100", "cpu_time": 900},
            {"name": "op_A_ET_BigO", "cpu_coefficient": 1000, "big_o": "N^1"}
        ]}"#;
        let report = Report::from_json(json).unwrap();
        let series = extract(report.samples(), "op_A_ET").unwrap();

        assert_eq!(series.sizes().collect::<Vec<_>>(), vec![10, 100]);
        assert_eq!(series.cpu_times().collect::<Vec<_>>(), vec![1e-7, 9e-7]);
        assert_eq!(series.cte, 1e-6);
        assert_eq!(series.big_o, 1);
        assert_eq!(series.legend_label(), "ET");
    }

    #[test]
    fn test_extract_sorts_pairs_jointly() {
        let samples = vec![
            sized("mult_ET/64", 64, 6.4),
            sized("mult_ET/8", 8, 0.8),
            sized("mult_ET/512", 512, 51.2),
            sized("mult_ET/16", 16, 1.6),
            big_o("mult_ET_BigO", 0.1, 1),
        ];
        let series = extract(&samples, "mult_ET").unwrap();
        assert_eq!(series.sizes().collect::<Vec<_>>(), vec![8, 16, 64, 512]);
        for p in &series.points {
            assert_eq!(p.cpu_time, p.n as f64 / 10.0);
        }
    }

    #[test]
    fn test_extract_filters_by_substring() {
        let samples = vec![
            sized("sum_ET/8", 8, 1.0),
            sized("sum_RG/8", 8, 2.0),
            big_o("sum_ET_BigO", 0.5, 2),
            big_o("sum_RG_BigO", 0.7, 2),
        ];
        let series = extract(&samples, "sum_RG").unwrap();
        assert_eq!(series.points, vec![Point { n: 8, cpu_time: 2.0 }]);
        assert_eq!(series.cte, 0.7);
    }

    #[test]
    fn test_extract_missing_aggregate() {
        let samples = vec![sized("op_ET/8", 8, 1.0)];
        assert_eq!(
            extract(&samples, "op_ET"),
            Err(ExtractError::MissingAggregate {
                key: "op_ET".to_string()
            })
        );
    }

    #[test]
    fn test_extract_ambiguous_aggregate() {
        let samples = vec![
            sized("sum_ET/8", 8, 1.0),
            big_o("sum_ET_BigO", 0.5, 2),
            big_o("sum_RG_BigO", 0.7, 2),
        ];
        assert_eq!(
            extract(&samples, "sum"),
            Err(ExtractError::AmbiguousAggregate {
                key: "sum".to_string(),
                count: 2
            })
        );
    }

    #[test]
    fn test_extract_requires_samples() {
        let samples = vec![big_o("op_ET_BigO", 0.5, 2)];
        assert!(matches!(
            extract(&samples, "op_ET"),
            Err(ExtractError::NoSamples { .. })
        ));
    }

    #[test]
    fn test_extract_rejects_duplicate_sizes() {
        let samples = vec![
            sized("op_ET/8", 8, 1.0),
            sized("op_ET/8", 8, 1.1),
            big_o("op_ET_BigO", 0.5, 1),
        ];
        assert_eq!(
            extract(&samples, "op_ET"),
            Err(ExtractError::DuplicateSize {
                key: "op_ET".to_string(),
                n: 8
            })
        );
    }

    #[test]
    fn test_extract_malformed_only_fails_matching_key() {
        let samples = vec![
            sized("op_A_ET/10", 10, 1e-7),
            sized("op_A_ET/100", 100, 9e-7),
            big_o("op_A_ET_BigO", 1e-6, 1),
            Sample::Malformed {
                name: "other_bench/64/real_time".to_string(),
                suffix: "real_time".to_string(),
            },
        ];
        assert_eq!(extract(&samples, "op_A_ET").unwrap().len(), 2);
        assert_eq!(
            extract(&samples, "other_bench"),
            Err(ExtractError::MalformedName {
                key: "other_bench".to_string(),
                name: "other_bench/64/real_time".to_string(),
                suffix: "real_time".to_string(),
            })
        );
    }

    #[test]
    fn test_extract_is_repeatable() {
        let samples = vec![
            sized("op_ET/32", 32, 3.0),
            sized("op_ET/4", 4, 0.4),
            big_o("op_ET_BigO", 0.1, 1),
        ];
        assert_eq!(extract(&samples, "op_ET"), extract(&samples, "op_ET"));
    }
}
