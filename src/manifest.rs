//! Chart manifests.
//!
//! A manifest lists the charts to draw from one report: which benchmark
//! keys go on each chart, where the file goes, and how it looks. Options
//! in `[defaults]` apply to every chart and `[chart.options]` overrides
//! them field by field.
//!
//! ```toml
//! output_dir = "images"
//!
//! [defaults]
//! logx = true
//! logy = true
//! slopes = { series = [0], factor = [10.0], range = [[0, 5]] }
//!
//! [[chart]]
//! name = "copy_matrix"
//! variants = ["_ET", "_RG"]
//! ```

use crate::error::ManifestError;
use crate::plot::PlotOptions;
use crate::style::PlotStyle;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_format() -> String {
    "png".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Report to read when none is given on the command line
    #[serde(default)]
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: PathBuf,
    /// Image file extension
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub style: PlotStyle,
    #[serde(default)]
    pub defaults: toml::Table,
    #[serde(default, rename = "chart")]
    pub charts: Vec<ChartSpec>,
}

/// One chart entry of a manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartSpec {
    /// File stem, and the title unless the options set one
    pub name: String,
    /// Suffixes appended to `name` to form keys
    #[serde(default)]
    pub variants: Vec<String>,
    /// Keys used as given
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub options: toml::Table,
}

/// A manifest chart with its keys and options resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ChartJob {
    pub name: String,
    pub keys: Vec<String>,
    pub options: PlotOptions,
    pub output: PathBuf,
}

impl Manifest {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(text)?)
    }

    /// Resolve every chart into a job, writing under `output_dir`
    pub fn jobs(&self, output_dir: &Path) -> Result<Vec<ChartJob>, ManifestError> {
        self.charts
            .iter()
            .map(|chart| self.job(chart, output_dir))
            .collect()
    }

    fn job(&self, chart: &ChartSpec, output_dir: &Path) -> Result<ChartJob, ManifestError> {
        let mut keys = chart.keys.clone();
        keys.extend(chart.variants.iter().map(|v| format!("{}{}", chart.name, v)));
        if keys.is_empty() {
            return Err(ManifestError::NoKeys {
                chart: chart.name.clone(),
            });
        }

        let mut table = self.defaults.clone();
        table.extend(chart.options.clone());
        if !table.contains_key("figure_title") {
            table.insert(
                "figure_title".to_string(),
                toml::Value::String(chart.name.clone()),
            );
        }

        let options: PlotOptions =
            toml::Value::Table(table)
                .try_into()
                .map_err(|source| ManifestError::Options {
                    chart: chart.name.clone(),
                    source,
                })?;

        Ok(ChartJob {
            name: chart.name.clone(),
            keys,
            options,
            output: output_dir.join(format!("{}.{}", chart.name, self.format)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{LegendLocation, Slopes};

    const MANIFEST: &str = r#"
        report = "build/benchmarks.json"
        output_dir = "images"

        [style]
        font_family = "sans-serif"

        [defaults]
        location = "upper left"
        set_x_label = true
        slopes = { series = [0], factor = [10], range = [[0, 5]] }

        [[chart]]
        name = "copy_matrix"
        variants = ["_ET", "_RG"]

        [[chart]]
        name = "LU_factorization"
        keys = ["LU_factorization_ET"]
        [chart.options]
        figure_title = "LU"
        max_y = 0.5
        set_x_label = false
    "#;

    #[test]
    fn test_manifest_jobs() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.report, Some(PathBuf::from("build/benchmarks.json")));
        assert_eq!(manifest.style.font_family, "sans-serif");
        assert_eq!(manifest.style.dpi, PlotStyle::default().dpi);

        let jobs = manifest.jobs(&manifest.output_dir).unwrap();
        assert_eq!(jobs.len(), 2);

        let copy = &jobs[0];
        assert_eq!(copy.keys, vec!["copy_matrix_ET", "copy_matrix_RG"]);
        assert_eq!(copy.output, PathBuf::from("images/copy_matrix.png"));
        assert_eq!(copy.options.figure_title, "copy_matrix");
        assert_eq!(copy.options.location, LegendLocation::UpperLeft);
        assert!(copy.options.set_x_label);
        assert_eq!(
            copy.options.slopes,
            Some(Slopes {
                series: vec![0],
                factor: vec![10.0],
                range: vec![(0, 5)],
            })
        );

        let lu = &jobs[1];
        assert_eq!(lu.keys, vec!["LU_factorization_ET"]);
        assert_eq!(lu.options.figure_title, "LU");
        assert_eq!(lu.options.max_y, Some(0.5));
        assert!(!lu.options.set_x_label);
        assert!(lu.options.slopes.is_some());
    }

    #[test]
    fn test_manifest_rejects_unknown_option() {
        let manifest = Manifest::parse(
            r#"
            [[chart]]
            name = "sum"
            variants = ["_ET"]
            [chart.options]
            logz = true
            "#,
        )
        .unwrap();
        assert!(matches!(
            manifest.jobs(Path::new(".")),
            Err(ManifestError::Options { .. })
        ));
    }

    #[test]
    fn test_manifest_requires_keys() {
        let manifest = Manifest::parse("[[chart]]\nname = \"sum\"\n").unwrap();
        assert!(matches!(
            manifest.jobs(Path::new(".")),
            Err(ManifestError::NoKeys { .. })
        ));
    }

    #[test]
    fn test_manifest_format_sets_extension() {
        let manifest = Manifest::parse(
            "format = \"svg\"\n[[chart]]\nname = \"sum\"\nkeys = [\"sum_ET\"]\n",
        )
        .unwrap();
        let jobs = manifest.jobs(Path::new("out")).unwrap();
        assert_eq!(jobs[0].output, PathBuf::from("out/sum.svg"));
    }
}
