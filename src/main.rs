//! bigoplot - plot Google Benchmark timings against input size, with
//! big-O reference lines from the fitted coefficients.

use anyhow::{bail, Context, Result};
use bigoplot::{extract, plot, ChartJob, Manifest, Output, PlotOptions, PlotStyle, Report, Sample};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Log-log benchmark charts with complexity slopes
#[derive(Parser, Debug)]
#[command(name = "bigoplot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Google Benchmark JSON report (defaults to the manifest's `report`)
    report: Option<PathBuf>,

    /// Plot every chart listed in a TOML manifest
    #[arg(short, long, conflicts_with_all = ["keys", "output", "title", "linear"])]
    manifest: Option<PathBuf>,

    /// Benchmark key to plot; repeat for several series on one chart
    #[arg(short, long = "key")]
    keys: Vec<String>,

    /// Output file for a single chart, PNG or SVG by extension
    /// (default: <output-dir>/<first key>.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Chart title (default: first key)
    #[arg(short, long)]
    title: Option<String>,

    /// Output directory, overriding the manifest's
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Open each chart after rendering
    #[arg(long)]
    show: bool,

    /// Do not write chart files; implies --show
    #[arg(long)]
    no_save: bool,

    /// Viewer command used by --show
    #[arg(long)]
    viewer: Option<String>,

    /// Linear axes instead of log-log
    #[arg(long)]
    linear: bool,

    /// Report a failing chart and continue with the rest
    #[arg(long)]
    keep_going: bool,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "bigoplot=info",
        1 => "bigoplot=debug",
        _ => "bigoplot=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Report path given on the command line, or the manifest's relative to
/// the manifest file
fn report_path(args: &Args, manifest: Option<(&Path, &Manifest)>) -> Result<PathBuf> {
    if let Some(path) = &args.report {
        return Ok(path.clone());
    }
    match manifest.and_then(|(path, m)| m.report.as_ref().map(|r| (path, r))) {
        Some((manifest_path, report)) => Ok(manifest_path
            .parent()
            .map(|dir| dir.join(report))
            .unwrap_or_else(|| report.clone())),
        None => bail!("no benchmark report given"),
    }
}

/// The single chart described by `--key` flags
fn adhoc_job(args: &Args) -> Result<ChartJob> {
    let Some(first) = args.keys.first() else {
        bail!("nothing to plot: pass --manifest or at least one --key");
    };
    let output = match &args.output {
        Some(path) => path.clone(),
        None => args
            .output_dir
            .clone()
            .unwrap_or_default()
            .join(format!("{}.png", first)),
    };
    let options = PlotOptions {
        figure_title: args.title.clone().unwrap_or_else(|| first.clone()),
        logx: !args.linear,
        logy: !args.linear,
        ..Default::default()
    };
    Ok(ChartJob {
        name: first.clone(),
        keys: args.keys.clone(),
        options,
        output,
    })
}

fn run_job(
    samples: &[Sample],
    job: &ChartJob,
    style: &PlotStyle,
    args: &Args,
) -> Result<Option<PathBuf>> {
    let series = job
        .keys
        .iter()
        .map(|key| extract(samples, key))
        .collect::<Result<Vec<_>, _>>()?;
    let output = Output {
        save: (!args.no_save).then(|| job.output.clone()),
        show: args.show || args.no_save,
        viewer: args.viewer.clone(),
    };
    Ok(plot(&series, &job.options, style, &output)?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (report, jobs, style) = match &args.manifest {
        Some(manifest_path) => {
            let manifest = Manifest::load(manifest_path)
                .with_context(|| format!("loading manifest {}", manifest_path.display()))?;
            let output_dir = args.output_dir.clone().unwrap_or_else(|| manifest.output_dir.clone());
            let jobs = manifest.jobs(&output_dir)?;
            let report = report_path(&args, Some((manifest_path.as_path(), &manifest)))?;
            (report, jobs, manifest.style)
        }
        None => (report_path(&args, None)?, vec![adhoc_job(&args)?], PlotStyle::default()),
    };

    eprintln!("Loading benchmarks from: {}", report.display());
    let report = Report::from_path(&report)?;
    if report.is_empty() {
        bail!("no benchmarks found in report");
    }
    tracing::debug!(samples = report.samples().len(), charts = jobs.len(), "report loaded");

    let mut generated = Vec::new();
    let mut failed = 0usize;
    for job in &jobs {
        let result = run_job(report.samples(), job, &style, &args)
            .with_context(|| format!("chart '{}'", job.name));
        match result {
            Ok(Some(path)) => generated.push(path),
            Ok(None) => {}
            Err(e) if args.keep_going => {
                tracing::error!("{:#}", e);
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if !generated.is_empty() {
        eprintln!("\nGenerated {} charts:", generated.len());
        for path in &generated {
            eprintln!("  • {}", path.display());
        }
    }
    if failed > 0 {
        bail!("{} of {} charts failed", failed, jobs.len());
    }
    Ok(())
}
