//! Chart rendering for extracted series.
//!
//! Rendering happens in two steps. [`ChartLayout::build`] validates the
//! series against the options and computes everything that is drawn, in
//! chart coordinates; no drawing resource exists yet, so every precondition
//! failure leaves the filesystem untouched. [`plot`] then owns one drawing
//! area for the duration of the call and drops it on every path.

use crate::axis::{every_other, merge_ticks, superscript, Scale, TickFormat};
use crate::error::PlotError;
use crate::series::Series;
use crate::style::{
    series_style, slope_style, LineDash, MarkerShape, PlotStyle, SeriesStyle, SLOPE_COLOR,
};
use plotters::coord::ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use serde::Deserialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

const X_LABEL: &str = "N";
const Y_LABEL: &str = "CPU time [s]";

/// Fraction of the data span left empty on each side of an axis
const AXIS_MARGIN: f64 = 0.05;

/// Legend length in pixels for the line sample
const LEGEND_LINE: i32 = 20;

#[cfg(target_os = "macos")]
const DEFAULT_VIEWER: &str = "open";
#[cfg(not(target_os = "macos"))]
const DEFAULT_VIEWER: &str = "xdg-open";

/// Legend placement inside the plotting area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendLocation {
    #[default]
    #[serde(alias = "upper left")]
    UpperLeft,
    #[serde(alias = "upper center")]
    UpperCenter,
    #[serde(alias = "upper right", alias = "best")]
    UpperRight,
    #[serde(alias = "center left")]
    CenterLeft,
    Center,
    #[serde(alias = "center right", alias = "right")]
    CenterRight,
    #[serde(alias = "lower left")]
    LowerLeft,
    #[serde(alias = "lower center")]
    LowerCenter,
    #[serde(alias = "lower right")]
    LowerRight,
}

impl From<LegendLocation> for SeriesLabelPosition {
    fn from(location: LegendLocation) -> Self {
        match location {
            LegendLocation::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendLocation::UpperCenter => SeriesLabelPosition::UpperMiddle,
            LegendLocation::UpperRight => SeriesLabelPosition::UpperRight,
            LegendLocation::CenterLeft => SeriesLabelPosition::MiddleLeft,
            LegendLocation::Center => SeriesLabelPosition::MiddleMiddle,
            LegendLocation::CenterRight => SeriesLabelPosition::MiddleRight,
            LegendLocation::LowerLeft => SeriesLabelPosition::LowerLeft,
            LegendLocation::LowerCenter => SeriesLabelPosition::LowerMiddle,
            LegendLocation::LowerRight => SeriesLabelPosition::LowerRight,
        }
    }
}

/// Reference lines drawn over the measured curves.
///
/// The three lists are parallel: entry `i` draws `factor[i] * cte * N^k`
/// over `N[range[i].0..range[i].1]` of series `series[i]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Slopes {
    pub series: Vec<usize>,
    pub factor: Vec<f64>,
    pub range: Vec<(usize, usize)>,
}

/// Options for one chart
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotOptions {
    pub location: LegendLocation,
    pub figure_title: String,
    pub show_legend: bool,
    pub logx: bool,
    pub logy: bool,
    pub log_base: u32,
    pub max_y: Option<f64>,
    pub min_y: Option<f64>,
    pub slopes: Option<Slopes>,
    pub set_x_label: bool,
    pub set_y_label: bool,
    pub set_x_ticks_formatter: Option<TickFormat>,
    pub set_y_ticks_formatter: Option<TickFormat>,
    pub set_x_ticks_labels: bool,
    pub set_y_ticks_labels: bool,
    pub xticks: Option<Vec<f64>>,
    pub yticks: Option<Vec<f64>>,
    /// Width and height in inches
    pub figsize: (f64, f64),
    /// Accepted for compatibility; legends are never exported separately
    pub export_legend: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            location: LegendLocation::default(),
            figure_title: String::new(),
            show_legend: true,
            logx: true,
            logy: true,
            log_base: 10,
            max_y: None,
            min_y: None,
            slopes: None,
            set_x_label: false,
            set_y_label: false,
            set_x_ticks_formatter: None,
            set_y_ticks_formatter: None,
            set_x_ticks_labels: false,
            set_y_ticks_labels: false,
            xticks: None,
            yticks: None,
            figsize: (3.0, 2.0),
            export_legend: false,
        }
    }
}

/// Where a rendered chart goes
#[derive(Debug, Clone, Default)]
pub struct Output {
    /// File to write; the format follows the extension
    pub save: Option<PathBuf>,
    /// Open the chart in a viewer after rendering
    pub show: bool,
    /// Viewer command, `xdg-open` (`open` on macOS) when unset
    pub viewer: Option<String>,
}

impl Output {
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            save: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Output image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    #[cfg(feature = "png")]
    Png,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self, PlotError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("svg") => Ok(ImageFormat::Svg),
            #[cfg(feature = "png")]
            Some("png") => Ok(ImageFormat::Png),
            _ => Err(PlotError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// One axis in chart coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayout {
    pub scale: Scale,
    pub lo: f64,
    pub hi: f64,
    /// Tick positions in chart coordinates, ascending
    pub ticks: Vec<f64>,
    pub format: TickFormat,
}

impl AxisLayout {
    pub fn label(&self, coord: f64) -> String {
        self.format.format(self.scale.inverse(coord), self.scale)
    }
}

/// A measured curve in chart coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub style: SeriesStyle,
    pub points: Vec<(f64, f64)>,
}

/// A complexity reference line in chart coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct SlopeLine {
    pub label: String,
    pub dash: LineDash,
    pub points: Vec<(f64, f64)>,
}

/// Everything drawn on one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub x: AxisLayout,
    pub y: AxisLayout,
    pub curves: Vec<Curve>,
    pub slopes: Vec<SlopeLine>,
}

fn axis_scale(log: bool, base: u32) -> Result<Scale, PlotError> {
    if !log {
        return Ok(Scale::Linear);
    }
    if base < 2 {
        return Err(PlotError::InvalidLogBase(base as f64));
    }
    Ok(Scale::Log { base: base as f64 })
}

fn to_chart(scale: Scale, axis: char, value: f64) -> Result<f64, PlotError> {
    if scale.is_log() && value <= 0.0 {
        return Err(PlotError::NonPositiveOnLogAxis { axis, value });
    }
    Ok(scale.forward(value))
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    let span = hi - lo;
    if span > 0.0 {
        (lo - AXIS_MARGIN * span, hi + AXIS_MARGIN * span)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

/// Validate the slope overlay and compute its lines in data coordinates
fn slope_lines(
    series: &[Series],
    slopes: &Slopes,
) -> Result<Vec<(String, LineDash, Vec<(f64, f64)>)>, PlotError> {
    let exponents: Vec<u32> = series.iter().map(|s| s.big_o).collect();
    if exponents.windows(2).any(|w| w[0] != w[1]) {
        return Err(PlotError::MixedComplexity { exponents });
    }
    if slopes.series.len() != slopes.factor.len() || slopes.series.len() != slopes.range.len() {
        return Err(PlotError::SlopeLengthMismatch {
            series: slopes.series.len(),
            factors: slopes.factor.len(),
            ranges: slopes.range.len(),
        });
    }

    let big_o = exponents[0];
    let cte = series.iter().map(|s| s.cte).fold(f64::NEG_INFINITY, f64::max);
    let label = format!("O(N{})", superscript(big_o as i64));

    let mut lines = Vec::with_capacity(slopes.series.len());
    for (entry, ((&index, &factor), &(start, end))) in slopes
        .series
        .iter()
        .zip(&slopes.factor)
        .zip(&slopes.range)
        .enumerate()
    {
        let target = series.get(index).ok_or(PlotError::SlopeSeriesOutOfRange {
            entry,
            index,
            len: series.len(),
        })?;
        let len = target.len();
        let end_clamped = end.min(len);
        if start >= end_clamped {
            return Err(PlotError::SlopeRangeOutOfBounds { entry, start, end, len });
        }

        let points = target.points[start..end_clamped]
            .iter()
            .map(|p| {
                let n = p.n as f64;
                (n, factor * cte * n.powi(big_o as i32))
            })
            .collect();
        lines.push((label.clone(), slope_style(entry), points));
    }
    Ok(lines)
}

/// Pick tick values for one axis and convert them to chart coordinates
fn axis_ticks(
    scale: Scale,
    axis: char,
    (lo, hi): (f64, f64),
    requested: Option<Vec<f64>>,
) -> Result<Vec<f64>, PlotError> {
    let values = match requested {
        Some(values) => values,
        None => scale.default_ticks(scale.inverse(lo), scale.inverse(hi)),
    };
    let slack = (hi - lo) * 1e-9;
    let mut ticks = values
        .into_iter()
        .map(|v| to_chart(scale, axis, v))
        .collect::<Result<Vec<_>, _>>()?;
    ticks.retain(|t| t.is_finite() && *t >= lo - slack && *t <= hi + slack);
    ticks.sort_by(f64::total_cmp);
    ticks.dedup();
    Ok(ticks)
}

impl ChartLayout {
    /// Validate `series` against `options` and lay the chart out
    pub fn build(series: &[Series], options: &PlotOptions) -> Result<Self, PlotError> {
        if series.is_empty() {
            return Err(PlotError::NoSeries);
        }
        let x_scale = axis_scale(options.logx, options.log_base)?;
        let y_scale = axis_scale(options.logy, options.log_base)?;

        let raw_slopes = match &options.slopes {
            Some(slopes) => slope_lines(series, slopes)?,
            None => Vec::new(),
        };

        let mut curves = Vec::with_capacity(series.len());
        for (index, s) in series.iter().enumerate() {
            let points = s
                .points
                .iter()
                .map(|p| {
                    Ok((
                        to_chart(x_scale, 'x', p.n as f64)?,
                        to_chart(y_scale, 'y', p.cpu_time)?,
                    ))
                })
                .collect::<Result<Vec<_>, PlotError>>()?;
            curves.push(Curve {
                label: s.legend_label().to_string(),
                style: series_style(index),
                points,
            });
        }

        let mut slopes = Vec::with_capacity(raw_slopes.len());
        for (label, dash, points) in raw_slopes {
            let points = points
                .into_iter()
                .map(|(n, t)| Ok((to_chart(x_scale, 'x', n)?, to_chart(y_scale, 'y', t)?)))
                .collect::<Result<Vec<_>, PlotError>>()?;
            slopes.push(SlopeLine { label, dash, points });
        }

        let all_points = || {
            curves
                .iter()
                .flat_map(|c| c.points.iter())
                .chain(slopes.iter().flat_map(|s| s.points.iter()))
        };
        let x_range = padded(extent(all_points().map(|p| p.0)));
        let (mut y_lo, mut y_hi) = padded(extent(all_points().map(|p| p.1)));
        if let Some(min_y) = options.min_y {
            y_lo = to_chart(y_scale, 'y', min_y)?;
        }
        if let Some(max_y) = options.max_y {
            y_hi = to_chart(y_scale, 'y', max_y)?;
        }
        if y_lo >= y_hi {
            return Err(PlotError::InvalidLimits {
                min: y_scale.inverse(y_lo),
                max: y_scale.inverse(y_hi),
            });
        }

        let x_requested = options.set_x_ticks_labels.then(|| {
            options.xticks.clone().unwrap_or_else(|| {
                every_other(&merge_ticks(
                    series.iter().map(|s| s.sizes().map(|n| n as f64).collect::<Vec<_>>()),
                ))
            })
        });
        let y_requested = options.set_y_ticks_labels.then(|| {
            options.yticks.clone().unwrap_or_else(|| {
                merge_ticks(series.iter().map(|s| s.cpu_times().collect::<Vec<_>>()))
            })
        });

        Ok(Self {
            x: AxisLayout {
                scale: x_scale,
                lo: x_range.0,
                hi: x_range.1,
                ticks: axis_ticks(x_scale, 'x', x_range, x_requested)?,
                format: options.set_x_ticks_formatter.unwrap_or_default(),
            },
            y: AxisLayout {
                scale: y_scale,
                lo: y_lo,
                hi: y_hi,
                ticks: axis_ticks(y_scale, 'y', (y_lo, y_hi), y_requested)?,
                format: options.set_y_ticks_formatter.unwrap_or_default(),
            },
            curves,
            slopes,
        })
    }
}

fn backend_error<E: std::fmt::Display>(err: E) -> PlotError {
    PlotError::Backend(err.to_string())
}

/// Chart axis whose grid lines and labels sit exactly on the laid-out ticks
struct TickedAxis {
    coord: RangedCoordf64,
    layout: AxisLayout,
}

impl TickedAxis {
    fn new(layout: &AxisLayout) -> Self {
        Self {
            coord: (layout.lo..layout.hi).into(),
            layout: layout.clone(),
        }
    }
}

impl Ranged for TickedAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.coord.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        // no minor grid
        if hint.weight().allow_light_points() {
            return Vec::new();
        }
        self.layout.ticks.clone()
    }

    fn range(&self) -> Range<f64> {
        self.coord.range()
    }
}

impl ValueFormatter<f64> for TickedAxis {
    fn format_ext(&self, value: &f64) -> String {
        self.layout.label(*value)
    }
}

type ChartCoord = Cartesian2d<TickedAxis, TickedAxis>;

/// Draw a laid-out chart onto `root` and present it
fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    options: &PlotOptions,
    style: &PlotStyle,
) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(backend_error)?;

    let font = style.font_family.as_str();
    let tick_px = style.font_px(style.tick_font_size);
    let label_px = style.font_px(style.label_font_size);

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(tick_px)
        .x_label_area_size(tick_px * 2 + if options.set_x_label { label_px * 2 } else { 0 })
        .y_label_area_size(tick_px * 4 + if options.set_y_label { label_px * 2 } else { 0 });
    if !options.figure_title.is_empty() {
        builder.caption(&options.figure_title, (font, style.font_px(style.title_font_size)));
    }

    let mut chart: ChartContext<'_, DB, ChartCoord> = builder
        .build_cartesian_2d(TickedAxis::new(&layout.x), TickedAxis::new(&layout.y))
        .map_err(backend_error)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.bold_line_style(BLACK.mix(0.08))
            .label_style((font, tick_px))
            .axis_desc_style((font, label_px));
        if options.set_x_label {
            mesh.x_desc(X_LABEL);
        }
        if options.set_y_label {
            mesh.y_desc(Y_LABEL);
        }
        mesh.draw().map_err(backend_error)?;
    }

    let radius = style.marker_radius();
    let line_width = style.stroke(style.line_width);
    let edge_width = style.stroke(style.marker_edge_width);

    for curve in &layout.curves {
        let line = curve.style.color.stroke_width(line_width);
        let edge = curve.style.color.stroke_width(edge_width);
        let shape = curve.style.marker.shape(radius);

        let anno = chart
            .draw_series(LineSeries::new(curve.points.iter().copied(), line))
            .map_err(backend_error)?;
        if options.show_legend {
            anno.label(curve.label.as_str());
            let mid = LEGEND_LINE / 2;
            match shape.clone() {
                MarkerShape::Circle { radius, filled } => {
                    let edge = if filled { edge.filled() } else { edge };
                    anno.legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(0, 0), (LEGEND_LINE, 0)], line)
                            + Circle::new((mid, 0), radius, edge)
                    });
                }
                MarkerShape::Path(path) => {
                    let shifted: Vec<(i32, i32)> =
                        path.iter().map(|&(px, py)| (px + mid, py)).collect();
                    anno.legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(0, 0), (LEGEND_LINE, 0)], line)
                            + PathElement::new(shifted.clone(), edge)
                    });
                }
            }
        }

        let points = curve.points.iter().copied();
        match shape {
            MarkerShape::Circle { radius, filled } => {
                let edge = if filled { edge.filled() } else { edge };
                chart.draw_series(points.map(|p| Circle::new(p, radius, edge)))
            }
            MarkerShape::Path(path) => chart.draw_series(
                points.map(|p| EmptyElement::at(p) + PathElement::new(path.clone(), edge)),
            ),
        }
        .map_err(backend_error)?;
    }

    let slope_line = SLOPE_COLOR.stroke_width(style.stroke(style.slope_line_width));
    for slope in &layout.slopes {
        let points = slope.points.iter().copied();
        let anno = match slope.dash {
            LineDash::Solid => chart.draw_series(LineSeries::new(points, slope_line)),
            LineDash::Dashed { size, spacing } => {
                chart.draw_series(DashedLineSeries::new(points, size, spacing, slope_line))
            }
        }
        .map_err(backend_error)?;
        if options.show_legend {
            anno.label(slope.label.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + LEGEND_LINE, y)], slope_line)
            });
        }
    }

    if options.show_legend {
        chart
            .configure_series_labels()
            .position(options.location.into())
            .background_style(WHITE.mix(0.95))
            .border_style(BLACK)
            .label_font((font, style.font_px(style.legend_font_size)))
            .draw()
            .map_err(backend_error)?;
    }

    root.present().map_err(backend_error)?;
    Ok(())
}

/// Render a chart file, creating parent directories as needed
fn write_chart(
    path: &Path,
    layout: &ChartLayout,
    options: &PlotOptions,
    style: &PlotStyle,
) -> Result<(), PlotError> {
    let format = ImageFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| PlotError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let size = style.canvas(options.figsize);
    match format {
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw(&root, layout, options, style)?;
        }
        #[cfg(feature = "png")]
        ImageFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw(&root, layout, options, style)?;
        }
    }

    tracing::info!(path = %path.display(), "wrote chart");
    Ok(())
}

/// Run the viewer on `path` and wait for it to exit. `xdg-open` and `open`
/// hand the file over and return at once; other viewers block until closed.
fn open_viewer(viewer: Option<&str>, path: &Path) -> Result<(), PlotError> {
    let command = viewer.unwrap_or(DEFAULT_VIEWER);
    tracing::debug!(command, path = %path.display(), "opening chart");
    let status = Command::new(command)
        .arg(path)
        .status()
        .map_err(|source| PlotError::Viewer {
            command: command.to_string(),
            source,
        })?;
    if !status.success() {
        tracing::warn!(command, %status, "viewer exited with an error");
    }
    Ok(())
}

/// Draw one chart of `series` and send it to `output`.
///
/// Returns the path of the saved file, if any. When only showing, the
/// chart is written to a temporary SVG in the system temp directory. The
/// file is left behind, since a launcher such as `xdg-open` returns before
/// the viewer has read it.
pub fn plot(
    series: &[Series],
    options: &PlotOptions,
    style: &PlotStyle,
    output: &Output,
) -> Result<Option<PathBuf>, PlotError> {
    let layout = ChartLayout::build(series, options)?;
    if options.export_legend {
        tracing::warn!("export_legend is not supported and will be ignored");
    }

    if let Some(path) = &output.save {
        write_chart(path, &layout, options, style)?;
    }

    if output.show {
        let shown = match &output.save {
            Some(path) => path.clone(),
            None => {
                let temp = tempfile::Builder::new()
                    .prefix("bigoplot-")
                    .suffix(".svg")
                    .tempfile()
                    .map_err(|source| PlotError::Io {
                        path: std::env::temp_dir(),
                        source,
                    })?;
                let path = temp.into_temp_path().keep().map_err(|e| PlotError::Io {
                    path: e.path.to_path_buf(),
                    source: e.error,
                })?;
                write_chart(&path, &layout, options, style)?;
                path
            }
        };
        open_viewer(output.viewer.as_deref(), &shown)?;
    }

    Ok(output.save.clone())
}

/// Render a chart to an SVG document in memory
pub fn render_svg_string(
    series: &[Series],
    options: &PlotOptions,
    style: &PlotStyle,
) -> Result<String, PlotError> {
    let layout = ChartLayout::build(series, options)?;
    let mut svg = String::new();
    {
        let size = style.canvas(options.figsize);
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root, &layout, options, style)?;
    }
    Ok(svg)
}
