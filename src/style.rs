//! Chart styling: per-series markers and colors, slope line dashes, and
//! the figure-wide font and size settings.

use plotters::style::RGBColor;
use serde::Deserialize;

/// Marker drawn at every measured point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Cross,
    Square,
    TriangleRight,
    Point,
    TriangleLeft,
    TriangleDown,
    Pentagon,
    Star,
    Hexagon,
    Plus,
    TriangleUp,
    Diamond,
    ThinDiamond,
    VLine,
    HLine,
}

const MARKERS: [Marker; 16] = [
    Marker::Circle,
    Marker::Cross,
    Marker::Square,
    Marker::TriangleRight,
    Marker::Point,
    Marker::TriangleLeft,
    Marker::TriangleDown,
    Marker::Pentagon,
    Marker::Star,
    Marker::Hexagon,
    Marker::Plus,
    Marker::TriangleUp,
    Marker::Diamond,
    Marker::ThinDiamond,
    Marker::VLine,
    Marker::HLine,
];

/// The "tab10" categorical palette
const COLORS: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Outline of a marker in pixel offsets around the data point
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerShape {
    Circle { radius: u32, filled: bool },
    Path(Vec<(i32, i32)>),
}

impl Marker {
    /// Shape for a marker of the given radius in pixels.
    ///
    /// Crossing strokes are emitted as one polyline that retraces through
    /// the center, so every shape is a single element.
    pub fn shape(self, radius: u32) -> MarkerShape {
        let r = radius.max(1) as f64;
        let at = |x: f64, y: f64| (x.round() as i32, y.round() as i32);
        match self {
            Marker::Circle => MarkerShape::Circle {
                radius: radius.max(1),
                filled: false,
            },
            Marker::Point => MarkerShape::Circle {
                radius: (radius / 3).max(1),
                filled: true,
            },
            Marker::Cross => MarkerShape::Path(vec![
                at(-r, -r),
                at(r, r),
                at(0.0, 0.0),
                at(r, -r),
                at(-r, r),
            ]),
            Marker::Plus => MarkerShape::Path(vec![
                at(-r, 0.0),
                at(r, 0.0),
                at(0.0, 0.0),
                at(0.0, -r),
                at(0.0, r),
            ]),
            Marker::VLine => MarkerShape::Path(vec![at(0.0, -r), at(0.0, r)]),
            Marker::HLine => MarkerShape::Path(vec![at(-r, 0.0), at(r, 0.0)]),
            Marker::Square => regular_polygon(4, 45.0, r * std::f64::consts::SQRT_2, 1.0),
            Marker::Diamond => regular_polygon(4, 90.0, r, 1.0),
            Marker::ThinDiamond => regular_polygon(4, 90.0, r, 0.6),
            Marker::TriangleUp => regular_polygon(3, 90.0, r, 1.0),
            Marker::TriangleDown => regular_polygon(3, -90.0, r, 1.0),
            Marker::TriangleLeft => regular_polygon(3, 180.0, r, 1.0),
            Marker::TriangleRight => regular_polygon(3, 0.0, r, 1.0),
            Marker::Pentagon => regular_polygon(5, 90.0, r, 1.0),
            Marker::Hexagon => regular_polygon(6, 90.0, r, 1.0),
            Marker::Star => {
                let mut path: Vec<(i32, i32)> = (0..10)
                    .map(|k| {
                        let radius = if k % 2 == 0 { r } else { r * 0.4 };
                        let angle = (90.0 + 36.0 * k as f64).to_radians();
                        at(radius * angle.cos(), -radius * angle.sin())
                    })
                    .collect();
                path.push(path[0]);
                MarkerShape::Path(path)
            }
        }
    }
}

/// Closed polygon with the first vertex at `rotation` degrees. Pixel y grows
/// downwards, so angles are mirrored.
fn regular_polygon(sides: u32, rotation: f64, radius: f64, x_scale: f64) -> MarkerShape {
    let mut path: Vec<(i32, i32)> = (0..sides)
        .map(|k| {
            let angle = (rotation + 360.0 * k as f64 / sides as f64).to_radians();
            (
                (radius * x_scale * angle.cos()).round() as i32,
                (-radius * angle.sin()).round() as i32,
            )
        })
        .collect();
    path.push(path[0]);
    MarkerShape::Path(path)
}

/// Marker and color of one measured curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    pub marker: Marker,
    pub color: RGBColor,
}

/// Style of the series at `index` in a chart. Markers and colors cycle
/// independently, so any number of series gets a style.
pub fn series_style(index: usize) -> SeriesStyle {
    SeriesStyle {
        marker: MARKERS[index % MARKERS.len()],
        color: COLORS[index % COLORS.len()],
    }
}

/// Stroke pattern of a reference line, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDash {
    Solid,
    Dashed { size: u32, spacing: u32 },
}

const SLOPE_DASHES: [LineDash; 4] = [
    LineDash::Dashed { size: 8, spacing: 6 },
    LineDash::Dashed { size: 14, spacing: 4 },
    LineDash::Solid,
    LineDash::Dashed { size: 2, spacing: 4 },
];

pub const SLOPE_COLOR: RGBColor = RGBColor(0, 0, 0);

/// Dash pattern of the slope overlay at `index`
pub fn slope_style(index: usize) -> LineDash {
    SLOPE_DASHES[index % SLOPE_DASHES.len()]
}

/// Figure-wide appearance. Sizes are in points and converted with `dpi`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotStyle {
    pub font_family: String,
    pub title_font_size: f64,
    pub label_font_size: f64,
    pub tick_font_size: f64,
    pub legend_font_size: f64,
    pub line_width: f64,
    pub marker_size: f64,
    pub marker_edge_width: f64,
    pub slope_line_width: f64,
    pub dpi: f64,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            font_family: "serif".to_string(),
            title_font_size: 12.0,
            label_font_size: 12.0,
            tick_font_size: 12.0,
            legend_font_size: 10.0,
            line_width: 2.0,
            marker_size: 7.5,
            marker_edge_width: 1.2,
            slope_line_width: 2.0,
            dpi: 200.0,
        }
    }
}

impl PlotStyle {
    /// Convert points to pixels
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }

    /// Pixel width of a dimension given in points, never below one pixel
    pub fn stroke(&self, points: f64) -> u32 {
        (self.px(points).round() as u32).max(1)
    }

    /// Marker radius in pixels (`marker_size` is a diameter)
    pub fn marker_radius(&self) -> u32 {
        ((self.px(self.marker_size) / 2.0).round() as u32).max(1)
    }

    /// Font size in pixels
    pub fn font_px(&self, points: f64) -> u32 {
        (self.px(points).round() as u32).max(1)
    }

    /// Canvas size in pixels for a figure size in inches
    pub fn canvas(&self, (width, height): (f64, f64)) -> (u32, u32) {
        (
            ((width * self.dpi).round() as u32).max(1),
            ((height * self.dpi).round() as u32).max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_style_cycles_past_palette() {
        assert_eq!(series_style(0), series_style(80));
        assert_eq!(series_style(10).color, series_style(0).color);
        assert_ne!(series_style(10).marker, series_style(0).marker);
        assert_eq!(series_style(16).marker, Marker::Circle);
        assert_eq!(series_style(3).color, RGBColor(214, 39, 40));
    }

    #[test]
    fn test_slope_style_cycles() {
        assert_eq!(slope_style(2), LineDash::Solid);
        assert_eq!(slope_style(4), slope_style(0));
    }

    #[test]
    fn test_polygon_shapes_are_closed() {
        for marker in MARKERS {
            if let MarkerShape::Path(path) = marker.shape(6) {
                assert!(path.len() >= 2, "{:?}", marker);
                for (x, y) in &path {
                    assert!(x.abs() <= 9 && y.abs() <= 9, "{:?} escapes its box", marker);
                }
            }
        }
        match Marker::TriangleUp.shape(10) {
            MarkerShape::Path(path) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path[0], (0, -10));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_style_pixel_conversion() {
        let style = PlotStyle {
            dpi: 72.0,
            ..Default::default()
        };
        assert_eq!(style.stroke(2.0), 2);
        assert_eq!(style.marker_radius(), 4);
        assert_eq!(style.canvas((3.0, 2.0)), (216, 144));
        assert_eq!(PlotStyle::default().canvas((3.0, 2.0)), (600, 400));
    }
}
