//! SVG rendering of toolpaths for debugging
//!
//! Each path becomes a polyline whose stroke colour encodes its flow: the
//! lowest flow in the picture is blue, the highest red. Y is flipped so the
//! picture matches the build plate seen from above.

use gradualflow_core::{GeometricPath, Point, RampedSubPath};
use std::fmt::Write;

/// One polyline to draw
#[derive(Debug, Clone, Copy)]
pub struct Stroke<'a> {
    pub points: &'a [Point],
    pub flow: f64,
}

impl<'a> Stroke<'a> {
    pub fn new(points: &'a [Point], flow: f64) -> Self {
        Self { points, flow }
    }

    pub fn from_paths(paths: &'a [GeometricPath]) -> Vec<Stroke<'a>> {
        paths
            .iter()
            .map(|p| Stroke::new(&p.points, p.target_flow))
            .collect()
    }

    pub fn from_sub_paths(paths: &'a [RampedSubPath]) -> Vec<Stroke<'a>> {
        paths
            .iter()
            .map(|p| Stroke::new(&p.points, p.flow))
            .collect()
    }
}

/// Render `strokes` as a standalone SVG document
pub fn render_svg(strokes: &[Stroke<'_>]) -> String {
    let mut min = (i64::MAX, i64::MAX);
    let mut max = (i64::MIN, i64::MIN);
    for p in strokes.iter().flat_map(|s| s.points.iter()) {
        min = (min.0.min(p.x), min.1.min(-p.y));
        max = (max.0.max(p.x), max.1.max(-p.y));
    }
    if min.0 > max.0 {
        min = (0, 0);
        max = (0, 0);
    }

    let width = (max.0 - min.0).max(1) as f64;
    let height = (max.1 - min.1).max(1) as f64;
    let margin = (width.max(height) * 0.02).max(1.0);
    let stroke_width = (width.max(height) * 0.002).max(1.0);

    let (flow_low, flow_high) = strokes.iter().fold((f64::MAX, f64::MIN), |(lo, hi), s| {
        (lo.min(s.flow), hi.max(s.flow))
    });

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        min.0 as f64 - margin,
        min.1 as f64 - margin,
        width + 2.0 * margin,
        height + 2.0 * margin
    );

    for stroke in strokes.iter().filter(|s| !s.points.is_empty()) {
        let points = stroke
            .points
            .iter()
            .map(|p| format!("{},{}", p.x, -p.y))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            svg,
            r#"  <polyline points="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round"><title>flow {:.4}</title></polyline>"#,
            points,
            flow_colour(stroke.flow, flow_low, flow_high),
            stroke_width,
            stroke.flow
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn flow_colour(flow: f64, low: f64, high: f64) -> String {
    let t = if high > low {
        ((flow - low) / (high - low)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    // blue (240) for the lowest flow through to red (0) for the highest
    let hue = 240.0 * (1.0 - t);
    format!("hsl({:.0}, 90%, 45%)", hue)
}
