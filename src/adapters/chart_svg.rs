//! SVG price/volume chart for the dashboard.

use std::fmt::Write;

use crate::domain::stats::ChartPoint;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 320.0;
const PADDING: f64 = 48.0;
/// Share of the plot height the volume bars may use.
const VOLUME_BAND: f64 = 0.35;

/// Close-price line over volume bars. Empty input yields an empty string.
pub fn price_volume_svg(points: &[ChartPoint]) -> String {
    if points.is_empty() {
        return String::new();
    }

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let baseline = HEIGHT - PADDING;

    // keep a margin around the price range, like a 0.1 axis padding
    let closes = || points.iter().filter_map(|p| p.close);
    let (min_close, max_close) = match closes().next() {
        Some(_) => (
            closes().fold(f64::INFINITY, f64::min) - 0.1,
            closes().fold(f64::NEG_INFINITY, f64::max) + 0.1,
        ),
        None => (-0.1, 0.1),
    };
    let price_range = max_close - min_close;
    let max_volume = points.iter().map(|p| p.volume).fold(0.0, f64::max);

    let slot = plot_width / points.len() as f64;
    let bar_width = (slot * 0.6).max(1.0);
    let x_at = |i: usize| PADDING + slot * (i as f64 + 0.5);
    let y_price = |close: f64| baseline - (close - min_close) / price_range * plot_height;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="price-volume-chart" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}" role="img" aria-label="Price and volume chart">"#
    );
    let _ = write!(
        svg,
        r#"<line class="axis" x1="{PADDING:.0}" y1="{baseline:.0}" x2="{:.0}" y2="{baseline:.0}"/>"#,
        WIDTH - PADDING
    );

    let _ = write!(svg, r#"<g class="volume">"#);
    for (i, point) in points.iter().enumerate() {
        let h = if max_volume > 0.0 {
            point.volume / max_volume * plot_height * VOLUME_BAND
        } else {
            0.0
        };
        let _ = write!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{bar_width:.1}" height="{h:.1}"><title>{} volume {:.0}</title></rect>"#,
            x_at(i) - bar_width / 2.0,
            baseline - h,
            escape(&point.date),
            point.volume
        );
    }
    svg.push_str("</g>");

    // points with no parseable close are skipped, the line joins its neighbours
    let priced = || {
        points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.close.map(|close| (i, p, close)))
    };
    let path: Vec<String> = priced()
        .map(|(i, _, close)| format!("{:.1},{:.1}", x_at(i), y_price(close)))
        .collect();
    if !path.is_empty() {
        let _ = write!(
            svg,
            r#"<polyline class="close" fill="none" points="{}"/>"#,
            path.join(" ")
        );
    }
    for (i, point, close) in priced() {
        let _ = write!(
            svg,
            r#"<circle class="close-dot" cx="{:.1}" cy="{:.1}" r="3"><title>{} close {close:.2}</title></circle>"#,
            x_at(i),
            y_price(close),
            escape(&point.date),
        );
    }

    let _ = write!(
        svg,
        r#"<text class="tick" x="{:.0}" y="{:.0}" text-anchor="end">{max_close:.2}</text>"#,
        PADDING - 6.0,
        PADDING + 4.0
    );
    let _ = write!(
        svg,
        r#"<text class="tick" x="{:.0}" y="{:.0}" text-anchor="end">{min_close:.2}</text>"#,
        PADDING - 6.0,
        baseline
    );

    let every = (points.len() / 8).max(1);
    for (i, point) in points.iter().enumerate().step_by(every) {
        let _ = write!(
            svg,
            r#"<text class="tick" x="{:.1}" y="{:.0}" text-anchor="middle">{}</text>"#,
            x_at(i),
            baseline + 18.0,
            escape(&point.label)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
