//! SVG rendering
//!
//! Renders the scene at a given instant. Transitions still in flight are
//! emitted as SMIL `<animate>` elements covering the remaining time, so a
//! browser plays the rest of the motion on its own.

use std::fmt::Write;
use std::time::Instant;

use super::layout::Layout;
use super::scene::{Mark, Scene};

/// Cubic in-out approximated as a cubic bezier
const CUBIC_IN_OUT_SPLINE: &str = "0.645 0.045 0.355 1";

/// Render the whole canvas
pub fn render_svg(scene: &Scene, layout: &Layout, now: Instant) -> String {
    let mut s = String::new();
    let _ = write!(
        s,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" class=\"chart\" width=\"{}\" height=\"{}\">",
        num(layout.width),
        num(layout.height)
    );

    // Marks sit beneath the baseline
    for mark in scene.marks() {
        if mark.is_expired(now) {
            continue;
        }
        render_mark(&mut s, mark, now);
    }

    let _ = write!(
        s,
        "<line x1=\"{}\" x2=\"{}\" y1=\"{}\" y2=\"{}\" style=\"stroke: #000\"/>",
        num(layout.baseline.x1),
        num(layout.baseline.x2),
        num(layout.baseline.y),
        num(layout.baseline.y)
    );
    s.push_str("</svg>");
    s
}

fn render_mark(s: &mut String, mark: &Mark, now: Instant) {
    let cx = mark.cx_at(now);
    let _ = write!(
        s,
        "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" style=\"fill: {}; stroke: {}; stroke-width: {}\">",
        num(cx),
        num(mark.cy),
        num(mark.radius),
        escape(&mark.fill),
        escape(&mark.stroke),
        num(mark.stroke_width)
    );
    let _ = write!(s, "<title>{}</title>", escape(&mark.title));

    if let Some(transition) = mark.transition().filter(|t| !t.is_finished(now)) {
        let remaining = transition.remaining(now);
        let _ = write!(
            s,
            "<animate attributeName=\"cx\" from=\"{}\" to=\"{}\" dur=\"{}ms\" calcMode=\"spline\" keyTimes=\"0;1\" keySplines=\"{}\" fill=\"freeze\"/>",
            num(cx),
            num(transition.to),
            remaining.as_millis(),
            CUBIC_IN_OUT_SPLINE
        );
    }

    s.push_str("</circle>");
}

/// Compact number formatting: at most three decimals, no trailing zeros
fn num(v: f64) -> String {
    if !v.is_finite() {
        return "NaN".to_string();
    }
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Escape text for XML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
