//! Scales
//!
//! Deterministic numeric mappings used for layout:
//! - `LinearScale`: continuous domain to continuous range
//! - `ColorScale`: piecewise-linear map from numbers to RGB colors

use serde::Serialize;
use std::fmt;

/// Linear map from `domain` to `range`, without clamping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Map a domain value into the range
    ///
    /// A zero-width domain maps everything to the start of the range.
    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return r0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }
}

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Resolve a CSS color keyword or `#rrggbb` / `#rgb` literal
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(hex) = name.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let rgb = match name.to_ascii_lowercase().as_str() {
            "black" => Self::new(0, 0, 0),
            "white" => Self::new(255, 255, 255),
            "green" => Self::new(0, 128, 0),
            "red" => Self::new(255, 0, 0),
            "blue" => Self::new(0, 0, 255),
            "darkred" => Self::new(139, 0, 0),
            "lightgray" | "lightgrey" => Self::new(211, 211, 211),
            "gray" | "grey" => Self::new(128, 128, 128),
            "steelblue" => Self::new(70, 130, 180),
            "orange" => Self::new(255, 165, 0),
            _ => return None,
        };
        Some(rgb)
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Some(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Piecewise-linear color scale with two or more stops
///
/// Values outside the domain extrapolate from the nearest segment; each
/// channel is clamped to `0..=255` and rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    stops: Vec<(f64, Rgb)>,
}

impl ColorScale {
    /// Build from parallel domain and range lists
    ///
    /// Returns `None` unless both lists have the same length of at least two.
    pub fn new(domain: &[f64], range: &[Rgb]) -> Option<Self> {
        if domain.len() < 2 || domain.len() != range.len() {
            return None;
        }
        Some(Self {
            stops: domain.iter().copied().zip(range.iter().copied()).collect(),
        })
    }

    /// The `[0, 0.5, 1] -> [darkred, lightgray, steelblue]` diverging scale
    pub fn diverging() -> Self {
        Self {
            stops: vec![
                (0.0, Rgb::new(139, 0, 0)),
                (0.5, Rgb::new(211, 211, 211)),
                (1.0, Rgb::new(70, 130, 180)),
            ],
        }
    }

    pub fn apply(&self, value: f64) -> Rgb {
        // Segment whose upper stop is the first stop above the value,
        // falling back to the first/last segment outside the domain.
        let last = self.stops.len() - 1;
        let upper = self
            .stops
            .iter()
            .position(|(stop, _)| value < *stop)
            .unwrap_or(last)
            .clamp(1, last);
        let (d0, c0) = self.stops[upper - 1];
        let (d1, c1) = self.stops[upper];

        let t = if d1 == d0 { 0.0 } else { (value - d0) / (d1 - d0) };
        let mix = |a: u8, b: u8| {
            let v = a as f64 + (b as f64 - a as f64) * t;
            if v.is_nan() {
                0
            } else {
                v.round().clamp(0.0, 255.0) as u8
            }
        };

        Rgb::new(mix(c0.r, c1.r), mix(c0.g, c1.g), mix(c0.b, c1.b))
    }
}
