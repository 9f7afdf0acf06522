//! Chart layout
//!
//! Canvas geometry, scales and mark styling derived from `ChartConfig`.

use serde::Serialize;
use std::time::Duration;

use super::scale::{ColorScale, LinearScale};
use crate::config::ChartConfig;

/// Horizontal reference line across the middle of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
}

/// Everything the reconciler and renderer need to place marks
#[derive(Debug, Clone)]
pub struct Layout {
    /// Index to horizontal position
    pub x: LinearScale,
    /// Vowel fraction to vertical offset (inverted against `height`)
    pub y: LinearScale,
    /// Vowel fraction to fill color, only used when `color_marks` is set
    pub color: ColorScale,
    pub width: f64,
    pub height: f64,
    pub baseline: Baseline,
    pub radius: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub transition: Duration,
    pub color_marks: bool,
}

impl Layout {
    pub fn from_config(config: &ChartConfig) -> Self {
        let length = config.initial_length as f64;
        Self {
            x: LinearScale::new((0.0, 1.0), (0.0, config.width_unit)),
            y: LinearScale::new((-0.1, 1.1), (0.0, config.height)),
            color: ColorScale::diverging(),
            width: length - 1.0,
            height: config.height,
            baseline: Baseline {
                x1: 0.0,
                x2: config.width_unit * length,
                y: config.height / 2.0 - 0.5,
            },
            radius: config.radius,
            fill: config.fill.clone(),
            stroke: config.stroke.clone(),
            stroke_width: config.stroke_width,
            transition: Duration::from_millis(config.transition_ms),
            color_marks: config.color_marks,
        }
    }

    /// Horizontal position of slot `index`
    pub fn x_at(&self, index: f64) -> f64 {
        self.x.apply(index)
    }

    /// Vertical position of a vowel fraction; larger fractions draw higher
    pub fn cy(&self, fraction: f64) -> f64 {
        self.height - self.y.apply(fraction)
    }

    /// Fill for a mark with the given fraction
    pub fn fill_for(&self, fraction: f64) -> String {
        if self.color_marks {
            self.color.apply(fraction).to_string()
        } else {
            self.fill.clone()
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}
