//! Word scatter chart
//!
//! Retained-mode scene for the one-dimensional scatter plot.
//!
//! ## Architecture
//!
//! - **Scales**: linear position scales and the three-stop color scale
//! - **Layout**: canvas geometry and mark styling from `ChartConfig`
//! - **Scene**: marks keyed by record id, with running transitions
//! - **Reconcile**: enter/update/exit against a new snapshot
//! - **SVG**: renders the scene, in-flight motion as SMIL animations
//! - **ChartView**: snapshot + scene + layout, the unit the poller drives

mod layout;
mod reconcile;
mod scale;
mod scene;
mod svg;
mod view;

pub use layout::{Baseline, Layout};
pub use reconcile::{reconcile, MarkEntry, MarkMove, Patch};
pub use scale::{ColorScale, LinearScale, Rgb};
pub use scene::{ease_cubic_in_out, Mark, MarkState, Scene, Transition};
pub use svg::{escape, render_svg};
pub use view::{ChartView, MarkView};
