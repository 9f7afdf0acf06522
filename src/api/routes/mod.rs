//! API Routes
//!
//! Route handlers organized by functionality.

pub mod chart;
pub mod feed;
pub mod health;
