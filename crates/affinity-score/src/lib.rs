//! Pairwise compatibility scoring.
//!
//! A pair first passes the hard deal-breaker gate, then every factor both
//! profiles can be compared on is scored, weighted, averaged and shaped into
//! a final score in `[0, 1]`.

pub mod aggregate;
pub mod engine;
pub mod gate;
pub mod height;
pub mod personality;
pub mod shaper;
pub mod similarity;
pub mod weights;

pub use aggregate::{aggregate, Aggregate};
pub use engine::CompatibilityEngine;
pub use gate::{evaluate_hard_filters, GateResult};
pub use personality::{combine_traits, infer_traits};
pub use shaper::shape;
pub use similarity::{hybrid, jaccard, numeric_proximity};
pub use weights::{WeightTable, WEIGHTS};
