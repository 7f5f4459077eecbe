//! # Weave Core
//!
//! Core types for indirect substrate encoding: a small pattern-producing
//! network is queried with the coordinates of every candidate connection of a
//! much larger, spatially laid out substrate network.
//!
//! This crate provides the setup-time building blocks:
//! - **Geometry**: Layer sizes, custom neuron positions, axis ranges
//! - **Layout**: Which pattern-network input/output slot carries which signal
//! - **Translation**: Grid indices and unit coordinates to range space
//! - **Transform**: Raw network outputs to bounded substrate weights
//!
//! Everything here is computed once and immutable afterwards; the query
//! engine lives in `weave-transcribe`.

pub mod blueprint;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod space;
pub mod traits;
pub mod transform;
mod translate;

// Re-export main types at crate root
pub use blueprint::Blueprint;
pub use config::{CustomZSource, TranscriberConfig, ZCoordMode};
pub use error::{WeaveError, WeaveResult};
pub use geometry::SubstrateGeometry;
pub use layout::{InputSlots, OutputSlots, SignalFeatures, SignalLayout};
pub use space::{AxisRange, Point};
pub use traits::*;
pub use transform::{ranged_output, ResponseBounds, WeightBounds};
