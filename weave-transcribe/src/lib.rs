//! # Weave Transcribe
//!
//! Query engine for indirect substrate encoding.
//!
//! This crate provides:
//! - **QuerySession**: One genotype's pattern network plus its reusable
//!   input/output vectors; one network activation per query
//! - **QueryOutputs**: Typed, read-only view over the latest query's outputs
//! - **Transcriber**: Shared blueprint, per-genotype sessions, resizing and
//!   parallel population transcription via Rayon
//!
//! ## Usage
//!
//! ```no_run
//! use weave_core::{NoDimensions, TranscriberConfig};
//! use weave_transcribe::Transcriber;
//! # use weave_core::{FnNetwork, PatternNetworkProvider, WeaveResult};
//! # struct Provider;
//! # fn zero(_: &[f64], o: &mut [f64]) { o.fill(0.0) }
//! # impl PatternNetworkProvider<()> for Provider {
//! #     type Network = FnNetwork<fn(&[f64], &mut [f64])>;
//! #     fn transcribe(&self, _: &()) -> WeaveResult<Self::Network> {
//! #         Ok(FnNetwork::new(5, 2, zero as fn(&[f64], &mut [f64])))
//! #     }
//! # }
//! # fn main() -> WeaveResult<()> {
//! let config = TranscriberConfig {
//!     depth: 3,
//!     layer_width: Some("4,4,1".into()),
//!     layer_height: Some("4,4,1".into()),
//!     ..TranscriberConfig::default()
//! };
//! let transcriber = Transcriber::new(&config, &NoDimensions, Provider)?;
//!
//! let mut session = transcriber.session(&())?;
//! session.query_grid((0, 0, 0), (1, 1, 1))?;
//! let weight = session.outputs()?.expressed_weight_at(0)?;
//! # let _ = weight;
//! # Ok(())
//! # }
//! ```

pub mod session;
pub mod transcriber;

pub use session::{Placement, QueryOutputs, QuerySession};
pub use transcriber::Transcriber;
