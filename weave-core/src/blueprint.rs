//! # Blueprint - Resolved Transcriber Setup
//!
//! Everything computed once per configuration: geometry, signal layout and
//! weight bounds. A blueprint is immutable and can be shared read-only by any
//! number of concurrent transcription passes.

use serde::{Deserialize, Serialize};

use crate::config::{CustomZSource, TranscriberConfig};
use crate::error::WeaveResult;
use crate::geometry::SubstrateGeometry;
use crate::layout::SignalLayout;
use crate::traits::DimensionProvider;
use crate::transform::WeightBounds;

/// Immutable, fully resolved transcriber setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub geometry: SubstrateGeometry,
    pub layout: SignalLayout,
    pub weights: WeightBounds,
    pub cycles_per_step: u32,
    pub custom_position_z: CustomZSource,
    pub feed_forward: bool,
}

impl Blueprint {
    /// Resolve geometry and allocate signal slots
    ///
    /// Any configuration error aborts setup; no partial blueprint exists.
    pub fn from_config(config: &TranscriberConfig, provider: &dyn DimensionProvider) -> WeaveResult<Self> {
        let weights = WeightBounds::new(
            config.weight_min(),
            config.connection_weight_max,
            config.connection_expression_threshold,
        );

        if config.enable_leo && config.connection_expression_threshold != 0.0 {
            tracing::warn!(
                "LEO is enabled but the connection expression threshold is {}. A threshold of 0 is recommended with LEO.",
                config.connection_expression_threshold
            );
        }
        if !weights.threshold_is_safe() {
            tracing::warn!(
                "Connection expression threshold {} is not below both max weight {} and -min weight {}",
                weights.threshold,
                weights.max,
                -weights.min
            );
        }

        let geometry = SubstrateGeometry::resolve(config, provider)?;
        let layout = SignalLayout::allocate(&config.features());

        tracing::info!(
            "Pattern network input/output size: {}/{}",
            layout.input_count,
            layout.output_count
        );

        Ok(Self {
            geometry,
            layout,
            weights,
            cycles_per_step: config.cycles_per_step(),
            custom_position_z: config.custom_position_z,
            feed_forward: config.feed_forward,
        })
    }

    /// Same blueprint on resized layers
    pub fn resized(
        &self,
        width: Vec<usize>,
        height: Vec<usize>,
        connection_range: Option<usize>,
    ) -> WeaveResult<Self> {
        Ok(Self {
            geometry: self.geometry.resized(width, height, connection_range)?,
            ..self.clone()
        })
    }

    /// Inputs the pattern network must accept
    pub fn input_count(&self) -> usize {
        self.layout.input_count
    }

    /// Outputs the pattern network must produce
    pub fn output_count(&self) -> usize {
        self.layout.output_count
    }
}
