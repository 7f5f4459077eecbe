//! # Traits - Collaborator Interfaces
//!
//! The transcriber treats the pattern network and whoever sizes the
//! substrate as black boxes behind these traits.
//!
//! ## Key Traits
//!
//! - `PatternNetwork`: One transcribed genotype, queried per coordinate pair
//! - `PatternNetworkProvider`: Turns a genotype into a `PatternNetwork`
//! - `DimensionProvider`: Supplies layer sizes/positions left open by config

use crate::error::{WeaveError, WeaveResult};
use crate::space::Point;

/// An activatable pattern-producing network
///
/// One instance belongs to one transcription pass and is never shared.
pub trait PatternNetwork {
    /// Smallest value any output can take
    fn min_response(&self) -> f64;

    /// Largest value any output can take
    fn max_response(&self) -> f64;

    /// Number of inputs the network expects
    fn input_count(&self) -> usize;

    /// Number of outputs the network produces
    fn output_count(&self) -> usize;

    /// Clear any internal activation state before a fresh query
    fn reset(&mut self) {}

    /// Activate once; `outputs` has exactly `output_count()` entries
    fn activate(&mut self, inputs: &[f64], outputs: &mut [f64]) -> WeaveResult<()>;
}

/// Builds pattern networks from genotypes
pub trait PatternNetworkProvider<G: ?Sized>: Send + Sync {
    type Network: PatternNetwork;

    /// Transcribe one genotype into a queryable network
    fn transcribe(&self, genotype: &G) -> WeaveResult<Self::Network>;
}

/// Supplies layer geometry that configuration leaves unresolved
///
/// Typically implemented by the task/fitness side, which knows the shape of
/// its sensor and actuator layers.
pub trait DimensionProvider {
    /// `(width, height)` of a layer, if this provider defines it
    fn layer_dimensions(&self, _layer: usize, _depth: usize) -> Option<(usize, usize)> {
        None
    }

    /// Unit-space positions of a layer's neurons in row-major order
    fn neuron_positions(&self, _layer: usize, _depth: usize) -> Option<Vec<Point>> {
        None
    }
}

/// Provider that defines nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDimensions;

impl DimensionProvider for NoDimensions {}

/// Pattern network backed by a plain function
///
/// Handy for hand-designed connectivity patterns and for tests.
pub struct FnNetwork<F> {
    func: F,
    inputs: usize,
    outputs: usize,
    min_response: f64,
    max_response: f64,
}

impl<F> FnNetwork<F>
where
    F: FnMut(&[f64], &mut [f64]),
{
    /// Create a network with `[-1, 1]` response bounds
    pub fn new(inputs: usize, outputs: usize, func: F) -> Self {
        Self {
            func,
            inputs,
            outputs,
            min_response: -1.0,
            max_response: 1.0,
        }
    }

    /// Override the declared response bounds
    pub fn with_bounds(mut self, min_response: f64, max_response: f64) -> Self {
        self.min_response = min_response;
        self.max_response = max_response;
        self
    }
}

impl<F> PatternNetwork for FnNetwork<F>
where
    F: FnMut(&[f64], &mut [f64]),
{
    fn min_response(&self) -> f64 {
        self.min_response
    }

    fn max_response(&self) -> f64 {
        self.max_response
    }

    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        self.outputs
    }

    fn activate(&mut self, inputs: &[f64], outputs: &mut [f64]) -> WeaveResult<()> {
        if inputs.len() != self.inputs || outputs.len() != self.outputs {
            return Err(WeaveError::transcription(format!(
                "network expects {}/{} inputs/outputs, got {}/{}",
                self.inputs,
                self.outputs,
                inputs.len(),
                outputs.len()
            )));
        }
        (self.func)(inputs, outputs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_network_activate() {
        let mut net = FnNetwork::new(2, 1, |i: &[f64], o: &mut [f64]| o[0] = i[0] + i[1]);
        let mut out = [0.0];
        net.activate(&[0.25, 0.5], &mut out).unwrap();
        assert_eq!(out[0], 0.75);
        assert_eq!(net.min_response(), -1.0);
    }

    #[test]
    fn test_fn_network_shape_mismatch() {
        let mut net = FnNetwork::new(2, 1, |_: &[f64], _: &mut [f64]| {}).with_bounds(0.0, 1.0);
        let mut out = [0.0; 2];
        assert!(net.activate(&[0.0, 0.0], &mut out).is_err());
        assert_eq!(net.max_response(), 1.0);
    }

    #[test]
    fn test_no_dimensions() {
        assert_eq!(NoDimensions.layer_dimensions(0, 3), None);
        assert!(NoDimensions.neuron_positions(0, 3).is_none());
    }
}
