//! # Query Session
//!
//! One transcription pass over one genotype. The session owns the pattern
//! network plus a reusable input and output vector; coordinate setters write
//! straight into the input slots and every `query` activates the network
//! exactly once.
//!
//! ## Hot Path
//!
//! ```text
//! set_source_* ─┐
//!               ├─> query() ─> deltas/angle ─> reset + activate ─> outputs()
//! set_target_* ─┘
//! ```
//!
//! Nothing geometric is recomputed per query; all slots come from the shared
//! blueprint.

use std::f64::consts::PI;
use std::sync::Arc;

use weave_core::{
    ranged_output, Blueprint, PatternNetwork, Point, ResponseBounds, SignalLayout, WeaveError,
    WeaveResult, WeightBounds,
};

/// Coordinates currently written into the input vector for one endpoint
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// `None` when the layout has no z slot for this endpoint
    pub z: Option<f64>,
}

/// Query session for one genotype
pub struct QuerySession<N> {
    network: N,
    blueprint: Arc<Blueprint>,
    inputs: Vec<f64>,
    outputs: Vec<f64>,
    bounds: ResponseBounds,
    queried: bool,
}

impl<N: PatternNetwork> QuerySession<N> {
    /// Wrap a freshly transcribed network
    ///
    /// The network's shape must match the blueprint's signal layout.
    pub fn new(network: N, blueprint: Arc<Blueprint>) -> WeaveResult<Self> {
        let layout = &blueprint.layout;
        if network.input_count() != layout.input_count || network.output_count() != layout.output_count {
            return Err(WeaveError::transcription(format!(
                "pattern network has {}/{} inputs/outputs but the layout needs {}/{}",
                network.input_count(),
                network.output_count(),
                layout.input_count,
                layout.output_count
            )));
        }

        let mut inputs = vec![0.0; layout.input_count];
        inputs[layout.inputs.bias] = 1.0;
        let outputs = vec![0.0; layout.output_count];
        let bounds = ResponseBounds::classify(network.min_response(), network.max_response());

        Ok(Self {
            network,
            blueprint,
            inputs,
            outputs,
            bounds,
            queried: false,
        })
    }

    /// Blueprint this session was created from
    pub fn blueprint(&self) -> &Arc<Blueprint> {
        &self.blueprint
    }

    /// Signal layout of this session
    pub fn layout(&self) -> &SignalLayout {
        &self.blueprint.layout
    }

    /// Response bounds captured at creation
    pub fn response_bounds(&self) -> ResponseBounds {
        self.bounds
    }

    /// Current input vector
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// Give the network back, e.g. to cache it with its genotype
    pub fn into_network(self) -> N {
        self.network
    }

    // === Source coordinates ===

    /// Set source coordinates on a 2D substrate, unit space
    #[inline]
    pub fn set_source(&mut self, x: f64, y: f64) {
        let geometry = &self.blueprint.geometry;
        let slots = &self.blueprint.layout.inputs;
        self.inputs[slots.source_x] = geometry.range_x.translate_from_unit(x);
        self.inputs[slots.source_y] = geometry.range_y.translate_from_unit(y);
    }

    /// Set source coordinates, unit space; z is dropped if the layout has no slot
    #[inline]
    pub fn set_source_3d(&mut self, x: f64, y: f64, z: f64) {
        let p = self.blueprint.geometry.translate_unit(x, y, z);
        self.write_source(p);
    }

    /// Set source coordinates from a unit-space point
    #[inline]
    pub fn set_source_point(&mut self, p: Point) {
        self.set_source_3d(p.x, p.y, p.z);
    }

    /// Set source coordinates from grid indices, honouring custom positions
    #[inline]
    pub fn set_source_grid(&mut self, x: usize, y: usize, layer: usize) -> WeaveResult<()> {
        let p = self
            .blueprint
            .geometry
            .grid_position(x, y, layer, self.blueprint.custom_position_z)?;
        self.write_source(p);
        Ok(())
    }

    /// Source coordinates currently in the input vector, range space
    pub fn source(&self) -> Placement {
        let slots = &self.blueprint.layout.inputs;
        Placement {
            x: self.inputs[slots.source_x],
            y: self.inputs[slots.source_y],
            z: slots.source_z.map(|i| self.inputs[i]),
        }
    }

    // === Target coordinates ===

    /// Set target coordinates on a 2D substrate, unit space
    #[inline]
    pub fn set_target(&mut self, x: f64, y: f64) {
        let geometry = &self.blueprint.geometry;
        let slots = &self.blueprint.layout.inputs;
        self.inputs[slots.target_x] = geometry.range_x.translate_from_unit(x);
        self.inputs[slots.target_y] = geometry.range_y.translate_from_unit(y);
    }

    /// Set target coordinates, unit space; z is dropped if the layout has no slot
    #[inline]
    pub fn set_target_3d(&mut self, x: f64, y: f64, z: f64) {
        let p = self.blueprint.geometry.translate_unit(x, y, z);
        self.write_target(p);
    }

    /// Set target coordinates from a unit-space point
    #[inline]
    pub fn set_target_point(&mut self, p: Point) {
        self.set_target_3d(p.x, p.y, p.z);
    }

    /// Set target coordinates from grid indices, honouring custom positions
    #[inline]
    pub fn set_target_grid(&mut self, x: usize, y: usize, layer: usize) -> WeaveResult<()> {
        let p = self
            .blueprint
            .geometry
            .grid_position(x, y, layer, self.blueprint.custom_position_z)?;
        self.write_target(p);
        Ok(())
    }

    /// Target coordinates currently in the input vector, range space
    pub fn target(&self) -> Placement {
        let slots = &self.blueprint.layout.inputs;
        Placement {
            x: self.inputs[slots.target_x],
            y: self.inputs[slots.target_y],
            z: slots.target_z.map(|i| self.inputs[i]),
        }
    }

    #[inline]
    fn write_source(&mut self, p: Point) {
        let slots = &self.blueprint.layout.inputs;
        self.inputs[slots.source_x] = p.x;
        self.inputs[slots.source_y] = p.y;
        if let Some(i) = slots.source_z {
            self.inputs[i] = p.z;
        }
    }

    #[inline]
    fn write_target(&mut self, p: Point) {
        let slots = &self.blueprint.layout.inputs;
        self.inputs[slots.target_x] = p.x;
        self.inputs[slots.target_y] = p.y;
        if let Some(i) = slots.target_z {
            self.inputs[i] = p.z;
        }
    }

    // === Queries ===

    /// Activate the pattern network once on the current coordinates
    ///
    /// Returns the (first) weight output; everything else is available via
    /// [`QuerySession::outputs`].
    pub fn query(&mut self) -> WeaveResult<f64> {
        let layout = &self.blueprint.layout;
        let slots = &layout.inputs;
        let input = &mut self.inputs;

        if layout.include_delta {
            if let (Some(dx), Some(dy)) = (slots.delta_x, slots.delta_y) {
                input[dx] = input[slots.source_x] - input[slots.target_x];
                input[dy] = input[slots.source_y] - input[slots.target_y];
            }
            if let (Some(dz), Some(sz), Some(tz)) = (slots.delta_z, slots.source_z, slots.target_z) {
                input[dz] = input[sz] - input[tz];
            }
        }
        if let Some(an) = slots.angle {
            let mut angle = (input[slots.source_y] - input[slots.target_y])
                .atan2(input[slots.source_x] - input[slots.target_x]);
            angle /= 2.0 * PI;
            if angle < 0.0 {
                angle += 1.0;
            }
            input[an] = angle;
        }

        // A failed activation may leave outputs half written
        self.queried = false;
        self.network.reset();
        self.network.activate(&self.inputs, &mut self.outputs)?;
        self.queried = true;

        // Weight category is always allocated
        Ok(self.outputs[layout.weight.first().unwrap_or(0)])
    }

    /// Query with 2D unit coordinates
    pub fn query_2d(&mut self, sx: f64, sy: f64, tx: f64, ty: f64) -> WeaveResult<f64> {
        self.set_source(sx, sy);
        self.set_target(tx, ty);
        self.query()
    }

    /// Query with 3D unit coordinates
    pub fn query_3d(&mut self, sx: f64, sy: f64, sz: f64, tx: f64, ty: f64, tz: f64) -> WeaveResult<f64> {
        self.set_source_3d(sx, sy, sz);
        self.set_target_3d(tx, ty, tz);
        self.query()
    }

    /// Query with two unit-space points
    pub fn query_points(&mut self, source: Point, target: Point) -> WeaveResult<f64> {
        self.set_source_point(source);
        self.set_target_point(target);
        self.query()
    }

    /// Query with grid indices `(x, y, layer)` for both endpoints
    pub fn query_grid(
        &mut self,
        (sx, sy, sl): (usize, usize, usize),
        (tx, ty, tl): (usize, usize, usize),
    ) -> WeaveResult<f64> {
        self.set_source_grid(sx, sy, sl)?;
        self.set_target_grid(tx, ty, tl)?;
        self.query()
    }

    /// Typed view over the most recent query's outputs
    pub fn outputs(&self) -> WeaveResult<QueryOutputs<'_>> {
        if !self.queried {
            return Err(WeaveError::contract("outputs read before the first query"));
        }
        Ok(QueryOutputs {
            values: &self.outputs,
            layout: &self.blueprint.layout,
            weights: &self.blueprint.weights,
            bounds: self.bounds,
        })
    }
}

/// Read-only view of one query's outputs
#[derive(Clone, Copy, Debug)]
pub struct QueryOutputs<'a> {
    values: &'a [f64],
    layout: &'a SignalLayout,
    weights: &'a WeightBounds,
    bounds: ResponseBounds,
}

impl<'a> QueryOutputs<'a> {
    /// All raw outputs
    pub fn raw(&self) -> &'a [f64] {
        self.values
    }

    /// Raw output at `index`
    pub fn output(&self, index: usize) -> WeaveResult<f64> {
        self.values.get(index).copied().ok_or_else(|| {
            WeaveError::contract(format!(
                "output {index} requested but the network has {}",
                self.values.len()
            ))
        })
    }

    /// Output at `index` scaled into `[min_value, max_value]`, see [`ranged_output`]
    pub fn ranged_output(
        &self,
        index: usize,
        min_value: f64,
        max_value: f64,
        value_range: f64,
        threshold: f64,
    ) -> WeaveResult<f64> {
        let raw = self.output(index)?;
        Ok(ranged_output(raw, self.bounds, min_value, max_value, value_range, threshold))
    }

    // === Weight ===

    /// (First) weight output
    pub fn weight(&self) -> f64 {
        self.values[self.layout.weight.first().unwrap_or(0)]
    }

    /// Weight output for the transition out of `source_layer`
    pub fn weight_at(&self, source_layer: usize) -> WeaveResult<f64> {
        Ok(self.values[self.layout.weight.for_layer(source_layer, "weight")?])
    }

    /// Ranged (first) weight
    pub fn ranged_weight(&self, min_value: f64, max_value: f64, value_range: f64, threshold: f64) -> f64 {
        ranged_output(self.weight(), self.bounds, min_value, max_value, value_range, threshold)
    }

    /// Ranged weight for the transition out of `source_layer`
    pub fn ranged_weight_at(
        &self,
        source_layer: usize,
        min_value: f64,
        max_value: f64,
        value_range: f64,
        threshold: f64,
    ) -> WeaveResult<f64> {
        let raw = self.weight_at(source_layer)?;
        Ok(ranged_output(raw, self.bounds, min_value, max_value, value_range, threshold))
    }

    /// (First) weight with the configured bounds and expression threshold
    pub fn expressed_weight(&self) -> f64 {
        self.weights.apply(self.weight(), self.bounds)
    }

    /// Per-layer weight with the configured bounds and expression threshold
    pub fn expressed_weight_at(&self, source_layer: usize) -> WeaveResult<f64> {
        Ok(self.weights.apply(self.weight_at(source_layer)?, self.bounds))
    }

    // === Bias ===

    /// (First) bias weight output
    pub fn bias_weight(&self) -> WeaveResult<f64> {
        self.layout
            .bias
            .first()
            .map(|i| self.values[i])
            .ok_or_else(|| WeaveError::contract("bias output is not enabled"))
    }

    /// Bias weight output for the transition out of `source_layer`
    pub fn bias_weight_at(&self, source_layer: usize) -> WeaveResult<f64> {
        Ok(self.values[self.layout.bias.for_layer(source_layer, "bias")?])
    }

    /// Ranged (first) bias weight
    pub fn ranged_bias_weight(
        &self,
        min_value: f64,
        max_value: f64,
        value_range: f64,
        threshold: f64,
    ) -> WeaveResult<f64> {
        let raw = self.bias_weight()?;
        Ok(ranged_output(raw, self.bounds, min_value, max_value, value_range, threshold))
    }

    /// Ranged bias weight for the transition out of `source_layer`
    pub fn ranged_bias_weight_at(
        &self,
        source_layer: usize,
        min_value: f64,
        max_value: f64,
        value_range: f64,
        threshold: f64,
    ) -> WeaveResult<f64> {
        let raw = self.bias_weight_at(source_layer)?;
        Ok(ranged_output(raw, self.bounds, min_value, max_value, value_range, threshold))
    }

    /// (First) bias weight with the configured bounds and expression threshold
    pub fn expressed_bias_weight(&self) -> WeaveResult<f64> {
        Ok(self.weights.apply(self.bias_weight()?, self.bounds))
    }

    /// Per-layer bias weight with the configured bounds and expression threshold
    pub fn expressed_bias_weight_at(&self, source_layer: usize) -> WeaveResult<f64> {
        Ok(self.weights.apply(self.bias_weight_at(source_layer)?, self.bounds))
    }

    // === Link expression ===

    /// (First) link expression output
    pub fn leo(&self) -> WeaveResult<f64> {
        self.layout
            .leo
            .first()
            .map(|i| self.values[i])
            .ok_or_else(|| WeaveError::contract("link expression output is not enabled"))
    }

    /// Link expression output for the transition out of `source_layer`
    pub fn leo_at(&self, source_layer: usize) -> WeaveResult<f64> {
        Ok(self.values[self.layout.leo.for_layer(source_layer, "link expression")?])
    }
}
