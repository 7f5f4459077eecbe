//! # Geometry - Substrate Layer Resolution
//!
//! Resolves the concrete size of every substrate layer and any custom neuron
//! positions, once, at setup. Sizes come from configuration; layers marked
//! as externally determined are sized by a [`DimensionProvider`].
//!
//! Position tables, when present, are stored in range space and must list
//! exactly `width * height` neurons in row-major order.

use serde::{Deserialize, Serialize};

use crate::config::{parse_layer_sizes, parse_positions, TranscriberConfig};
use crate::error::{WeaveError, WeaveResult};
use crate::space::{AxisRange, Point};
use crate::traits::DimensionProvider;

/// Resolved substrate geometry, immutable after setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubstrateGeometry {
    depth: usize,
    width: Vec<usize>,
    height: Vec<usize>,
    pub range_x: AxisRange,
    pub range_y: AxisRange,
    pub range_z: AxisRange,
    /// Per-layer custom positions, `None` for regular grid layout
    positions: Vec<Option<Vec<Point>>>,
    connection_range: Option<usize>,
}

impl SubstrateGeometry {
    /// Resolve geometry from configuration and an external provider
    pub fn resolve(config: &TranscriberConfig, provider: &dyn DimensionProvider) -> WeaveResult<Self> {
        let depth = config.depth;
        if depth == 0 {
            return Err(WeaveError::config("substrate depth must be at least 1"));
        }

        let declared_width = parse_layer_sizes(config.layer_width.as_deref(), depth, "layer_width")?;
        let declared_height = parse_layer_sizes(config.layer_height.as_deref(), depth, "layer_height")?;

        let mut width = Vec::with_capacity(depth);
        let mut height = Vec::with_capacity(depth);
        for layer in 0..depth {
            let (w, h) = match (declared_width[layer], declared_height[layer]) {
                (Some(w), Some(h)) => (w, h),
                (w, h) => {
                    let (pw, ph) = provider
                        .layer_dimensions(layer, depth)
                        .ok_or(WeaveError::UndeterminedLayer(layer))?;
                    let resolved = (w.unwrap_or(pw), h.unwrap_or(ph));
                    if resolved.0 == 0 || resolved.1 == 0 {
                        return Err(WeaveError::config(format!(
                            "dimension provider gave empty layer {layer}: {}x{}",
                            resolved.0, resolved.1
                        )));
                    }
                    tracing::info!(
                        "Dimension provider defines layer {}: {}x{}",
                        layer,
                        resolved.0,
                        resolved.1
                    );
                    resolved
                }
            };
            width.push(w);
            height.push(h);
        }

        let (rx, ry, rz) = (config.range_x, config.range_y, config.range_z);
        let mut positions = Vec::with_capacity(depth);
        for layer in 0..depth {
            let expected = width[layer] * height[layer];

            let table = if let Some(list) = config.layer_positions.get(&layer) {
                let default = Point::new(0.0, 0.0, Self::unit_layer_z(layer, depth))
                    .translated_from_unit(&rx, &ry, &rz);
                let table = parse_positions(list, default)?;
                check_position_count(layer, expected, table.len(), "configuration")?;
                Some(table)
            } else if let Some(unit_table) = provider.neuron_positions(layer, depth) {
                check_position_count(layer, expected, unit_table.len(), "dimension provider")?;
                let table: Vec<Point> = unit_table
                    .into_iter()
                    .map(|p| p.translated_from_unit(&rx, &ry, &rz))
                    .collect();
                tracing::info!(
                    "Dimension provider defines neuron positions for layer {}: {:?}",
                    layer,
                    table
                );
                Some(table)
            } else {
                None
            };
            positions.push(table);
        }

        if let Some(extra) = config.layer_positions.keys().find(|&&layer| layer >= depth) {
            tracing::warn!("Ignoring neuron positions for layer {} beyond depth {}", extra, depth);
        }

        Ok(Self {
            depth,
            width,
            height,
            range_x: rx,
            range_y: ry,
            range_z: rz,
            positions,
            connection_range: config.connection_range(),
        })
    }

    /// Unit z coordinate of a layer
    #[inline]
    pub fn unit_layer_z(layer: usize, depth: usize) -> f64 {
        if depth > 1 {
            layer as f64 / (depth - 1) as f64
        } else {
            0.0
        }
    }

    /// Copy of this geometry with new layer sizes
    ///
    /// Fails if a layer with a custom position table changes neuron count.
    pub fn resized(
        &self,
        width: Vec<usize>,
        height: Vec<usize>,
        connection_range: Option<usize>,
    ) -> WeaveResult<Self> {
        if width.len() != self.depth {
            return Err(WeaveError::LayerCount {
                key: "layer_width",
                actual: width.len(),
                depth: self.depth,
            });
        }
        if height.len() != self.depth {
            return Err(WeaveError::LayerCount {
                key: "layer_height",
                actual: height.len(),
                depth: self.depth,
            });
        }
        if let Some(layer) = (0..self.depth).find(|&l| width[l] == 0 || height[l] == 0) {
            return Err(WeaveError::config(format!("resize leaves layer {layer} empty")));
        }
        for (layer, table) in self.positions.iter().enumerate() {
            if let Some(table) = table {
                check_position_count(layer, width[layer] * height[layer], table.len(), "configuration")?;
            }
        }

        Ok(Self {
            width,
            height,
            connection_range,
            ..self.clone()
        })
    }

    /// Number of layers
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Width of every layer
    pub fn width(&self) -> &[usize] {
        &self.width
    }

    /// Height of every layer
    pub fn height(&self) -> &[usize] {
        &self.height
    }

    /// Fail with a contract error unless `layer` exists
    #[inline]
    pub fn check_layer(&self, layer: usize) -> WeaveResult<()> {
        if layer < self.depth {
            Ok(())
        } else {
            Err(WeaveError::contract(format!(
                "layer index {layer} out of range for depth {}",
                self.depth
            )))
        }
    }

    /// Neurons in a layer
    pub fn neuron_count(&self, layer: usize) -> WeaveResult<usize> {
        self.check_layer(layer)?;
        Ok(self.width[layer] * self.height[layer])
    }

    /// Neurons in the whole substrate
    pub fn total_neurons(&self) -> usize {
        self.width.iter().zip(&self.height).map(|(w, h)| w * h).sum()
    }

    /// Custom position table of a layer, in range space
    pub fn positions(&self, layer: usize) -> Option<&[Point]> {
        self.positions.get(layer).and_then(|t| t.as_deref())
    }

    /// Incoming connection limit in grid cells, `None` when unlimited
    pub fn connection_range(&self) -> Option<usize> {
        self.connection_range
    }

    /// Whether the grid cell `(sx, sy)` of `source_layer` lies within the
    /// connection range of `(tx, ty)` in `target_layer`
    ///
    /// Source indices are rescaled onto the target layer's grid when the two
    /// layers differ in size.
    pub fn within_connection_range(
        &self,
        (sx, sy, source_layer): (usize, usize, usize),
        (tx, ty, target_layer): (usize, usize, usize),
    ) -> WeaveResult<bool> {
        self.check_layer(source_layer)?;
        self.check_layer(target_layer)?;
        let Some(range) = self.connection_range else {
            return Ok(true);
        };
        let rescale = |i: usize, from: usize, to: usize| -> f64 {
            if from == to || from <= 1 {
                i as f64
            } else {
                i as f64 * (to - 1) as f64 / (from - 1) as f64
            }
        };
        let sx = rescale(sx, self.width[source_layer], self.width[target_layer]);
        let sy = rescale(sy, self.height[source_layer], self.height[target_layer]);
        Ok((sx - tx as f64).abs().round() as usize <= range
            && (sy - ty as f64).abs().round() as usize <= range)
    }
}

fn check_position_count(
    layer: usize,
    expected: usize,
    actual: usize,
    source_name: &'static str,
) -> WeaveResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(WeaveError::PositionCount {
            layer,
            expected,
            actual,
            source_name,
        })
    }
}
