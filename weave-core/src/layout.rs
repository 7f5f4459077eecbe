//! # Signal Layout - Pattern Network Slot Allocation
//!
//! Assigns every enabled input and output signal of the pattern network a
//! fixed slot. The assignment is a pure function of the feature flags, so the
//! same configuration always yields the same layout.
//!
//! ## Input order
//!
//! ```text
//! bias | sx sy | tx ty | [tz] [sz] [dz] | [dy dx] | [angle]
//! ```
//!
//! ## Output order
//!
//! ```text
//! weight(s) | [bias(es)] | [leo(s)]
//! ```
//!
//! With layer encoding as input each category gets one shared slot; otherwise
//! one slot per layer transition, contiguous and ordered by source layer.

use serde::{Deserialize, Serialize};

use crate::config::ZCoordMode;
use crate::error::{WeaveError, WeaveResult};

/// Feature flags that determine the signal layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFeatures {
    pub feed_forward: bool,
    pub include_delta: bool,
    pub include_angle: bool,
    pub enable_bias: bool,
    pub enable_leo: bool,
    pub layer_encoding_is_input: bool,
    pub z_coords: ZCoordMode,
    pub depth: usize,
}

impl SignalFeatures {
    /// Layer encoding actually in effect; recurrent substrates cannot use one
    /// output per layer transition
    #[inline]
    pub fn effective_layer_encoding_is_input(&self) -> bool {
        self.layer_encoding_is_input || !self.feed_forward
    }
}

/// Input slot indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSlots {
    pub bias: usize,
    pub source_x: usize,
    pub source_y: usize,
    pub target_x: usize,
    pub target_y: usize,
    pub target_z: Option<usize>,
    pub source_z: Option<usize>,
    pub delta_z: Option<usize>,
    pub delta_y: Option<usize>,
    pub delta_x: Option<usize>,
    pub angle: Option<usize>,
}

impl InputSlots {
    /// Every allocated slot in allocation order
    pub fn indices(&self) -> Vec<usize> {
        let mut indices = vec![
            self.bias,
            self.source_x,
            self.source_y,
            self.target_x,
            self.target_y,
        ];
        indices.extend(
            [
                self.target_z,
                self.source_z,
                self.delta_z,
                self.delta_y,
                self.delta_x,
                self.angle,
            ]
            .into_iter()
            .flatten(),
        );
        indices
    }
}

/// Output slots for one signal category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputSlots {
    /// Category disabled
    Absent,
    /// One slot shared by all layer transitions
    Shared(usize),
    /// One slot per layer transition, `first..first + count`
    PerLayer { first: usize, count: usize },
}

impl OutputSlots {
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Number of slots in this category
    pub fn len(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Shared(_) => 1,
            Self::PerLayer { count, .. } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First slot of the category, the shared slot when there is only one
    #[inline]
    pub fn first(&self) -> Option<usize> {
        match self {
            Self::Absent => None,
            Self::Shared(slot) => Some(*slot),
            Self::PerLayer { first, .. } => Some(*first),
        }
    }

    /// Slot for the transition out of `source_layer`
    ///
    /// Only valid on per-layer encodings.
    #[inline]
    pub fn for_layer(&self, source_layer: usize, name: &str) -> WeaveResult<usize> {
        match self {
            Self::PerLayer { first, count } if source_layer < *count => Ok(first + source_layer),
            Self::PerLayer { count, .. } => Err(WeaveError::contract(format!(
                "{name} output for layer transition {source_layer} requested but only {count} exist"
            ))),
            Self::Shared(_) => Err(WeaveError::contract(format!(
                "{name} output for layer transition {source_layer} requested but the layout shares one {name} output across all layers"
            ))),
            Self::Absent => Err(WeaveError::contract(format!("{name} output is not enabled"))),
        }
    }

    /// Every slot of the category in order
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Self::Absent => Vec::new(),
            Self::Shared(slot) => vec![*slot],
            Self::PerLayer { first, count } => (*first..first + count).collect(),
        }
    }
}

/// Immutable slot assignment for a pattern network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalLayout {
    pub inputs: InputSlots,
    pub input_count: usize,
    pub weight: OutputSlots,
    pub bias: OutputSlots,
    pub leo: OutputSlots,
    pub output_count: usize,
    pub layer_encoding_is_input: bool,
    pub include_delta: bool,
    pub include_angle: bool,
}

impl SignalLayout {
    /// Allocate slots for the given features
    pub fn allocate(features: &SignalFeatures) -> Self {
        let layer_encoding_is_input = features.effective_layer_encoding_is_input();
        let depth = features.depth;

        let mut next = 0usize;
        let mut take = || {
            let slot = next;
            next += 1;
            slot
        };

        let bias = take();
        let source_x = take();
        let source_y = take();
        let target_x = take();
        let target_y = take();
        tracing::debug!("pattern network: added bias, sx, sy, tx, ty inputs");

        let force_z = features.z_coords == ZCoordMode::Force;
        let want_z = force_z
            || (features.z_coords != ZCoordMode::Prevent
                && ((features.feed_forward && layer_encoding_is_input && depth > 2)
                    || (!features.feed_forward && depth > 1)));

        let (mut target_z, mut source_z, mut delta_z) = (None, None, None);
        if want_z {
            target_z = Some(take());
            tracing::debug!("pattern network: added tz input");

            if force_z || !features.feed_forward {
                source_z = Some(take());
                tracing::debug!("pattern network: added sz input");

                if features.include_delta {
                    delta_z = Some(take());
                    tracing::debug!("pattern network: added dz input");
                }
            }
        }

        let (mut delta_y, mut delta_x) = (None, None);
        if features.include_delta {
            delta_y = Some(take());
            delta_x = Some(take());
            tracing::debug!("pattern network: added dx and dy inputs");
        }

        let angle = if features.include_angle {
            tracing::debug!("pattern network: added angle input");
            Some(take())
        } else {
            None
        };

        let input_count = next;

        let per_category = if layer_encoding_is_input {
            1
        } else {
            depth.saturating_sub(1).max(1)
        };
        let mut output_count = 0usize;
        let mut category = |enabled: bool, name: &str| {
            if !enabled {
                return OutputSlots::Absent;
            }
            let first = output_count;
            output_count += per_category;
            tracing::debug!("pattern network: added {per_category} {name} output(s)");
            if layer_encoding_is_input {
                OutputSlots::Shared(first)
            } else {
                OutputSlots::PerLayer {
                    first,
                    count: per_category,
                }
            }
        };

        let weight = category(true, "weight");
        let bias_out = category(features.enable_bias, "bias");
        let leo = category(features.enable_leo, "link expression");

        Self {
            inputs: InputSlots {
                bias,
                source_x,
                source_y,
                target_x,
                target_y,
                target_z,
                source_z,
                delta_z,
                delta_y,
                delta_x,
                angle,
            },
            input_count,
            weight,
            bias: bias_out,
            leo,
            output_count,
            layer_encoding_is_input,
            include_delta: features.include_delta,
            include_angle: features.include_angle,
        }
    }

    /// True when the link expression output is allocated
    pub fn leo_enabled(&self) -> bool {
        self.leo.is_present()
    }

    /// True when bias outputs are allocated
    pub fn bias_enabled(&self) -> bool {
        self.bias.is_present()
    }

    /// Every output slot in allocation order
    pub fn output_indices(&self) -> Vec<usize> {
        let mut indices = self.weight.indices();
        indices.extend(self.bias.indices());
        indices.extend(self.leo.indices());
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(depth: usize) -> SignalFeatures {
        SignalFeatures {
            feed_forward: true,
            include_delta: false,
            include_angle: false,
            enable_bias: false,
            enable_leo: false,
            layer_encoding_is_input: false,
            z_coords: ZCoordMode::Auto,
            depth,
        }
    }

    fn all_feature_sets() -> Vec<SignalFeatures> {
        let mut sets = Vec::new();
        for bits in 0u32..64 {
            for z_coords in [ZCoordMode::Auto, ZCoordMode::Force, ZCoordMode::Prevent] {
                for depth in 1..=5 {
                    sets.push(SignalFeatures {
                        feed_forward: bits & 1 != 0,
                        include_delta: bits & 2 != 0,
                        include_angle: bits & 4 != 0,
                        enable_bias: bits & 8 != 0,
                        enable_leo: bits & 16 != 0,
                        layer_encoding_is_input: bits & 32 != 0,
                        z_coords,
                        depth,
                    });
                }
            }
        }
        sets
    }

    #[test]
    fn test_minimal_layout() {
        let layout = SignalLayout::allocate(&features(2));
        assert_eq!(layout.input_count, 5);
        assert_eq!(layout.inputs.bias, 0);
        assert_eq!(layout.inputs.source_x, 1);
        assert_eq!(layout.inputs.source_y, 2);
        assert_eq!(layout.inputs.target_x, 3);
        assert_eq!(layout.inputs.target_y, 4);
        assert_eq!(layout.inputs.target_z, None);
        assert_eq!(layout.output_count, 1);
        assert_eq!(layout.weight, OutputSlots::PerLayer { first: 0, count: 1 });
        assert!(!layout.leo_enabled());
    }

    #[test]
    fn test_slots_are_contiguous_for_every_feature_set() {
        for f in all_feature_sets() {
            let layout = SignalLayout::allocate(&f);

            let mut inputs = layout.inputs.indices();
            inputs.sort_unstable();
            assert_eq!(inputs, (0..layout.input_count).collect::<Vec<_>>(), "{f:?}");

            let mut outputs = layout.output_indices();
            outputs.sort_unstable();
            assert_eq!(outputs, (0..layout.output_count).collect::<Vec<_>>(), "{f:?}");
        }
    }

    #[test]
    fn test_allocation_order_is_stable() {
        for f in all_feature_sets() {
            let layout = SignalLayout::allocate(&f);
            // Allocation order already sorted means slots follow the documented order
            let inputs = layout.inputs.indices();
            assert!(inputs.windows(2).all(|w| w[0] < w[1]), "{f:?}");
            let outputs = layout.output_indices();
            assert!(outputs.windows(2).all(|w| w[0] < w[1]), "{f:?}");
            assert_eq!(layout, SignalLayout::allocate(&f));
        }
    }

    #[test]
    fn test_recurrent_forces_layer_encoding() {
        for f in all_feature_sets().into_iter().filter(|f| !f.feed_forward) {
            let layout = SignalLayout::allocate(&f);
            assert!(layout.layer_encoding_is_input);
            assert!(matches!(layout.weight, OutputSlots::Shared(0)));
        }
    }

    #[test]
    fn test_feed_forward_single_layer_has_no_z() {
        for f in all_feature_sets()
            .into_iter()
            .filter(|f| f.feed_forward && f.depth == 1 && f.z_coords != ZCoordMode::Force)
        {
            let layout = SignalLayout::allocate(&f);
            assert_eq!(layout.inputs.target_z, None);
            assert_eq!(layout.inputs.source_z, None);
            assert_eq!(layout.inputs.delta_z, None);
        }
    }

    #[test]
    fn test_feed_forward_layer_input_adds_target_z_only() {
        let mut f = features(3);
        f.layer_encoding_is_input = true;
        f.include_delta = true;
        let layout = SignalLayout::allocate(&f);
        assert_eq!(layout.inputs.target_z, Some(5));
        assert_eq!(layout.inputs.source_z, None);
        assert_eq!(layout.inputs.delta_z, None);
        assert_eq!(layout.inputs.delta_y, Some(6));
        assert_eq!(layout.inputs.delta_x, Some(7));
        assert_eq!(layout.input_count, 8);
    }

    #[test]
    fn test_recurrent_full_input_order() {
        let mut f = features(2);
        f.feed_forward = false;
        f.include_delta = true;
        f.include_angle = true;
        let layout = SignalLayout::allocate(&f);
        let i = layout.inputs;
        assert_eq!(i.target_z, Some(5));
        assert_eq!(i.source_z, Some(6));
        assert_eq!(i.delta_z, Some(7));
        assert_eq!(i.delta_y, Some(8));
        assert_eq!(i.delta_x, Some(9));
        assert_eq!(i.angle, Some(10));
        assert_eq!(layout.input_count, 11);
    }

    #[test]
    fn test_z_mode_overrides() {
        let mut f = features(1);
        f.z_coords = ZCoordMode::Force;
        let forced = SignalLayout::allocate(&f);
        assert_eq!(forced.inputs.target_z, Some(5));
        assert_eq!(forced.inputs.source_z, Some(6));

        let mut f = features(4);
        f.feed_forward = false;
        f.z_coords = ZCoordMode::Prevent;
        let prevented = SignalLayout::allocate(&f);
        assert_eq!(prevented.inputs.target_z, None);
        assert_eq!(prevented.inputs.source_z, None);
    }

    #[test]
    fn test_per_layer_outputs() {
        let mut f = features(4);
        f.enable_bias = true;
        f.enable_leo = true;
        let layout = SignalLayout::allocate(&f);
        assert_eq!(layout.weight.indices(), vec![0, 1, 2]);
        assert_eq!(layout.bias.indices(), vec![3, 4, 5]);
        assert_eq!(layout.leo.indices(), vec![6, 7, 8]);
        assert_eq!(layout.output_count, 9);
        assert_eq!(layout.bias.for_layer(2, "bias").unwrap(), 5);
        assert!(layout.bias.for_layer(3, "bias").is_err());
    }

    #[test]
    fn test_shared_outputs() {
        let mut f = features(4);
        f.layer_encoding_is_input = true;
        f.enable_leo = true;
        let layout = SignalLayout::allocate(&f);
        assert_eq!(layout.weight, OutputSlots::Shared(0));
        assert_eq!(layout.bias, OutputSlots::Absent);
        assert_eq!(layout.leo, OutputSlots::Shared(1));
        assert_eq!(layout.output_count, 2);

        let err = layout.weight.for_layer(0, "weight").unwrap_err();
        assert!(matches!(err, WeaveError::Contract(_)));
    }

    #[test]
    fn test_depth_three_per_layer_weights() {
        let layout = SignalLayout::allocate(&features(3));
        assert_eq!(layout.weight.len(), 2);
        assert_eq!(layout.output_count, 2);
        assert_ne!(
            layout.weight.for_layer(0, "weight").unwrap(),
            layout.weight.for_layer(1, "weight").unwrap()
        );
    }
}
