//! # Configuration - Transcriber Parameters
//!
//! Everything the geometry resolver and the signal index allocator read.
//! Loaded from JSON or assembled in code, optionally overridden from
//! `WEAVE_*` environment variables.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{WeaveError, WeaveResult};
use crate::layout::SignalFeatures;
use crate::space::{AxisRange, Point};

/// Token in a layer size list meaning "the dimension provider decides"
pub const EXTERNAL_DIMENSION_TOKEN: &str = "f";

/// Default minimum pattern-network output that still produces a weight
pub const DEFAULT_EXPRESSION_THRESHOLD: f64 = 0.2;

/// Whether z coordinates are fed to the pattern network
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZCoordMode {
    /// Decide from topology and layer encoding
    #[default]
    Auto,
    /// Always add the z inputs
    Force,
    /// Never add the z inputs
    Prevent,
}

/// Which component of a custom neuron position feeds the z input slot
///
/// Grid-index placement on a layer with a custom position table historically
/// copied the position's y component into the z slot. `PositionY` keeps that
/// behaviour for genomes evolved against it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomZSource {
    #[default]
    PositionZ,
    PositionY,
}

/// Master configuration for a transcriber
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Restrict the substrate to a strictly feed-forward topology
    pub feed_forward: bool,

    /// Give every substrate neuron a bias weight
    pub enable_bias: bool,

    /// Feed per-axis source/target deltas to the pattern network
    pub include_delta: bool,

    /// Feed the XY-plane angle between source and target
    pub include_angle: bool,

    /// Feed the layer coordinate as input instead of one weight output per
    /// layer transition. Forced on for recurrent substrates.
    pub layer_encoding_is_input: bool,

    /// Enable the link expression output (LEO)
    pub enable_leo: bool,

    /// Seed initial genotypes towards local connections via LEO.
    /// Carried for the genotype seeding collaborator, not read here.
    pub leo_locality_seeding: bool,

    /// Minimum pattern-network output required for a non-zero weight
    pub connection_expression_threshold: f64,

    /// Minimum substrate weight, `-connection_weight_max` when unset
    pub connection_weight_min: Option<f64>,

    /// Maximum substrate weight
    pub connection_weight_max: f64,

    /// Limit incoming connections to sources within this many grid cells
    /// of the target; `-1` disables the limit
    pub connection_range: i64,

    /// Number of layers, including input and output layers
    pub depth: usize,

    /// Comma separated width of each layer, input layer first.
    /// `f` entries are sized by the dimension provider; `None` means all.
    pub layer_width: Option<String>,

    /// Comma separated height of each layer, same format as `layer_width`
    pub layer_height: Option<String>,

    pub range_x: AxisRange,
    pub range_y: AxisRange,
    pub range_z: AxisRange,

    /// Explicit neuron positions per layer index, e.g. `"(-0.5, 0, 0), (0.5, 0)"`,
    /// row-major, in range space
    pub layer_positions: BTreeMap<usize, String>,

    /// Activation cycles per step for recurrent substrates
    pub cycles_per_step: Option<u32>,

    /// Z input allocation override
    pub z_coords: ZCoordMode,

    /// Source of the z input for custom-positioned layers
    pub custom_position_z: CustomZSource,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            feed_forward: true,
            enable_bias: false,
            include_delta: false,
            include_angle: false,
            layer_encoding_is_input: false,
            enable_leo: false,
            leo_locality_seeding: false,
            connection_expression_threshold: DEFAULT_EXPRESSION_THRESHOLD,
            connection_weight_min: None,
            connection_weight_max: 1.0,
            connection_range: -1,
            depth: 3,
            layer_width: None,
            layer_height: None,
            range_x: AxisRange::UNIT,
            range_y: AxisRange::UNIT,
            range_z: AxisRange::UNIT,
            layer_positions: BTreeMap::new(),
            cycles_per_step: None,
            z_coords: ZCoordMode::Auto,
            custom_position_z: CustomZSource::PositionZ,
        }
    }
}

impl TranscriberConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> WeaveResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> WeaveResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create config from environment variables
    ///
    /// Reads (all optional, defaults from [`TranscriberConfig::default`]):
    /// - WEAVE_DEPTH: Number of substrate layers
    /// - WEAVE_WIDTH / WEAVE_HEIGHT: Comma separated layer sizes
    /// - WEAVE_FEED_FORWARD: "1"/"true" for feed-forward substrates
    /// - WEAVE_ENABLE_BIAS, WEAVE_INCLUDE_DELTA, WEAVE_INCLUDE_ANGLE, WEAVE_LEO
    /// - WEAVE_LAYER_ENCODING: "1"/"true" to feed the layer coordinate as input
    /// - WEAVE_EXPRESSION_THRESHOLD: Connection expression threshold
    /// - WEAVE_WEIGHT_MAX / WEAVE_WEIGHT_MIN: Substrate weight bounds
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(depth) = env_parse("WEAVE_DEPTH") {
            config.depth = depth;
        }
        if let Ok(width) = std::env::var("WEAVE_WIDTH") {
            config.layer_width = Some(width);
        }
        if let Ok(height) = std::env::var("WEAVE_HEIGHT") {
            config.layer_height = Some(height);
        }
        if let Some(v) = env_flag("WEAVE_FEED_FORWARD") {
            config.feed_forward = v;
        }
        if let Some(v) = env_flag("WEAVE_ENABLE_BIAS") {
            config.enable_bias = v;
        }
        if let Some(v) = env_flag("WEAVE_INCLUDE_DELTA") {
            config.include_delta = v;
        }
        if let Some(v) = env_flag("WEAVE_INCLUDE_ANGLE") {
            config.include_angle = v;
        }
        if let Some(v) = env_flag("WEAVE_LEO") {
            config.enable_leo = v;
        }
        if let Some(v) = env_flag("WEAVE_LAYER_ENCODING") {
            config.layer_encoding_is_input = v;
        }
        if let Some(v) = env_parse("WEAVE_EXPRESSION_THRESHOLD") {
            config.connection_expression_threshold = v;
        }
        if let Some(v) = env_parse("WEAVE_WEIGHT_MAX") {
            config.connection_weight_max = v;
        }
        if let Some(v) = env_parse("WEAVE_WEIGHT_MIN") {
            config.connection_weight_min = Some(v);
        }

        config
    }

    /// Effective minimum weight
    pub fn weight_min(&self) -> f64 {
        self.connection_weight_min
            .unwrap_or(-self.connection_weight_max)
    }

    /// Connection range limit, `None` when disabled
    pub fn connection_range(&self) -> Option<usize> {
        usize::try_from(self.connection_range).ok()
    }

    /// Activation cycles per step; feed-forward substrates need `depth - 1`
    pub fn cycles_per_step(&self) -> u32 {
        if self.feed_forward {
            self.depth.saturating_sub(1) as u32
        } else {
            self.cycles_per_step.unwrap_or(1)
        }
    }

    /// Feature flags consumed by the signal index allocator
    pub fn features(&self) -> SignalFeatures {
        SignalFeatures {
            feed_forward: self.feed_forward,
            include_delta: self.include_delta,
            include_angle: self.include_angle,
            enable_bias: self.enable_bias,
            enable_leo: self.enable_leo,
            layer_encoding_is_input: self.layer_encoding_is_input,
            z_coords: self.z_coords,
            depth: self.depth,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.to_lowercase() == "true")
}

/// Parse a comma separated per-layer size list
///
/// Returns one entry per layer, `None` for layers the dimension provider must
/// size. A missing list leaves every layer to the provider.
pub fn parse_layer_sizes(
    list: Option<&str>,
    depth: usize,
    key: &'static str,
) -> WeaveResult<Vec<Option<usize>>> {
    let Some(list) = list else {
        return Ok(vec![None; depth]);
    };

    let sizes = list
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            if entry == EXTERNAL_DIMENSION_TOKEN {
                return Ok(None);
            }
            match entry.parse::<usize>() {
                Ok(0) | Err(_) => Err(WeaveError::config(format!(
                    "{key}: invalid layer size '{entry}', expected a positive integer or '{EXTERNAL_DIMENSION_TOKEN}'"
                ))),
                Ok(n) => Ok(Some(n)),
            }
        })
        .collect::<WeaveResult<Vec<_>>>()?;

    if sizes.len() != depth {
        return Err(WeaveError::LayerCount {
            key,
            actual: sizes.len(),
            depth,
        });
    }
    Ok(sizes)
}

/// Parse a list of `(x, y[, z])` tuples
///
/// Components left out are taken from `default`.
pub fn parse_positions(list: &str, default: Point) -> WeaveResult<Vec<Point>> {
    let mut points = Vec::new();
    let mut rest = list.trim();

    while !rest.is_empty() {
        let open = rest
            .strip_prefix('(')
            .ok_or_else(|| WeaveError::config(format!("expected '(' in position list at '{rest}'")))?;
        let close = open
            .find(')')
            .ok_or_else(|| WeaveError::config(format!("unterminated position tuple at '{rest}'")))?;

        let components = open[..close]
            .split(',')
            .map(|c| {
                c.trim()
                    .parse::<f64>()
                    .map_err(|_| WeaveError::config(format!("invalid coordinate '{}'", c.trim())))
            })
            .collect::<WeaveResult<Vec<_>>>()?;

        let point = match components.as_slice() {
            [x] => Point::new(*x, default.y, default.z),
            [x, y] => Point::new(*x, *y, default.z),
            [x, y, z] => Point::new(*x, *y, *z),
            _ => {
                return Err(WeaveError::config(format!(
                    "position tuple '({})' must have 1 to 3 components",
                    &open[..close]
                )))
            }
        };
        points.push(point);

        rest = open[close + 1..].trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_min_defaults_to_negated_max() {
        let mut config = TranscriberConfig::default();
        config.connection_weight_max = 3.0;
        assert_eq!(config.weight_min(), -3.0);
        config.connection_weight_min = Some(-0.5);
        assert_eq!(config.weight_min(), -0.5);
    }

    #[test]
    fn test_connection_range_disabled() {
        let mut config = TranscriberConfig::default();
        assert_eq!(config.connection_range(), None);
        config.connection_range = 2;
        assert_eq!(config.connection_range(), Some(2));
    }

    #[test]
    fn test_cycles_per_step() {
        let mut config = TranscriberConfig::default();
        config.depth = 4;
        assert_eq!(config.cycles_per_step(), 3);

        config.feed_forward = false;
        assert_eq!(config.cycles_per_step(), 1);
        config.cycles_per_step = Some(5);
        assert_eq!(config.cycles_per_step(), 5);
    }

    #[test]
    fn test_parse_layer_sizes() {
        let sizes = parse_layer_sizes(Some("3, f,5"), 3, "layer_width").unwrap();
        assert_eq!(sizes, vec![Some(3), None, Some(5)]);

        let all_external = parse_layer_sizes(None, 2, "layer_width").unwrap();
        assert_eq!(all_external, vec![None, None]);
    }

    #[test]
    fn test_parse_layer_sizes_length_mismatch() {
        let err = parse_layer_sizes(Some("3,3"), 3, "layer_height").unwrap_err();
        assert!(matches!(err, WeaveError::LayerCount { actual: 2, depth: 3, .. }));
    }

    #[test]
    fn test_parse_layer_sizes_rejects_garbage() {
        assert!(parse_layer_sizes(Some("3,x"), 2, "layer_width").is_err());
        assert!(parse_layer_sizes(Some("0,1"), 2, "layer_width").is_err());
        assert!(parse_layer_sizes(Some("-1,1"), 2, "layer_width").is_err());
    }

    #[test]
    fn test_parse_positions() {
        let default = Point::new(0.0, 0.0, 0.5);
        let points = parse_positions("(-0.5, 0, 0), (0.5, 0.25)", default).unwrap();
        assert_eq!(points, vec![Point::new(-0.5, 0.0, 0.0), Point::new(0.5, 0.25, 0.5)]);
    }

    #[test]
    fn test_parse_positions_malformed() {
        let default = Point::default();
        assert!(parse_positions("(1, 2", default).is_err());
        assert!(parse_positions("1, 2", default).is_err());
        assert!(parse_positions("(1, 2, 3, 4)", default).is_err());
        assert!(parse_positions("(a, 2)", default).is_err());
        assert!(parse_positions("", default).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weave.json");

        let mut config = TranscriberConfig::default();
        config.depth = 2;
        config.layer_width = Some("4,2".to_string());
        config.layer_positions.insert(1, "(0, 0), (1, 1)".to_string());
        config.z_coords = ZCoordMode::Force;
        config.save(&path).unwrap();

        let loaded = TranscriberConfig::load(&path).unwrap();
        assert_eq!(loaded.depth, 2);
        assert_eq!(loaded.layer_width.as_deref(), Some("4,2"));
        assert_eq!(loaded.layer_positions.get(&1).map(String::as_str), Some("(0, 0), (1, 1)"));
        assert_eq!(loaded.z_coords, ZCoordMode::Force);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TranscriberConfig =
            serde_json::from_str(r#"{ "depth": 5, "enable_leo": true }"#).unwrap();
        assert_eq!(config.depth, 5);
        assert!(config.enable_leo);
        assert!(config.feed_forward);
        assert_eq!(config.connection_expression_threshold, DEFAULT_EXPRESSION_THRESHOLD);
        assert_eq!(config.range_x, AxisRange::UNIT);
    }
}
