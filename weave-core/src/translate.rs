//! # Coordinate Translation
//!
//! Places substrate neurons in range space, either from unit coordinates or
//! from grid indices. Grid indices on a layer with a custom position table
//! look the position up directly; those tables are already in range space.

use crate::config::CustomZSource;
use crate::error::{WeaveError, WeaveResult};
use crate::geometry::SubstrateGeometry;
use crate::space::Point;

impl SubstrateGeometry {
    /// Translate unit-interval coordinates into the configured ranges
    #[inline]
    pub fn translate_unit(&self, x: f64, y: f64, z: f64) -> Point {
        Point::new(
            self.range_x.translate_from_unit(x),
            self.range_y.translate_from_unit(y),
            self.range_z.translate_from_unit(z),
        )
    }

    /// Unit coordinates of grid cell `(x, y)` in `layer` on a regular grid
    ///
    /// Single-column/row layers sit at the centre (`0.5`); single-layer
    /// substrates sit at `z = 0`.
    #[inline]
    pub fn grid_to_unit(&self, x: usize, y: usize, layer: usize) -> WeaveResult<Point> {
        self.check_layer(layer)?;
        let w = self.width()[layer];
        let h = self.height()[layer];
        Ok(Point::new(
            if w > 1 { x as f64 / (w - 1) as f64 } else { 0.5 },
            if h > 1 { y as f64 / (h - 1) as f64 } else { 0.5 },
            Self::unit_layer_z(layer, self.depth()),
        ))
    }

    /// Range-space position of grid cell `(x, y)` in `layer`
    ///
    /// Uses the layer's custom position table when there is one; `z_source`
    /// decides which component of a custom position lands in the z slot.
    pub fn grid_position(
        &self,
        x: usize,
        y: usize,
        layer: usize,
        z_source: CustomZSource,
    ) -> WeaveResult<Point> {
        self.check_layer(layer)?;
        let (w, h) = (self.width()[layer], self.height()[layer]);
        if x >= w || y >= h {
            return Err(WeaveError::contract(format!(
                "grid index ({x}, {y}) out of range for {w}x{h} layer {layer}"
            )));
        }

        match self.positions(layer) {
            None => {
                let unit = self.grid_to_unit(x, y, layer)?;
                Ok(self.translate_unit(unit.x, unit.y, unit.z))
            }
            Some(table) => {
                let p = table[y * w + x];
                let z = match z_source {
                    CustomZSource::PositionZ => p.z,
                    CustomZSource::PositionY => p.y,
                };
                Ok(Point::new(p.x, p.y, z))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::config::TranscriberConfig;
    use crate::space::AxisRange;
    use crate::traits::NoDimensions;

    fn geometry(depth: usize, width: &str, height: &str) -> SubstrateGeometry {
        let config = TranscriberConfig {
            depth,
            layer_width: Some(width.to_string()),
            layer_height: Some(height.to_string()),
            range_x: AxisRange::new(-1.0, 1.0),
            range_y: AxisRange::new(-1.0, 1.0),
            ..TranscriberConfig::default()
        };
        SubstrateGeometry::resolve(&config, &NoDimensions).unwrap()
    }

    #[test]
    fn test_grid_to_unit_corners() {
        let g = geometry(3, "3,5,2", "3,5,2");
        assert_eq!(g.grid_to_unit(0, 0, 0).unwrap(), Point::new(0.0, 0.0, 0.0));
        assert_eq!(g.grid_to_unit(4, 2, 1).unwrap(), Point::new(1.0, 0.5, 0.5));
        assert_eq!(g.grid_to_unit(1, 1, 2).unwrap(), Point::new(1.0, 1.0, 1.0));
        assert!(matches!(g.grid_to_unit(0, 0, 3), Err(WeaveError::Contract(_))));
    }

    #[test]
    fn test_single_width_is_centred() {
        let mut rng = rand::thread_rng();
        let g = geometry(2, "1,4", "6,1");
        for _ in 0..50 {
            let x = rng.gen_range(0..10);
            let y = rng.gen_range(0..6);
            assert_eq!(g.grid_to_unit(x, y, 0).unwrap().x, 0.5);
        }
        assert_eq!(g.grid_to_unit(3, 0, 1).unwrap().y, 0.5);
    }

    #[test]
    fn test_grid_position_translates_ranges() {
        let g = geometry(2, "3,1", "3,1");
        assert_eq!(g.grid_position(0, 2, 0, CustomZSource::PositionZ).unwrap(), Point::new(-1.0, 1.0, 0.0));
        assert_eq!(g.grid_position(0, 0, 1, CustomZSource::PositionZ).unwrap(), Point::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_single_layer_rejects_other_layer_indices() {
        let g = geometry(1, "2", "2");
        let p = g.grid_position(1, 1, 0, CustomZSource::PositionZ).unwrap();
        assert_eq!(p, Point::new(1.0, 1.0, 0.0));
        assert!(matches!(
            g.grid_position(0, 0, 9, CustomZSource::PositionZ),
            Err(WeaveError::Contract(_))
        ));
    }

    #[test]
    fn test_out_of_range_indices() {
        let g = geometry(2, "2,2", "2,2");
        assert!(matches!(
            g.grid_position(2, 0, 0, CustomZSource::PositionZ),
            Err(WeaveError::Contract(_))
        ));
        assert!(g.grid_position(0, 0, 2, CustomZSource::PositionZ).is_err());
    }

    #[test]
    fn test_custom_table_lookup_row_major() {
        let config = TranscriberConfig {
            depth: 2,
            layer_width: Some("2,1".to_string()),
            layer_height: Some("2,1".to_string()),
            layer_positions: [(0, "(1, 2, 3), (4, 5, 6), (7, 8, 9), (10, 11, 12)".to_string())]
                .into_iter()
                .collect(),
            ..TranscriberConfig::default()
        };
        let g = SubstrateGeometry::resolve(&config, &NoDimensions).unwrap();

        let fixed = g.grid_position(0, 1, 0, CustomZSource::PositionZ).unwrap();
        assert_eq!(fixed, Point::new(7.0, 8.0, 9.0));

        let legacy = g.grid_position(1, 1, 0, CustomZSource::PositionY).unwrap();
        assert_eq!(legacy, Point::new(10.0, 11.0, 11.0));
    }

    #[test]
    fn test_custom_table_z_source_random_entries() {
        let mut rng = rand::thread_rng();
        let (w, h) = (4, 3);
        let table: Vec<Point> = (0..w * h)
            .map(|_| {
                Point::new(
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                )
            })
            .collect();
        let list = table
            .iter()
            .map(|p| format!("({}, {}, {})", p.x, p.y, p.z))
            .collect::<Vec<_>>()
            .join(", ");
        let config = TranscriberConfig {
            depth: 2,
            layer_width: Some(format!("{w},1")),
            layer_height: Some(format!("{h},1")),
            layer_positions: [(0, list)].into_iter().collect(),
            ..TranscriberConfig::default()
        };
        let g = SubstrateGeometry::resolve(&config, &NoDimensions).unwrap();

        for _ in 0..50 {
            let (x, y) = (rng.gen_range(0..w), rng.gen_range(0..h));
            let entry = table[y * w + x];

            let fixed = g.grid_position(x, y, 0, CustomZSource::PositionZ).unwrap();
            assert_eq!(fixed, entry);

            let legacy = g.grid_position(x, y, 0, CustomZSource::PositionY).unwrap();
            assert_eq!(legacy, Point::new(entry.x, entry.y, entry.y));
        }
    }
}
