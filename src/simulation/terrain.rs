//! Static world features: rocks that can become shelters, obstacles and
//! vertical water bands.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometric_utils::point;
use super::locatable::Locatable;

/// A rock, optionally converted into a shelter.
///
/// Rocks persist across episodes and are only reset by reset-all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rock {
    /// Position in 2D space.
    pub pos: Array1<f32>,
    /// Footprint radius; grows to the shelter radius on conversion.
    pub radius: f32,
    /// Whether the rock has been built into a shelter.
    pub is_shelter: bool,
}

impl Rock {
    /// Creates a plain rock.
    pub fn new(pos: Array1<f32>, radius: f32) -> Self {
        Self {
            pos,
            radius,
            is_shelter: false,
        }
    }

    /// Creates a rock at a uniformly random position in the box.
    pub fn random<R: Rng + ?Sized>(width: f32, height: f32, radius: f32, rng: &mut R) -> Self {
        let x = rng.random::<f32>() * width;
        let y = rng.random::<f32>() * height;
        Self::new(point(x, y), radius)
    }

    /// Turns the rock into a shelter.
    ///
    /// # Returns
    ///
    /// `false` when the rock already was a shelter.
    pub fn convert_to_shelter(&mut self, shelter_radius: f32) -> bool {
        if self.is_shelter {
            return false;
        }
        self.is_shelter = true;
        self.radius = self.radius.max(shelter_radius);
        true
    }

    /// Whether `point` is strictly inside this shelter.
    pub fn shelters(&self, point: &Array1<f32>) -> bool {
        self.is_shelter && self.contains_point(point)
    }
}

impl Locatable for Rock {
    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }

    fn pos_mut(&mut self) -> &mut Array1<f32> {
        &mut self.pos
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Fixed circular obstacle that pushes agents out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    /// Center.
    pub pos: Array1<f32>,
    /// Radius.
    pub radius: f32,
}

impl Obstacle {
    /// Creates an obstacle at a random position, kept one radius from the walls.
    pub fn random<R: Rng + ?Sized>(width: f32, height: f32, radius: f32, rng: &mut R) -> Self {
        let span_x = (width - 2.0 * radius).max(0.0);
        let span_y = (height - 2.0 * radius).max(0.0);
        let x = radius.min(width) + rng.random::<f32>() * span_x;
        let y = radius.min(height) + rng.random::<f32>() * span_y;
        Self {
            pos: point(x, y),
            radius,
        }
    }
}

impl Locatable for Obstacle {
    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }

    fn pos_mut(&mut self) -> &mut Array1<f32> {
        &mut self.pos
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Vertical band of water covering the full world height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterZone {
    /// Left edge.
    pub x_min: f32,
    /// Right edge.
    pub x_max: f32,
}

impl WaterZone {
    /// Lays out `count` bands of `width`, centered at `(i + 1) * W / (count + 1)`.
    pub fn layout(count: usize, width: f32, world_width: f32) -> Vec<WaterZone> {
        (0..count)
            .map(|i| {
                let center = (i + 1) as f32 * world_width / (count + 1) as f32;
                WaterZone {
                    x_min: (center - width / 2.0).max(0.0),
                    x_max: (center + width / 2.0).min(world_width),
                }
            })
            .collect()
    }

    /// Whether an x coordinate falls inside the band.
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x_min && x <= self.x_max
    }

    fn center(&self) -> f32 {
        (self.x_min + self.x_max) / 2.0
    }
}

/// Whether a position is in any water band.
pub fn in_water(zones: &[WaterZone], pos: &Array1<f32>) -> bool {
    zones.iter().any(|zone| zone.contains_x(pos[0]))
}

/// Closest point at the center line of the nearest water band.
pub fn nearest_water_point(zones: &[WaterZone], pos: &Array1<f32>) -> Option<Array1<f32>> {
    zones
        .iter()
        .map(WaterZone::center)
        .min_by(|a, b| (a - pos[0]).abs().total_cmp(&(b - pos[0]).abs()))
        .map(|x| point(x, pos[1]))
}

/// Closest point just outside the band containing `pos`, if any.
pub fn nearest_land_point(zones: &[WaterZone], pos: &Array1<f32>) -> Option<Array1<f32>> {
    let zone = zones.iter().find(|zone| zone.contains_x(pos[0]))?;
    let x = if pos[0] - zone.x_min < zone.x_max - pos[0] {
        zone.x_min - 1.0
    } else {
        zone.x_max + 1.0
    };
    Some(point(x, pos[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_layout_is_even() {
        let zones = WaterZone::layout(3, 200.0, 4000.0);
        assert_eq!(zones.len(), 3);
        assert!((zones[0].center() - 1000.0).abs() < 1e-3);
        assert!((zones[2].center() - 3000.0).abs() < 1e-3);
        assert!(in_water(&zones, &point(1000.0, 5.0)));
        assert!(!in_water(&zones, &point(1500.0, 5.0)));
    }

    #[test]
    fn land_point_leaves_the_band() {
        let zones = WaterZone::layout(1, 200.0, 2000.0);
        let land = nearest_land_point(&zones, &point(950.0, 10.0)).expect("inside water");
        assert!(!in_water(&zones, &land));
        assert!(nearest_land_point(&zones, &point(10.0, 10.0)).is_none());
    }

    #[test]
    fn shelter_conversion_is_one_shot() {
        let mut rock = Rock::new(point(0.0, 0.0), 6.0);
        assert!(!rock.shelters(&point(1.0, 0.0)));
        assert!(rock.convert_to_shelter(30.0));
        assert!(!rock.convert_to_shelter(30.0));
        assert!(rock.shelters(&point(20.0, 0.0)));
        assert!(!rock.shelters(&point(30.0, 0.0)));
    }
}
