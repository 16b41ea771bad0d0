//! Room controls that don't depend on the audio: occupancy, sphere shape and stand height.
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_PEOPLE: usize = 10;

/// Base colour (`0xRRGGBB`) by number of people in the room, green when empty through to red.
pub const OCCUPANCY_PALETTE: [u32; 10] = [
    0x53c566, 0x53c566, 0x3e9d4e, 0xff8800, 0xff6600, 0xff4400, 0xff2200, 0xff2300, 0xdd2500,
    0xbb0000,
];

pub const STAND_HEIGHTS: [f64; 5] = [0.6, 1.0, 1.4, 1.8, 2.2];
pub const DEFAULT_STAND: usize = 2;
pub const SPHERE_RADIUS: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SphereShape {
    Sphere,
    Cylinder,
    Cone,
}

impl SphereShape {
    pub fn next(self) -> Self {
        match self {
            SphereShape::Sphere => SphereShape::Cylinder,
            SphereShape::Cylinder => SphereShape::Cone,
            SphereShape::Cone => SphereShape::Sphere,
        }
    }

    pub fn geometry(self) -> Geometry {
        match self {
            SphereShape::Sphere => Geometry::Sphere {
                radius: SPHERE_RADIUS,
            },
            SphereShape::Cylinder => Geometry::Frustum {
                radius_top: 0.6,
                radius_bottom: 0.6,
                height: 1.2,
            },
            SphereShape::Cone => Geometry::Frustum {
                radius_top: 0.3,
                radius_bottom: 0.6,
                height: 1.2,
            },
        }
    }
}

impl Default for SphereShape {
    fn default() -> Self {
        SphereShape::Sphere
    }
}

impl fmt::Display for SphereShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SphereShape::Sphere => "sphere",
            SphereShape::Cylinder => "cylinder",
            SphereShape::Cone => "cone",
        })
    }
}

/// Mesh dimensions, in scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f64,
    },
    /// Cylinders and truncated cones.
    Frustum {
        radius_top: f64,
        radius_bottom: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    people: usize,
    shape: SphereShape,
    stand: usize,
}

impl Scene {
    pub fn new() -> Self {
        Scene {
            people: 0,
            shape: SphereShape::Sphere,
            stand: DEFAULT_STAND,
        }
    }

    pub fn people(&self) -> usize {
        self.people
    }

    /// Returns `false` once the room is full.
    pub fn add_person(&mut self) -> bool {
        if self.people >= MAX_PEOPLE {
            log::warn!("room is full ({} people)", MAX_PEOPLE);
            return false;
        }
        self.people += 1;
        log::info!("{} people in the room", self.people);
        true
    }

    pub fn remove_person(&mut self) -> bool {
        if self.people == 0 {
            return false;
        }
        self.people -= 1;
        log::info!("{} people in the room", self.people);
        true
    }

    /// Palette colour for the current occupancy. A full room keeps the last colour.
    pub fn occupancy_color(&self) -> u32 {
        OCCUPANCY_PALETTE[self.people.min(OCCUPANCY_PALETTE.len() - 1)]
    }

    pub fn shape(&self) -> SphereShape {
        self.shape
    }

    pub fn next_shape(&mut self) -> SphereShape {
        self.shape = self.shape.next();
        log::debug!("sphere shape {}", self.shape);
        self.shape
    }

    pub fn stand_index(&self) -> usize {
        self.stand
    }

    pub fn stand_height(&self) -> f64 {
        STAND_HEIGHTS[self.stand]
    }

    /// Height of the sphere's centre above the floor.
    pub fn sphere_elevation(&self) -> f64 {
        self.stand_height() + SPHERE_RADIUS
    }

    /// Step to the next stand, wrapping from the tallest back to the shortest.
    pub fn raise_stand(&mut self) -> f64 {
        self.stand = (self.stand + 1) % STAND_HEIGHTS.len();
        self.stand_height()
    }

    /// Step to the previous stand, wrapping from the shortest to the tallest.
    pub fn lower_stand(&mut self) -> f64 {
        self.stand = (self.stand + STAND_HEIGHTS.len() - 1) % STAND_HEIGHTS.len();
        self.stand_height()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_palette() {
        let mut scene = Scene::new();
        assert_eq!(scene.occupancy_color(), 0x53c566);
        for _ in 0..3 {
            assert!(scene.add_person());
        }
        assert_eq!(scene.occupancy_color(), 0xff8800);
        while scene.add_person() {}
        assert_eq!(scene.people(), MAX_PEOPLE);
        assert_eq!(scene.occupancy_color(), 0xbb0000);
        assert!(scene.remove_person());
        assert_eq!(scene.occupancy_color(), 0xbb0000);
        assert!(scene.remove_person());
        assert_eq!(scene.occupancy_color(), 0xdd2500);
    }

    #[test]
    fn cannot_go_below_empty() {
        let mut scene = Scene::new();
        assert!(!scene.remove_person());
        assert_eq!(scene.people(), 0);
    }

    #[test]
    fn shapes_cycle() {
        let mut scene = Scene::new();
        assert_eq!(scene.next_shape(), SphereShape::Cylinder);
        assert_eq!(
            scene.next_shape().geometry(),
            Geometry::Frustum {
                radius_top: 0.3,
                radius_bottom: 0.6,
                height: 1.2
            }
        );
        assert_eq!(scene.next_shape(), SphereShape::Sphere);
        assert_eq!(scene.shape().geometry(), Geometry::Sphere { radius: 0.6 });
    }

    #[test]
    fn stand_wraps() {
        let mut scene = Scene::new();
        assert_eq!(scene.stand_height(), 1.4);
        assert_eq!(scene.raise_stand(), 1.8);
        assert_eq!(scene.raise_stand(), 2.2);
        assert_eq!(scene.raise_stand(), 0.6);
        assert_eq!(scene.lower_stand(), 2.2);
        assert_eq!(scene.stand_index(), 4);
        assert!((scene.sphere_elevation() - 2.8).abs() < 1e-12);
    }
}
