use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A line in space of the form `origin + t * direction`.
///
/// The direction is not required to be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// The point at parameter `t` along the ray.
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// The same ray with a unit-length direction.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            direction: self.direction.normalize(),
            ..self
        }
    }
}
