use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The pinhole model shared by every view of a dataset.
///
/// Only one focal length is kept, so pixels are assumed square and the
/// horizontal and vertical focal lengths are equal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Intrinsics {
    /// Image width in pixels.
    pub width: f64,
    /// Image height in pixels.
    pub height: f64,
    /// Focal length in pixels.
    pub focal_length: f64,
    pub principal_point: Point2<f64>,
}

impl Intrinsics {
    pub fn new(width: f64, height: f64, focal_length: f64, principal_point: Point2<f64>) -> Self {
        Self {
            width,
            height,
            focal_length,
            principal_point,
        }
    }

    /// The horizontal and vertical field of view.
    ///
    /// ```
    /// use sfm2nerf_core::Intrinsics;
    /// use sfm2nerf_core::nalgebra::Point2;
    ///
    /// let intrinsics = Intrinsics::new(1920.0, 1080.0, 1600.0, Point2::new(960.0, 540.0));
    /// let fov = intrinsics.field_of_view();
    /// assert!((fov.x - 1.0808).abs() < 1e-4);
    /// assert!((fov.x_degrees() - 61.93).abs() < 1e-2);
    /// ```
    pub fn field_of_view(&self) -> FieldOfView {
        FieldOfView {
            x: angle_of_view(self.width, self.focal_length),
            y: angle_of_view(self.height, self.focal_length),
        }
    }
}

/// Horizontal and vertical field of view in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FieldOfView {
    pub x: f64,
    pub y: f64,
}

impl FieldOfView {
    pub fn x_degrees(&self) -> f64 {
        self.x.to_degrees()
    }

    pub fn y_degrees(&self) -> f64 {
        self.y.to_degrees()
    }
}

/// The angle subtended by `dimension` pixels at `focal_length` pixels: `2·atan(d / 2f)`.
pub fn angle_of_view(dimension: f64, focal_length: f64) -> f64 {
    2.0 * (dimension / (2.0 * focal_length)).atan()
}
