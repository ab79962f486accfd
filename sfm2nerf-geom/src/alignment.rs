use log::*;
use sfm2nerf_core::{
    nalgebra::{Matrix3, Rotation3, Vector3},
    Skew3,
};

/// The smallest rotation taking the direction `from` onto the direction `to`.
///
/// This is the Rodrigues construction `I + K + K²·(1 - cos) / (sin² + ε)`, where `K` is the
/// cross-product matrix of `from × to` (the rotation axis scaled by the sine of the angle).
/// The `epsilon` keeps the denominator away from zero when the directions are already parallel,
/// in which case `K` vanishes and the result is the identity.
///
/// Directions that are exactly opposite also give the identity, since no single axis is preferred.
///
/// ```
/// use sfm2nerf_geom::rotation_between;
/// use sfm2nerf_core::nalgebra::Vector3;
///
/// let rotation = rotation_between(&Vector3::y(), &Vector3::z(), 1e-10);
/// assert!((rotation * Vector3::y() - Vector3::z()).norm() < 1e-9);
/// ```
pub fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>, epsilon: f64) -> Rotation3<f64> {
    let from = from.normalize();
    let to = to.normalize();
    let axis = Skew3(from.cross(&to));
    let cos = from.dot(&to);
    let sin_squared = axis.norm_squared();
    Rotation3::from_matrix_unchecked(
        Matrix3::identity() + axis.hat() + axis.hat2() * ((1.0 - cos) / (sin_squared + epsilon)),
    )
}

/// The estimated vertical direction of a rig and the rotation that makes it canonical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpAlignment {
    /// The normalized sum of the camera up axes. When the sum vanishes this is the target axis.
    pub up: Vector3<f64>,
    /// Rotation taking `up` onto the target axis.
    pub rotation: Rotation3<f64>,
    /// Set when the up axes cancel out and no direction could be estimated.
    pub degenerate: bool,
}

/// Estimates the vertical direction of a camera rig from the up axes of its cameras.
///
/// ```
/// use sfm2nerf_geom::UpEstimator;
/// use sfm2nerf_core::nalgebra::{Rotation3, Vector3};
///
/// let alignment = UpEstimator::new().estimate([Vector3::z(), Vector3::z()]);
/// assert_eq!(alignment.rotation, Rotation3::identity());
/// assert!(!alignment.degenerate);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UpEstimator {
    epsilon: f64,
    target: Vector3<f64>,
}

impl UpEstimator {
    /// Creates an `UpEstimator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the epsilon guarding the Rodrigues denominator and the zero-length up sum.
    ///
    /// Default is `1e-10`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Set the axis the estimated up direction is rotated onto.
    ///
    /// Default is `+z`.
    #[must_use]
    pub fn target(self, target: Vector3<f64>) -> Self {
        Self { target, ..self }
    }

    /// Sums the given up axes and computes the rotation aligning the sum with the target axis.
    ///
    /// If the sum is shorter than the epsilon, the rig has no usable vertical and the identity
    /// rotation is returned with [`UpAlignment::degenerate`] set.
    pub fn estimate(&self, ups: impl IntoIterator<Item = Vector3<f64>>) -> UpAlignment {
        let sum = ups.into_iter().fold(Vector3::zeros(), |sum, up| sum + up);
        let norm = sum.norm();
        if norm.is_nan() || norm <= self.epsilon {
            warn!(
                "camera up axes sum to {}, which has no usable direction; keeping the world orientation",
                sum
            );
            return UpAlignment {
                up: self.target.normalize(),
                rotation: Rotation3::identity(),
                degenerate: true,
            };
        }
        let up = sum / norm;
        UpAlignment {
            up,
            rotation: rotation_between(&up, &self.target, self.epsilon),
            degenerate: false,
        }
    }
}

impl Default for UpEstimator {
    fn default() -> Self {
        Self {
            epsilon: 1e-10,
            target: Vector3::z(),
        }
    }
}
