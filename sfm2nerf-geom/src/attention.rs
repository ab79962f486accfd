use core::{
    iter::Sum,
    ops::{Add, AddAssign},
};
#[cfg(any(not(feature = "rayon"), test))]
use itertools::Itertools;
use log::*;
use sfm2nerf_core::{
    nalgebra::{Matrix3, Point3, Vector3},
    Ray,
};

/// Estimates the point a set of viewing rays is collectively looking at.
///
/// This is a seam for the normalization pipeline: it only needs the [`Attention`] sums,
/// not any particular way of producing them.
pub trait AttentionEstimator {
    fn attention(&self, rays: &[Ray]) -> Attention;
}

/// The closest approach between two rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayApproach {
    /// The midpoint between the two closest points, one on each ray.
    pub midpoint: Point3<f64>,
    /// The squared sine of the angle between the rays: `1` for perpendicular rays
    /// and `0` for parallel ones.
    pub weight: f64,
}

/// Weighted sums accumulated over ray pairs.
///
/// Sums from disjoint sets of pairs can be added in any order, which is what makes the
/// pair reduction order independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attention {
    /// Sum of `weight * midpoint` over accepted pairs.
    pub weighted_points: Vector3<f64>,
    /// Sum of the weights of accepted pairs.
    pub total_weight: f64,
    /// Number of pairs whose weight cleared the threshold.
    pub accepted_pairs: usize,
    /// Number of pairs evaluated.
    pub considered_pairs: usize,
}

impl Attention {
    pub fn empty() -> Self {
        Self {
            weighted_points: Vector3::zeros(),
            total_weight: 0.0,
            accepted_pairs: 0,
            considered_pairs: 0,
        }
    }

    /// The weighted average of the accepted midpoints, if any pair was accepted.
    pub fn point(&self) -> Option<Point3<f64>> {
        if self.accepted_pairs == 0 || !(self.total_weight > 0.0) {
            return None;
        }
        Some(Point3::from(self.weighted_points / self.total_weight))
            .filter(|point| point.iter().all(|n| n.is_finite()))
    }
}

impl Default for Attention {
    fn default() -> Self {
        Self::empty()
    }
}

impl Add for Attention {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            weighted_points: self.weighted_points + rhs.weighted_points,
            total_weight: self.total_weight + rhs.total_weight,
            accepted_pairs: self.accepted_pairs + rhs.accepted_pairs,
            considered_pairs: self.considered_pairs + rhs.considered_pairs,
        }
    }
}

impl AddAssign for Attention {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Attention {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::empty(), Add::add)
    }
}

/// Finds the attention point as the weighted average of the closest-approach midpoints of
/// every unordered pair of rays.
///
/// The ray parameters at the closest approach are clamped to be non-positive. Cameras look
/// down the negative direction of their rays, so a positive parameter means the closest
/// approach lies behind the camera and the camera origin is used instead.
///
/// ```
/// use sfm2nerf_core::{nalgebra::{Point3, Vector3}, Ray};
/// use sfm2nerf_geom::{AttentionEstimator, ClosestApproachEstimator};
///
/// let rays = [
///     Ray::new(Point3::new(2.0, 0.0, 0.0), Vector3::x()),
///     Ray::new(Point3::new(0.0, 2.0, 0.0), Vector3::y()),
/// ];
/// let attention = ClosestApproachEstimator::new().attention(&rays);
/// let point = attention.point().unwrap();
/// assert!(point.coords.norm() < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct ClosestApproachEstimator {
    epsilon: f64,
    minimum_weight: f64,
}

impl ClosestApproachEstimator {
    /// Creates a `ClosestApproachEstimator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the epsilon added to the closest-approach denominator.
    ///
    /// Default is `1e-10`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Set the weight a pair must exceed to contribute.
    ///
    /// Default is `0.01`.
    #[must_use]
    pub fn minimum_weight(self, minimum_weight: f64) -> Self {
        Self {
            minimum_weight,
            ..self
        }
    }

    /// The closest approach of the two rays with both ray parameters clamped to `t <= 0`.
    pub fn closest_approach(&self, a: &Ray, b: &Ray) -> RayApproach {
        let a = a.normalized();
        let b = b.normalized();
        let (da, db) = (a.direction, b.direction);
        let c = da.cross(&db);
        let denom = c.norm_squared();
        let t = b.origin - a.origin;

        // Cramer's rule for the parameters of the closest points.
        let ta = Matrix3::from_rows(&[t.transpose(), db.transpose(), c.transpose()]).determinant()
            / (denom + self.epsilon);
        let tb = Matrix3::from_rows(&[t.transpose(), da.transpose(), c.transpose()]).determinant()
            / (denom + self.epsilon);
        let ta = if ta > 0.0 { 0.0 } else { ta };
        let tb = if tb > 0.0 { 0.0 } else { tb };

        RayApproach {
            midpoint: Point3::from((a.origin.coords + da * ta + b.origin.coords + db * tb) * 0.5),
            weight: denom,
        }
    }

    fn pair(&self, a: &Ray, b: &Ray) -> Attention {
        let RayApproach { midpoint, weight } = self.closest_approach(a, b);
        if weight > self.minimum_weight {
            Attention {
                weighted_points: midpoint.coords * weight,
                total_weight: weight,
                accepted_pairs: 1,
                considered_pairs: 1,
            }
        } else {
            Attention {
                considered_pairs: 1,
                ..Attention::empty()
            }
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn sum_pairs(&self, rays: &[Ray]) -> Attention {
        self.sum_pairs_sequential(rays)
    }

    #[cfg(feature = "rayon")]
    fn sum_pairs(&self, rays: &[Ray]) -> Attention {
        self.sum_pairs_parallel(rays)
    }

    #[cfg(any(not(feature = "rayon"), test))]
    fn sum_pairs_sequential(&self, rays: &[Ray]) -> Attention {
        rays.iter()
            .tuple_combinations()
            .map(|(a, b)| self.pair(a, b))
            .sum()
    }

    #[cfg(feature = "rayon")]
    fn sum_pairs_parallel(&self, rays: &[Ray]) -> Attention {
        use rayon::prelude::*;
        (0..rays.len())
            .into_par_iter()
            .map(|ix| {
                rays[ix + 1..]
                    .iter()
                    .map(|b| self.pair(&rays[ix], b))
                    .sum::<Attention>()
            })
            .sum()
    }
}

impl Default for ClosestApproachEstimator {
    fn default() -> Self {
        Self {
            epsilon: 1e-10,
            minimum_weight: 0.01,
        }
    }
}

impl AttentionEstimator for ClosestApproachEstimator {
    fn attention(&self, rays: &[Ray]) -> Attention {
        let attention = self.sum_pairs(rays);
        debug!(
            "accepted {} of {} ray pairs with total weight {}",
            attention.accepted_pairs, attention.considered_pairs, attention.total_weight
        );
        attention
    }
}
