//! This crate contains the geometry used to normalize an SfM camera rig for [sfm2nerf](../sfm2nerf).
//!
//! ## Up alignment
//!
//! Every camera in a rig is usually held roughly upright, so the sum of the camera up axes is a
//! good estimate of the world's vertical. [`UpEstimator`] normalizes that sum and builds the
//! smallest rotation that takes it onto the canonical vertical axis with [`rotation_between`].
//!
//! ## Attention center
//!
//! Cameras in a capture tend to look at the same object. Each camera contributes a viewing ray,
//! and every pair of rays contributes the midpoint of their closest approach, weighted by how far
//! from parallel the two rays are:
//!
//! - `O` the optical center of a camera
//! - `a`, `b` the points of closest approach on each ray
//! - `m` the midpoint, which is the estimate contributed by the pair
//!
//! ```text
//!   O-----------a
//!               m
//!          O----b
//! ```
//!
//! Near-parallel rays triangulate poorly, so their weight (the squared sine of the angle between
//! them) is close to zero and pairs below a threshold are ignored entirely.

mod alignment;
mod attention;

pub use alignment::*;
pub use attention::*;
