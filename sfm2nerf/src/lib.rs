//! # sfm2nerf
//!
//! Converts the camera poses of a structure-from-motion reconstruction into a NeRF
//! `transforms.json` dataset.
//!
//! SfM tools place the world wherever the reconstruction happened to start: the scale, orientation
//! and origin are arbitrary. [`Normalizer::normalize`] runs four stages over the views of an
//! [`SfmRecord`] to put the rig into a canonical frame:
//!
//! 1. [`PoseExtractor`] inverts every SfM pose into a camera-to-world transform and moves it into
//!    the NeRF axis convention ([`sfm2nerf_core::AxisConvention`]).
//! 2. [`align_up`] rotates the rig so the summed camera up axis points along `+z`.
//! 3. [`recenter`] moves the point all the cameras look at to the origin.
//! 4. [`rescale`] scales the camera translations so their mean distance from the origin is fixed.
//!
//! The result is a [`NormalizedDataset`], which can be partitioned with [`Split`] and handed to a
//! [`Renderer`] with [`render_frames`].

mod dataset;
mod error;
mod extract;
mod normalize;
mod record;
mod render;
mod settings;
mod split;

pub use dataset::*;
pub use error::*;
pub use extract::*;
pub use normalize::*;
pub use record::*;
pub use render::*;
pub use settings::*;
pub use split::*;
pub use sfm2nerf_core;
pub use sfm2nerf_geom;
