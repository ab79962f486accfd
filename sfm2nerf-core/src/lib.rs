//! # sfm2nerf core
//!
//! This crate provides the small set of types shared by every crate in the sfm2nerf workspace:
//! camera poses, the fixed axis convention that turns an SfM camera-to-world transform into the
//! NeRF convention, skew-symmetric matrices, viewing rays and the pinhole intrinsics of a dataset.
//! Algorithms live in `sfm2nerf-geom` and the pipeline lives in `sfm2nerf`.
//!
//! ## Conventions
//!
//! A [`CameraToWorld`] maps points from the local frame of a camera into the world. Its columns are
//! the camera axes expressed in world space and its translation column is the optical center.
//! In the NeRF convention used for output, the camera looks down its negative `z` axis and its
//! `y` axis points up:
//!
//! * column `0` is the right axis
//! * column `1` is the up axis
//! * column `2` is the back axis (opposite of the viewing direction)
//! * column `3` is the optical center
//!
//! A viewing [`Ray`] starts at the optical center and runs along the back axis, so points in front
//! of the camera have a negative ray parameter:
//!
//! ```text
//!        scene
//!          *
//!           \   t < 0
//!            \
//!             O------->  t > 0 (back axis)
//!           camera
//! ```

mod camera;
mod convention;
mod pose;
mod ray;
mod skew;

pub use camera::*;
pub use convention::*;
pub use nalgebra;
pub use pose::*;
pub use ray::*;
pub use skew::*;
