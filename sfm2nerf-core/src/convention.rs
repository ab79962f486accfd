use crate::CameraToWorld;
use nalgebra::Matrix4;

/// World-side change of basis from an SfM world frame to the NeRF world frame,
/// applied on the left of a camera-to-world transform.
///
/// It swaps the first two world axes and then flips the third, which keeps the
/// handedness of the world frame.
#[rustfmt::skip]
pub const NERF_WORLD_AXES: [[f64; 4]; 4] = [
    [0.0, 1.0,  0.0, 0.0],
    [1.0, 0.0,  0.0, 0.0],
    [0.0, 0.0, -1.0, 0.0],
    [0.0, 0.0,  0.0, 1.0],
];

/// Camera-side change of basis from a camera looking down `+z` with `y` down to a
/// camera looking down `-z` with `y` up, applied on the right of a camera-to-world transform.
#[rustfmt::skip]
pub const NERF_CAMERA_AXES: [[f64; 4]; 4] = [
    [1.0,  0.0,  0.0, 0.0],
    [0.0, -1.0,  0.0, 0.0],
    [0.0,  0.0, -1.0, 0.0],
    [0.0,  0.0,  0.0, 1.0],
];

/// A fixed pair of orthogonal changes of basis turning an SfM camera-to-world transform
/// into the output convention: `world * pose * camera`.
///
/// Both matrices are orthogonal, so the change is undone with their transposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConvention {
    world: Matrix4<f64>,
    camera: Matrix4<f64>,
}

impl AxisConvention {
    /// A convention from a world-side matrix and a camera-side matrix, both orthogonal.
    pub fn new(world: Matrix4<f64>, camera: Matrix4<f64>) -> Self {
        Self { world, camera }
    }

    /// Leaves transforms as they are.
    pub fn identity() -> Self {
        Self::new(Matrix4::identity(), Matrix4::identity())
    }

    /// The SfM to NeRF convention: [`NERF_WORLD_AXES`] on the left, [`NERF_CAMERA_AXES`] on the right.
    pub fn nerf() -> Self {
        Self {
            world: Matrix4::from_fn(|r, c| NERF_WORLD_AXES[r][c]),
            camera: Matrix4::from_fn(|r, c| NERF_CAMERA_AXES[r][c]),
        }
    }

    pub fn world(&self) -> &Matrix4<f64> {
        &self.world
    }

    pub fn camera(&self) -> &Matrix4<f64> {
        &self.camera
    }

    /// Converts a camera-to-world transform from the source convention.
    pub fn apply(&self, pose: CameraToWorld) -> CameraToWorld {
        CameraToWorld(self.world * pose.0 * self.camera)
    }

    /// Converts a camera-to-world transform back into the source convention.
    pub fn revert(&self, pose: CameraToWorld) -> CameraToWorld {
        CameraToWorld(self.world.transpose() * pose.0 * self.camera.transpose())
    }
}

impl Default for AxisConvention {
    fn default() -> Self {
        Self::nerf()
    }
}
