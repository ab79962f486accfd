use crate::Ray;
use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{
    IsometryMatrix3, Matrix3, Matrix3x4, Matrix4, Point3, Rotation3, Translation3, Vector3,
};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This contains a world pose, which is a pose of the world relative to the camera.
/// This maps world points into the frame of the camera.
///
/// SfM tools usually store this pose as a rotation plus the camera center, so it is built
/// with [`WorldToCamera::from_sfm`] and then inverted into a [`CameraToWorld`].
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldToCamera(pub IsometryMatrix3<f64>);

impl WorldToCamera {
    /// Builds the pose `R * T(-center)` from the 9 rotation scalars of an SfM record
    /// (column-major) and the camera center in SfM world space.
    ///
    /// The column-major scalars are read into the rows of `R`, which transposes the
    /// SfM camera rotation into the world-to-camera direction.
    pub fn from_sfm(rotation: &[f64; 9], center: &[f64; 3]) -> Self {
        let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_column_slice(rotation));
        let center = Vector3::from_column_slice(center);
        Self(IsometryMatrix3::from_parts(
            Translation3::from(-(rotation * center)),
            rotation,
        ))
    }

    /// Takes the inverse of the pose.
    pub fn inverse(self) -> CameraToWorld {
        CameraToWorld(self.0.inverse().to_homogeneous())
    }

    /// Retrieve the homogeneous matrix.
    pub fn homogeneous(self) -> Matrix4<f64> {
        self.0.to_homogeneous()
    }
}

/// This contains a camera pose, which is a pose of the camera relative to the world.
/// This also tells you where the camera is located and oriented in the world.
///
/// The pose is kept as a full homogeneous matrix rather than an isometry because the
/// normalization stages operate on its blocks directly and the output is the matrix itself.
/// Serialized, it is a list of four rows.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(Serialize, Deserialize),
    serde(from = "[[f64; 4]; 4]", into = "[[f64; 4]; 4]")
)]
pub struct CameraToWorld(pub Matrix4<f64>);

impl CameraToWorld {
    /// Creates a pose with no change in position or orientation.
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Create the pose from a rotation block and a translation.
    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_slice_mut::<3, 3>(0, 0).copy_from(&rotation);
        matrix.fixed_slice_mut::<3, 1>(0, 3).copy_from(&translation);
        Self(matrix)
    }

    /// A camera at `eye` looking at `target`, in the convention where the camera looks down
    /// its negative `z` axis and `up` is only a hint for the camera's `y` axis.
    ///
    /// ```
    /// use sfm2nerf_core::CameraToWorld;
    /// use sfm2nerf_core::nalgebra::{Point3, Vector3};
    ///
    /// let pose = CameraToWorld::look_at(
    ///     Point3::new(5.0, 0.0, 0.0),
    ///     Point3::origin(),
    ///     Vector3::z(),
    /// );
    /// assert_eq!(pose.back(), Vector3::x());
    /// assert_eq!(pose.up(), Vector3::z());
    /// assert!(pose.is_orthonormal(1e-12));
    /// ```
    pub fn look_at(eye: Point3<f64>, target: Point3<f64>, up: Vector3<f64>) -> Self {
        let back = (eye - target).normalize();
        let right = up.cross(&back).normalize();
        let up = back.cross(&right);
        Self::from_parts(Matrix3::from_columns(&[right, up, back]), eye.coords)
    }

    /// The upper-left 3x3 block, whose columns are the camera axes in world space.
    pub fn rotation(&self) -> Matrix3<f64> {
        self.0.fixed_slice::<3, 3>(0, 0).into_owned()
    }

    /// The translation column, which is the optical center of the camera.
    pub fn translation(&self) -> Vector3<f64> {
        self.0.fixed_slice::<3, 1>(0, 3).into_owned()
    }

    pub fn set_translation(&mut self, translation: Vector3<f64>) {
        self.0.fixed_slice_mut::<3, 1>(0, 3).copy_from(&translation);
    }

    /// The optical center of the camera.
    pub fn optical_center(&self) -> Point3<f64> {
        Point3::from(self.translation())
    }

    fn axis(&self, column: usize) -> Vector3<f64> {
        self.0.fixed_slice::<3, 1>(0, column).into_owned()
    }

    pub fn right(&self) -> Vector3<f64> {
        self.axis(0)
    }

    pub fn up(&self) -> Vector3<f64> {
        self.axis(1)
    }

    /// The camera axis pointing away from what the camera sees.
    pub fn back(&self) -> Vector3<f64> {
        self.axis(2)
    }

    /// The viewing ray of the camera: it starts at the optical center and runs along the back axis.
    pub fn ray(&self) -> Ray {
        Ray::new(self.optical_center(), self.back())
    }

    /// Applies a world rotation on the left of the pose. This rotates both the camera axes
    /// and the optical center about the world origin.
    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        self.0 = rotation.to_homogeneous() * self.0;
    }

    /// Moves the optical center by `offset` without touching the rotation block.
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        let translation = self.translation() + offset;
        self.set_translation(translation);
    }

    /// Applies a scale factor to the pose (scales the translation component).
    pub fn scale_translation(&mut self, scale: f64) {
        let translation = self.translation() * scale;
        self.set_translation(translation);
    }

    /// Checks that the columns of the rotation block are unit length and mutually
    /// orthogonal within `tolerance`.
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let rotation = self.rotation();
        (rotation.transpose() * rotation - Matrix3::identity()).amax() <= tolerance
    }

    /// The pose without its last row, which is how renderers take a camera matrix.
    pub fn camera_matrix(&self) -> Matrix3x4<f64> {
        self.0.fixed_slice::<3, 4>(0, 0).into_owned()
    }

    /// The homogeneous matrix as a list of rows.
    pub fn rows(&self) -> [[f64; 4]; 4] {
        let m = &self.0;
        [0, 1, 2, 3].map(|r| [m[(r, 0)], m[(r, 1)], m[(r, 2)], m[(r, 3)]])
    }
}

impl From<[[f64; 4]; 4]> for CameraToWorld {
    fn from(rows: [[f64; 4]; 4]) -> Self {
        Self(Matrix4::from_fn(|r, c| rows[r][c]))
    }
}

impl From<CameraToWorld> for [[f64; 4]; 4] {
    fn from(pose: CameraToWorld) -> Self {
        pose.rows()
    }
}
