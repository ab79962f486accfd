use crate::{Frame, SfmRecord};
use log::*;
use sfm2nerf_core::AxisConvention;

/// The frames recovered from an SfM record.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// One frame per view with a pose, in view order.
    pub frames: Vec<Frame>,
    /// Ids of views whose pose is missing from the record.
    pub dropped_views: Vec<String>,
}

/// Turns the views of an SfM record into frames with camera-to-world transforms in the
/// output axis convention.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PoseExtractor {
    convention: AxisConvention,
}

impl PoseExtractor {
    /// Creates a `PoseExtractor` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the axis convention applied to every camera-to-world transform.
    ///
    /// Default is [`AxisConvention::nerf`].
    #[must_use]
    pub fn convention(self, convention: AxisConvention) -> Self {
        Self { convention }
    }

    /// Builds one frame per view, naming its image after the basename of the view path
    /// inside `image_dir`.
    ///
    /// Views whose pose id is not in the record are skipped, which is normal for SfM output
    /// where some images fail to register.
    pub fn extract(&self, record: &SfmRecord, image_dir: &str) -> Extraction {
        let poses = record.pose_map();
        let mut frames = Vec::with_capacity(record.views.len());
        let mut dropped_views = vec![];
        for view in &record.views {
            let pose = match poses.get(view.pose_id.as_str()) {
                Some(pose) => pose,
                None => {
                    warn!(
                        "view {} references missing pose {}, dropping it",
                        view.view_id, view.pose_id
                    );
                    dropped_views.push(view.view_id.clone());
                    continue;
                }
            };
            frames.push(Frame {
                file_path: image_path(image_dir, &view.path),
                transform_matrix: self.convention.apply(pose.world_to_camera().inverse()),
            });
        }
        info!(
            "extracted {} frames from {} views",
            frames.len(),
            record.views.len()
        );
        Extraction {
            frames,
            dropped_views,
        }
    }
}

impl Default for PoseExtractor {
    fn default() -> Self {
        Self {
            convention: AxisConvention::nerf(),
        }
    }
}

/// The last component of a path, treating both `/` and `\` as separators.
pub fn basename(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}

/// Joins `image_dir` and the basename of `source` with a single `/`.
pub fn image_path(image_dir: &str, source: &str) -> String {
    let name = basename(source);
    if image_dir.is_empty() {
        name.to_owned()
    } else if image_dir.ends_with('/') || image_dir.ends_with('\\') {
        format!("{}{}", image_dir, name)
    } else {
        format!("{}/{}", image_dir, name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::{SfmIntrinsic, SfmPose, SfmPoseData, SfmTransform, SfmView};
    use approx::assert_relative_eq;
    use sfm2nerf_core::nalgebra::Vector3;

    fn view(id: &str, pose: &str, path: &str) -> SfmView {
        SfmView {
            view_id: id.to_owned(),
            pose_id: pose.to_owned(),
            path: path.to_owned(),
        }
    }

    fn pose(id: &str, center: [f64; 3]) -> SfmPose {
        SfmPose {
            pose_id: id.to_owned(),
            pose: SfmPoseData {
                transform: SfmTransform {
                    rotation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
                    center,
                },
            },
        }
    }

    fn record(views: Vec<SfmView>, poses: Vec<SfmPose>) -> SfmRecord {
        SfmRecord {
            views,
            poses,
            intrinsics: vec![SfmIntrinsic {
                width: 100.0,
                height: 100.0,
                px_focal_length: 80.0,
                principal_point: [50.0, 50.0],
            }],
        }
    }

    #[test]
    fn basenames() {
        assert_eq!(basename("/data/images/0001.jpg"), "0001.jpg");
        assert_eq!(basename("C:\\scans\\0002.jpg"), "0002.jpg");
        assert_eq!(basename("0003.jpg"), "0003.jpg");
    }

    #[test]
    fn joins_image_dir() {
        assert_eq!(image_path("images", "/a/b/1.jpg"), "images/1.jpg");
        assert_eq!(image_path("images/", "/a/b/1.jpg"), "images/1.jpg");
        assert_eq!(image_path("", "/a/b/1.jpg"), "1.jpg");
    }

    #[test]
    fn missing_pose_is_dropped() {
        let record = record(
            vec![
                view("1", "10", "/img/1.jpg"),
                view("2", "99", "/img/2.jpg"),
                view("3", "30", "/img/3.jpg"),
            ],
            vec![pose("30", [0.0, 0.0, 1.0]), pose("10", [1.0, 2.0, 3.0])],
        );
        let extraction = PoseExtractor::new().extract(&record, "images");
        assert_eq!(extraction.dropped_views, vec!["2".to_owned()]);
        let paths: Vec<&str> = extraction
            .frames
            .iter()
            .map(|frame| frame.file_path.as_str())
            .collect();
        assert_eq!(paths, ["images/1.jpg", "images/3.jpg"]);
    }

    #[test]
    fn center_moves_through_convention() {
        let record = record(
            vec![view("1", "1", "1.jpg")],
            vec![pose("1", [1.0, 2.0, 3.0])],
        );
        let frame = &PoseExtractor::new().extract(&record, "").frames[0];
        // x and y swap, then z flips.
        assert_relative_eq!(
            frame.transform_matrix.translation(),
            Vector3::new(2.0, 1.0, -3.0),
            epsilon = 1e-12
        );
        assert!(frame.transform_matrix.is_orthonormal(1e-12));
    }

    #[test]
    fn identity_convention_keeps_sfm_axes() {
        let record = record(
            vec![view("1", "1", "1.jpg")],
            vec![pose("1", [1.0, 2.0, 3.0])],
        );
        let frame = &PoseExtractor::new()
            .convention(AxisConvention::identity())
            .extract(&record, "")
            .frames[0];
        assert_relative_eq!(
            frame.transform_matrix.0,
            record.poses[0].world_to_camera().inverse().0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            frame.transform_matrix.translation(),
            Vector3::new(1.0, 2.0, 3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn shared_pose_serves_both_views() {
        let record = record(
            vec![view("1", "5", "1.jpg"), view("2", "5", "2.jpg")],
            vec![pose("5", [0.0, 1.0, 0.0])],
        );
        let extraction = PoseExtractor::new().extract(&record, "");
        assert_eq!(extraction.frames.len(), 2);
        assert_eq!(
            extraction.frames[0].transform_matrix,
            extraction.frames[1].transform_matrix
        );
    }
}
