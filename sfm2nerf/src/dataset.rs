use crate::{Error, Result};
use log::*;
use serde::{Deserialize, Serialize};
use sfm2nerf_core::{nalgebra::Point2, CameraToWorld, Intrinsics};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

/// One training image and the camera that took it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Image path relative to the dataset file.
    pub file_path: String,
    /// Camera-to-world transform written as four rows.
    pub transform_matrix: CameraToWorld,
}

/// A NeRF `transforms.json` dataset.
///
/// Keys other than the ones below are carried through loading and writing untouched,
/// so datasets produced by other tools survive a split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
    /// Horizontal field of view in radians.
    pub camera_angle_x: f64,
    /// Vertical field of view in radians.
    pub camera_angle_y: f64,
    pub fl_x: f64,
    pub fl_y: f64,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
    pub aabb_scale: u32,
    pub frames: Vec<Frame>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NormalizedDataset {
    /// Combines the shared camera model with the normalized frames.
    pub fn assemble(intrinsics: &Intrinsics, aabb_scale: u32, frames: Vec<Frame>) -> Self {
        let fov = intrinsics.field_of_view();
        info!(
            "field of view is {:.3} x {:.3} degrees",
            fov.x_degrees(),
            fov.y_degrees()
        );
        Self {
            camera_angle_x: fov.x,
            camera_angle_y: fov.y,
            fl_x: intrinsics.focal_length,
            fl_y: intrinsics.focal_length,
            cx: intrinsics.principal_point.x,
            cy: intrinsics.principal_point.y,
            w: intrinsics.width,
            h: intrinsics.height,
            aabb_scale,
            frames,
            extra: Default::default(),
        }
    }

    /// The camera model, using the horizontal focal length for both axes.
    pub fn intrinsics(&self) -> Intrinsics {
        Intrinsics::new(self.w, self.h, self.fl_x, Point2::new(self.cx, self.cy))
    }

    /// A copy of the dataset with a different list of frames.
    pub fn with_frames(&self, frames: Vec<Frame>) -> Self {
        Self {
            camera_angle_x: self.camera_angle_x,
            camera_angle_y: self.camera_angle_y,
            fl_x: self.fl_x,
            fl_y: self.fl_y,
            cx: self.cx,
            cy: self.cy,
            w: self.w,
            h: self.h,
            aabb_scale: self.aabb_scale,
            frames,
            extra: self.extra.clone(),
        }
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Writes the dataset as pretty-printed JSON.
    pub fn to_writer(&self, writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| {
            if e.is_io() {
                Error::Output { source: e.into() }
            } else {
                e.into()
            }
        })
    }

    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer).map_err(|e| match e {
            Error::Output { source } => Error::io(path, source),
            e => e,
        })?;
        writer.flush().map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn dataset() -> NormalizedDataset {
        let intrinsics = Intrinsics::new(1920.0, 1080.0, 1600.0, Point2::new(960.0, 540.0));
        let frames = vec![Frame {
            file_path: "images/0001.jpg".to_owned(),
            transform_matrix: CameraToWorld::identity(),
        }];
        NormalizedDataset::assemble(&intrinsics, 16, frames)
    }

    #[test]
    fn assemble_fills_trainer_fields() {
        let dataset = dataset();
        assert_relative_eq!(dataset.camera_angle_x, 1.0808, epsilon = 1e-4);
        assert_eq!(dataset.fl_x, dataset.fl_y);
        assert_eq!((dataset.cx, dataset.cy), (960.0, 540.0));
        assert_eq!((dataset.w, dataset.h), (1920.0, 1080.0));
        assert_eq!(dataset.intrinsics().field_of_view().x, dataset.camera_angle_x);
    }

    #[test]
    fn writes_trainer_layout() {
        let value = serde_json::to_value(dataset()).unwrap();
        assert_eq!(value["aabb_scale"], 16);
        assert_eq!(value["frames"][0]["file_path"], "images/0001.jpg");
        assert_eq!(
            value["frames"][0]["transform_matrix"][3],
            serde_json::json!([0.0, 0.0, 0.0, 1.0])
        );
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn keeps_unknown_keys() {
        let mut value = serde_json::to_value(dataset()).unwrap();
        value["sharpen"] = serde_json::json!(0.5);
        let dataset: NormalizedDataset = serde_json::from_value(value).unwrap();
        assert_eq!(dataset.extra["sharpen"], 0.5);
        let again = serde_json::to_value(dataset.with_frames(vec![])).unwrap();
        assert_eq!(again["sharpen"], 0.5);
        assert_eq!(again["frames"], serde_json::json!([]));
    }

    /// Accepts a few bytes, then fails like a full disk.
    struct FullDisk {
        room: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.room == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no space left on device",
                ));
            }
            let written = buf.len().min(self.room);
            self.room -= written;
            Ok(written)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_not_malformed_input() {
        let result = dataset().to_writer(FullDisk { room: 32 });
        match result {
            Err(Error::Output { source }) => {
                assert_eq!(source.to_string(), "no space left on device")
            }
            other => panic!("wrote {:?}", other),
        }
    }
}
