//! The camera section of an SfM record, as written by Meshroom's `cameras.sfm`.
//!
//! Meshroom writes every number and identifier as a JSON string, while other exporters write
//! plain numbers. Both are accepted here. Keys other than the ones read below are ignored.

use crate::{Error, Result};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};
use sfm2nerf_core::{nalgebra::Point2, Intrinsics, WorldToCamera};
use std::{collections::HashMap, fmt, fs::File, io::Read, path::Path, str::FromStr};

/// The views, poses and intrinsics of an SfM reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfmRecord {
    pub views: Vec<SfmView>,
    pub poses: Vec<SfmPose>,
    /// Only the first entry is used: every view is assumed to share one camera model.
    pub intrinsics: Vec<SfmIntrinsic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfmView {
    #[serde(deserialize_with = "identifier")]
    pub view_id: String,
    #[serde(deserialize_with = "identifier")]
    pub pose_id: String,
    /// Path of the source image. Only its basename is kept in the output.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfmPose {
    #[serde(deserialize_with = "identifier")]
    pub pose_id: String,
    pub pose: SfmPoseData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfmPoseData {
    pub transform: SfmTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfmTransform {
    /// The camera rotation in column-major order.
    #[serde(deserialize_with = "scalars")]
    pub rotation: [f64; 9],
    /// The camera center in SfM world space.
    #[serde(deserialize_with = "scalars")]
    pub center: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfmIntrinsic {
    #[serde(deserialize_with = "scalar")]
    pub width: f64,
    #[serde(deserialize_with = "scalar")]
    pub height: f64,
    #[serde(deserialize_with = "scalar")]
    pub px_focal_length: f64,
    #[serde(deserialize_with = "scalars")]
    pub principal_point: [f64; 2],
}

impl SfmRecord {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let record: Self = serde_json::from_reader(reader)?;
        record.intrinsic()?;
        Ok(record)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// The shared camera model, which is the first intrinsic entry.
    pub fn intrinsic(&self) -> Result<&SfmIntrinsic> {
        self.intrinsics
            .first()
            .ok_or_else(|| Error::malformed("the record has no intrinsics"))
    }

    /// Poses keyed by their id. A later pose with a repeated id replaces an earlier one.
    pub fn pose_map(&self) -> HashMap<&str, &SfmPose> {
        self.poses
            .iter()
            .map(|pose| (pose.pose_id.as_str(), pose))
            .collect()
    }
}

impl FromStr for SfmRecord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(s)?;
        record.intrinsic()?;
        Ok(record)
    }
}

impl SfmPose {
    pub fn world_to_camera(&self) -> WorldToCamera {
        let transform = &self.pose.transform;
        WorldToCamera::from_sfm(&transform.rotation, &transform.center)
    }
}

impl SfmIntrinsic {
    pub fn intrinsics(&self) -> Intrinsics {
        Intrinsics::new(
            self.width,
            self.height,
            self.px_focal_length,
            Point2::new(self.principal_point[0], self.principal_point[1]),
        )
    }
}

/// A number that may be written as a JSON number or as a numeric string.
struct Scalar(f64);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a finite number or a finite numeric string")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
                if v.is_finite() {
                    Ok(Scalar(v))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                Ok(Scalar(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                v.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Scalar)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// An identifier that may be written as a string or as an integer.
struct Identifier(String);

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdentifierVisitor;

        impl<'de> Visitor<'de> for IdentifierVisitor {
            type Value = Identifier;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer identifier")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Identifier, E> {
                Ok(Identifier(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Identifier, E> {
                Ok(Identifier(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Identifier, E> {
                Ok(Identifier(v.to_owned()))
            }
        }

        deserializer.deserialize_any(IdentifierVisitor)
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Scalar::deserialize(deserializer).map(|s| s.0)
}

fn scalars<'de, D, const N: usize>(deserializer: D) -> Result<[f64; N], D::Error>
where
    D: Deserializer<'de>,
    [Scalar; N]: Deserialize<'de>,
{
    <[Scalar; N]>::deserialize(deserializer).map(|array| array.map(|s| s.0))
}

fn identifier<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Identifier::deserialize(deserializer).map(|id| id.0)
}
