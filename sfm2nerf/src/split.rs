//! Partitioning a dataset into training and test frames by frame number.

use crate::{extract::basename, Error, Frame, NormalizedDataset, Result};
use log::*;
use std::{path::Path, str::FromStr};

/// An inclusive range of frame numbers, written `first-last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRange {
    pub first: u64,
    pub last: u64,
}

impl FrameRange {
    pub fn contains(&self, number: u64) -> bool {
        self.first <= number && number <= self.last
    }
}

impl FromStr for FrameRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRange {
            range: s.to_owned(),
        };
        let (first, last) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            first: first.trim().parse().map_err(|_| invalid())?,
            last: last.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// How test frames are picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMode {
    /// Every `n`-th frame number, skipping frame `1` and the last frame number.
    /// `Every(0)` picks no test frames.
    Every(u64),
    /// Frame numbers inside any of the ranges.
    Ranges(Vec<FrameRange>),
}

impl SplitMode {
    pub fn is_test_frame(&self, frame_count: usize, number: u64) -> bool {
        match self {
            Self::Every(n) => {
                *n != 0 && 1 < number && number < frame_count as u64 && number % n == 0
            }
            Self::Ranges(ranges) => ranges.iter().any(|range| range.contains(number)),
        }
    }
}

impl Default for SplitMode {
    fn default() -> Self {
        Self::Every(3)
    }
}

/// The number a frame is named after: the stem of its file name.
pub fn frame_number(file_path: &str) -> Result<u64> {
    let name = basename(file_path);
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    stem.parse().map_err(|_| Error::FrameNumber {
        file_path: file_path.to_owned(),
    })
}

/// A dataset partitioned into training and test frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: NormalizedDataset,
    pub test: NormalizedDataset,
}

impl Split {
    /// Partitions the frames of `dataset`, keeping their order and every other field.
    pub fn new(dataset: &NormalizedDataset, mode: &SplitMode) -> Result<Self> {
        let frame_count = dataset.frames.len();
        let mut train: Vec<Frame> = vec![];
        let mut test: Vec<Frame> = vec![];
        for frame in &dataset.frames {
            if mode.is_test_frame(frame_count, frame_number(&frame.file_path)?) {
                test.push(frame.clone());
            } else {
                train.push(frame.clone());
            }
        }
        info!(
            "split {} frames into {} train and {} test",
            frame_count,
            train.len(),
            test.len()
        );
        Ok(Self {
            train: dataset.with_frames(train),
            test: dataset.with_frames(test),
        })
    }

    /// Writes `transforms_train.json`, `transforms_test.json` and `transforms_val.json`
    /// into `dir`. The validation set is the test set.
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        self.train.write_path(dir.join("transforms_train.json"))?;
        self.test.write_path(dir.join("transforms_test.json"))?;
        self.test.write_path(dir.join("transforms_val.json"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sfm2nerf_core::{nalgebra::Point2, CameraToWorld, Intrinsics};

    fn dataset(count: usize) -> NormalizedDataset {
        let frames = (1..=count)
            .map(|n| Frame {
                file_path: format!("images/{:04}.jpg", n),
                transform_matrix: CameraToWorld::identity(),
            })
            .collect();
        let intrinsics = Intrinsics::new(64.0, 48.0, 50.0, Point2::new(32.0, 24.0));
        NormalizedDataset::assemble(&intrinsics, 16, frames)
    }

    fn numbers(dataset: &NormalizedDataset) -> Vec<u64> {
        dataset
            .frames
            .iter()
            .map(|frame| frame_number(&frame.file_path).unwrap())
            .collect()
    }

    #[test]
    fn frame_numbers() {
        assert_eq!(frame_number("images/0012.jpg").unwrap(), 12);
        assert_eq!(frame_number("C:\\images\\7.png").unwrap(), 7);
        assert_eq!(frame_number("42").unwrap(), 42);
        assert!(matches!(
            frame_number("images/left.jpg"),
            Err(Error::FrameNumber { .. })
        ));
    }

    #[test]
    fn ranges_parse() {
        assert_eq!(
            "3-8".parse::<FrameRange>().unwrap(),
            FrameRange { first: 3, last: 8 }
        );
        for bad in ["3", "a-b", "3-", "-3", ""] {
            assert!(matches!(
                bad.parse::<FrameRange>(),
                Err(Error::InvalidRange { .. })
            ));
        }
    }

    #[test]
    fn every_third_skips_the_ends() {
        let split = Split::new(&dataset(10), &SplitMode::Every(3)).unwrap();
        assert_eq!(numbers(&split.test), [3, 6, 9]);
        assert_eq!(numbers(&split.train), [1, 2, 4, 5, 7, 8, 10]);

        // The last frame number is never a test frame.
        let split = Split::new(&dataset(9), &SplitMode::Every(3)).unwrap();
        assert_eq!(numbers(&split.test), [3, 6]);
    }

    #[test]
    fn ranges_are_inclusive() {
        let mode = SplitMode::Ranges(vec![
            FrameRange { first: 2, last: 3 },
            FrameRange { first: 9, last: 20 },
        ]);
        let split = Split::new(&dataset(10), &mode).unwrap();
        assert_eq!(numbers(&split.test), [2, 3, 9, 10]);
        assert_eq!(split.train.camera_angle_x, split.test.camera_angle_x);
    }

    #[test]
    fn every_zero_keeps_everything_for_training() {
        let split = Split::new(&dataset(5), &SplitMode::Every(0)).unwrap();
        assert!(split.test.frames.is_empty());
        assert_eq!(split.train.frames.len(), 5);
    }

    #[test]
    fn writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let split = Split::new(&dataset(6), &SplitMode::default()).unwrap();
        split.write_dir(dir.path()).unwrap();
        let val = NormalizedDataset::from_path(dir.path().join("transforms_val.json")).unwrap();
        assert_eq!(numbers(&val), [3]);
        assert_eq!(val.aabb_scale, 16);
        let train =
            NormalizedDataset::from_path(dir.path().join("transforms_train.json")).unwrap();
        assert_eq!(numbers(&train), [1, 2, 4, 5, 6]);
    }
}
