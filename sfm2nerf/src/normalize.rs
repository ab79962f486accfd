use crate::{Error, Frame, NormalizeSettings, NormalizedDataset, PoseExtractor, Result, SfmRecord};
use log::*;
use sfm2nerf_core::{
    nalgebra::{Point3, Rotation3, Vector3},
    Ray,
};
use sfm2nerf_geom::{
    Attention, AttentionEstimator, ClosestApproachEstimator, UpAlignment, UpEstimator,
};

/// What the normalization found out about the rig along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport {
    /// Views skipped because their pose is missing from the record.
    pub dropped_views: Vec<String>,
    /// The estimated up direction before alignment.
    pub up: Vector3<f64>,
    /// The rotation applied to every frame to make `up` vertical.
    pub up_rotation: Rotation3<f64>,
    /// Set when the camera up axes cancel out and no rotation was applied.
    pub degenerate_up: bool,
    /// The scene center in the up-aligned frame, which became the origin.
    pub attention_point: Point3<f64>,
    pub accepted_pairs: usize,
    pub considered_pairs: usize,
    /// Mean camera distance from the scene center before scaling.
    pub average_distance: f64,
    /// The factor applied to every camera translation.
    pub scale: f64,
}

/// The output of a normalization run.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub dataset: NormalizedDataset,
    pub report: NormalizationReport,
}

/// Rotates every frame so the summed camera up axis points along the estimator's target.
pub fn align_up(frames: &mut [Frame], estimator: &UpEstimator) -> UpAlignment {
    let alignment = estimator.estimate(frames.iter().map(|frame| frame.transform_matrix.up()));
    info!("up vector was {}", alignment.up);
    for frame in frames.iter_mut() {
        frame.transform_matrix.rotate(&alignment.rotation);
    }
    alignment
}

/// Moves the point the cameras look at to the origin.
///
/// `threshold` is only used to describe the failure when no ray pair converges.
pub fn recenter<A>(
    frames: &mut [Frame],
    estimator: &A,
    threshold: f64,
) -> Result<(Point3<f64>, Attention)>
where
    A: AttentionEstimator + ?Sized,
{
    let rays: Vec<Ray> = frames
        .iter()
        .map(|frame| frame.transform_matrix.ray())
        .collect();
    let attention = estimator.attention(&rays);
    let point = attention
        .point()
        .ok_or(Error::InsufficientConvergence {
            frames: frames.len(),
            pairs: attention.considered_pairs,
            threshold,
        })?;
    info!("the cameras are looking at {}", point);
    let offset = -point.coords;
    for frame in frames.iter_mut() {
        frame.transform_matrix.translate(&offset);
    }
    Ok((point, attention))
}

/// Scales every camera translation so the mean distance from the origin becomes `target`.
///
/// Returns the mean distance before scaling and the applied scale factor.
pub fn rescale(frames: &mut [Frame], target: f64, epsilon: f64) -> Result<(f64, f64)> {
    let total: f64 = frames
        .iter()
        .map(|frame| frame.transform_matrix.translation().norm())
        .sum();
    let average = total / frames.len() as f64;
    if average.is_nan() || average <= epsilon {
        return Err(Error::ZeroMeanDistance {
            frames: frames.len(),
        });
    }
    info!("avg camera distance from origin {}", average);
    let scale = target / average;
    for frame in frames.iter_mut() {
        frame.transform_matrix.scale_translation(scale);
    }
    Ok((average, scale))
}

/// Runs the four normalization stages over an SfM record.
///
/// ```no_run
/// use sfm2nerf::{Normalizer, NormalizeSettings, SfmRecord};
///
/// let record = SfmRecord::from_path("cameras.sfm").unwrap();
/// let normalized = Normalizer::new(NormalizeSettings::default())
///     .normalize(&record, "images")
///     .unwrap();
/// normalized.dataset.write_path("transforms.json").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Normalizer<A = ClosestApproachEstimator> {
    settings: NormalizeSettings,
    extractor: PoseExtractor,
    up: UpEstimator,
    attention: A,
}

impl Normalizer {
    /// Creates a normalizer with a [`ClosestApproachEstimator`] configured from `settings`.
    pub fn new(settings: NormalizeSettings) -> Self {
        let attention = ClosestApproachEstimator::new()
            .epsilon(settings.epsilon)
            .minimum_weight(settings.minimum_pair_weight);
        Self::with_estimator(settings, attention)
    }
}

impl<A> Normalizer<A>
where
    A: AttentionEstimator,
{
    /// Creates a normalizer that finds the scene center with `attention`.
    pub fn with_estimator(settings: NormalizeSettings, attention: A) -> Self {
        Self {
            settings,
            extractor: PoseExtractor::new(),
            up: UpEstimator::new().epsilon(settings.epsilon),
            attention,
        }
    }

    /// Set the pose extractor used for the first stage.
    #[must_use]
    pub fn extractor(self, extractor: PoseExtractor) -> Self {
        Self { extractor, ..self }
    }

    pub fn settings(&self) -> &NormalizeSettings {
        &self.settings
    }

    /// Extracts, up-aligns, recenters and rescales the frames of `record`, then assembles
    /// the dataset with image paths inside `image_dir`.
    pub fn normalize(&self, record: &SfmRecord, image_dir: &str) -> Result<Normalized> {
        let intrinsics = record.intrinsic()?.intrinsics();
        let extraction = self.extractor.extract(record, image_dir);
        let mut frames = extraction.frames;

        let alignment = align_up(&mut frames, &self.up);
        info!("computing center of attention");
        let (attention_point, attention) = recenter(
            &mut frames,
            &self.attention,
            self.settings.minimum_pair_weight,
        )?;
        let (average_distance, scale) = rescale(
            &mut frames,
            self.settings.target_mean_distance,
            self.settings.epsilon,
        )?;

        Ok(Normalized {
            dataset: NormalizedDataset::assemble(&intrinsics, self.settings.aabb_scale, frames),
            report: NormalizationReport {
                dropped_views: extraction.dropped_views,
                up: alignment.up,
                up_rotation: alignment.rotation,
                degenerate_up: alignment.degenerate,
                attention_point,
                accepted_pairs: attention.accepted_pairs,
                considered_pairs: attention.considered_pairs,
                average_distance,
                scale,
            },
        })
    }
}
