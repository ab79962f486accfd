//! Driving an external renderer over the cameras of a dataset.

use crate::{extract::basename, Frame, NormalizedDataset};
use log::*;
use sfm2nerf_core::nalgebra::Matrix3x4;

/// A trained scene that renders images from arbitrary cameras.
///
/// Rendering itself happens elsewhere; this is everything the dataset side needs from it.
pub trait Renderer {
    type Image;

    /// Sets the horizontal field of view in degrees.
    fn set_fov_degrees(&mut self, fov: f64);

    /// Places the camera with a camera-to-world transform without its last row.
    fn set_camera_matrix(&mut self, camera: &Matrix3x4<f64>);

    fn render(&mut self, width: u32, height: u32, samples_per_pixel: u32) -> Self::Image;
}

/// The resolution, quality and number of frames to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    width: Option<u32>,
    height: Option<u32>,
    samples_per_pixel: u32,
    max_frames: usize,
}

impl RenderRequest {
    /// Creates a `RenderRequest` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the image width.
    ///
    /// Default is the dataset width.
    #[must_use]
    pub fn width(self, width: u32) -> Self {
        Self {
            width: Some(width),
            ..self
        }
    }

    /// Set the image height.
    ///
    /// Default is the dataset height.
    #[must_use]
    pub fn height(self, height: u32) -> Self {
        Self {
            height: Some(height),
            ..self
        }
    }

    /// Default is `16`.
    #[must_use]
    pub fn samples_per_pixel(self, samples_per_pixel: u32) -> Self {
        Self {
            samples_per_pixel,
            ..self
        }
    }

    /// Set roughly how many frames to render, spread evenly over the dataset.
    ///
    /// Default is `0`, which renders every frame.
    #[must_use]
    pub fn max_frames(self, max_frames: usize) -> Self {
        Self { max_frames, ..self }
    }
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            samples_per_pixel: 16,
            max_frames: 0,
        }
    }
}

/// A rendered image and the file name it should be saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame<I> {
    pub name: String,
    pub image: I,
}

/// The frames picked for rendering: with `max_frames = m > 0`, every `len / m`-th frame
/// (at least every frame), counting from one.
pub fn select_frames(frames: &[Frame], max_frames: usize) -> impl Iterator<Item = &Frame> {
    let stride = if max_frames > 0 {
        (frames.len() / max_frames).max(1)
    } else {
        1
    };
    frames.iter().skip(stride - 1).step_by(stride)
}

/// The file name of a rendered frame: the frame's basename, with `.png` added when it
/// has no extension.
pub fn output_name(file_path: &str) -> String {
    let name = basename(file_path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name.to_owned(),
        _ => format!("{}.png", name),
    }
}

/// Renders the selected frames of `dataset` from their own cameras.
pub fn render_frames<R: Renderer>(
    renderer: &mut R,
    dataset: &NormalizedDataset,
    request: &RenderRequest,
) -> Vec<RenderedFrame<R::Image>> {
    let width = request.width.unwrap_or(dataset.w.round() as u32);
    let height = request.height.unwrap_or(dataset.h.round() as u32);
    renderer.set_fov_degrees(dataset.camera_angle_x.to_degrees());
    select_frames(&dataset.frames, request.max_frames)
        .map(|frame| {
            let name = output_name(&frame.file_path);
            info!("rendering {} at {}x{}", name, width, height);
            renderer.set_camera_matrix(&frame.transform_matrix.camera_matrix());
            RenderedFrame {
                name,
                image: renderer.render(width, height, request.samples_per_pixel),
            }
        })
        .collect()
}
