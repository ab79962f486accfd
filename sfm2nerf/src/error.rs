use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input document is not a well-formed SfM record or dataset.
    #[error("malformed input: {source}")]
    MalformedInput {
        #[from]
        source: serde_json::Error,
    },
    #[error("unable to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Writing an output document failed partway through.
    #[error("unable to write output: {source}")]
    Output { source: std::io::Error },
    /// No ray pair cleared the weight threshold in the attention center stage.
    #[error(
        "attention center stage: cannot establish scene center, none of the {pairs} ray pairs \
         from {frames} frames has a weight above {threshold}"
    )]
    InsufficientConvergence {
        frames: usize,
        pairs: usize,
        threshold: f64,
    },
    /// Every recentered camera sits on the scene center.
    #[error(
        "scale stage: cannot establish scene scale, all {frames} cameras coincide with the scene center"
    )]
    ZeroMeanDistance { frames: usize },
    #[error("frame path {file_path:?} does not name a numbered frame")]
    FrameNumber { file_path: String },
    #[error("invalid frame range {range:?}, expected `first-last`")]
    InvalidRange { range: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(message: impl std::fmt::Display) -> Self {
        Self::MalformedInput {
            source: serde::de::Error::custom(message),
        }
    }
}
