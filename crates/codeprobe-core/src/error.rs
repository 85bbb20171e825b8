use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the encoder, the classifier, or model loading.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("encoding failed: {0}")]
    EncodingFailure(String),

    #[error("embedding has {actual} dimensions, classifier expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("classifier invoked before model weights were loaded")]
    UninitializedModel,

    #[error("failed to load model artifact {path}: {reason}")]
    ArtifactLoadFailure { path: PathBuf, reason: String },

    #[error("classifier returned {0}, expected a probability in [0, 1]")]
    InvalidProbability(f32),
}

impl ModelError {
    pub fn encoding(err: impl fmt::Display) -> Self {
        Self::EncodingFailure(err.to_string())
    }

    pub fn artifact(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::ArtifactLoadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Pipeline stage that can fail. Validation never fails, so it has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    Classifying,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Classifying => "classifying",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classification aborted in `stage` because of `source`.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ModelError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: ModelError) -> Self {
        Self { stage, source }
    }
}
