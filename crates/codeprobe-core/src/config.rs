//! Locations and limits for the persisted model artifacts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_NAME: &str = "microsoft/codebert-base";
pub const DEFAULT_MODEL_DIR: &str = "models/codebert-base";
pub const DEFAULT_CLASSIFIER_WEIGHTS: &str = "models/classifier.json";
/// CodeBERT's maximum sequence length, special tokens included.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Where to find the encoder and classifier, and how to feed the encoder.
///
/// `model_dir` must contain `model.onnx` and `tokenizer.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    #[serde(default = "default_classifier_weights")]
    pub classifier_weights: PathBuf,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            model_dir: default_model_dir(),
            classifier_weights: default_classifier_weights(),
            max_length: default_max_length(),
        }
    }
}

impl ModelConfig {
    pub fn onnx_path(&self) -> PathBuf {
        self.model_dir.join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    pub fn with_model_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.model_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_classifier_weights(mut self, path: impl AsRef<Path>) -> Self {
        self.classifier_weights = path.as_ref().to_path_buf();
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_DIR)
}

fn default_classifier_weights() -> PathBuf {
    PathBuf::from(DEFAULT_CLASSIFIER_WEIGHTS)
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}
