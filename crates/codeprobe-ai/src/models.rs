//! One-shot model loading.
//!
//! [`LoadedModels`] bundles the encoder and classifier into a read-only
//! context that the pipeline borrows through an `Arc`. [`ModelSlot`] makes
//! loading idempotent: the loader runs until it first succeeds, and every
//! later call hands back the same shared context.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use codeprobe_core::ModelError;
#[cfg(feature = "onnx")]
use codeprobe_core::ModelConfig;
use tracing::info;

use crate::classifier::Classifier;
use crate::embedder::Embedder;

/// Encoder, tokenizer and classifier weights, loaded once and shared read-only.
pub struct LoadedModels {
    model_name: String,
    embedder: Box<dyn Embedder>,
    classifier: Box<dyn Classifier>,
}

impl LoadedModels {
    /// Bundle an embedder and a classifier.
    ///
    /// Fails with `ShapeMismatch` if the embedder's output dimension differs
    /// from the classifier's input dimension.
    pub fn new(
        model_name: impl Into<String>,
        embedder: impl Embedder + 'static,
        classifier: impl Classifier + 'static,
    ) -> Result<Self, ModelError> {
        if embedder.dim() != classifier.input_dim() {
            return Err(ModelError::ShapeMismatch {
                expected: classifier.input_dim(),
                actual: embedder.dim(),
            });
        }
        Ok(Self {
            model_name: model_name.into(),
            embedder: Box::new(embedder),
            classifier: Box::new(classifier),
        })
    }

    /// Load the ONNX encoder and the classifier weights named by `config`.
    #[cfg(feature = "onnx")]
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        let embedder = crate::onnx::OnnxEmbedder::load(&config.model_dir, config.max_length)?;
        let classifier =
            crate::classifier::FeedForwardClassifier::load(&config.classifier_weights)?;
        let models = Self::new(config.model_name.clone(), embedder, classifier)?;
        info!(model = %config.model_name, dim = models.dim(), "models ready");
        Ok(models)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Embedding dimension shared by both models.
    pub fn dim(&self) -> usize {
        self.embedder.dim()
    }
}

/// Holder that loads [`LoadedModels`] at most once.
pub struct ModelSlot {
    cell: OnceLock<Arc<LoadedModels>>,
    init: Mutex<()>,
}

impl ModelSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Run `load` unless models are already present, then return the shared models.
    ///
    /// A failed load leaves the slot empty so a later call can retry; a
    /// successful one makes every further call a no-op.
    pub fn load_with<F>(&self, load: F) -> Result<Arc<LoadedModels>, ModelError>
    where
        F: FnOnce() -> Result<LoadedModels, ModelError>,
    {
        if let Some(models) = self.cell.get() {
            return Ok(Arc::clone(models));
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(models) = self.cell.get() {
            return Ok(Arc::clone(models));
        }

        let models = Arc::new(load()?);
        info!(model = models.model_name(), "model slot initialised");
        Ok(Arc::clone(self.cell.get_or_init(|| models)))
    }

    /// Shared models, or `UninitializedModel` if nothing has been loaded yet.
    pub fn get(&self) -> Result<Arc<LoadedModels>, ModelError> {
        self.cell
            .get()
            .cloned()
            .ok_or(ModelError::UninitializedModel)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self::new()
    }
}
