//! Inference layer: CodeBERT embeddings through ONNX Runtime, a feed-forward
//! authorship classifier, and the pipeline that chains them.

pub mod classifier;
pub mod embedder;
pub mod models;
pub mod pipeline;

#[cfg(feature = "onnx")]
mod onnx;

pub use classifier::{Activation, Classifier, FeedForwardClassifier, Layer};
pub use embedder::{Embedder, mean_pool};
pub use models::{LoadedModels, ModelSlot};
#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;
pub use pipeline::{Pipeline, PipelineState, Verdict};
