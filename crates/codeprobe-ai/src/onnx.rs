//! ONNX Runtime backend for CodeBERT-style encoders.
//!
//! The model directory must contain `model.onnx` (an encoder export whose
//! first output is the last hidden state `[batch, seq, hidden]`) and the
//! matching `tokenizer.json`.

use std::path::Path;
use std::sync::Mutex;

use codeprobe_core::{Embedding, ModelError};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedder::{Embedder, mean_pool};

/// Hidden size of `microsoft/codebert-base`, used if the export has a dynamic last axis.
const FALLBACK_DIM: usize = 768;

/// Encoder + tokenizer pair producing mean-pooled embeddings.
///
/// The session is locked for the duration of each forward pass; everything
/// else is read-only after [`load`](Self::load).
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dim: usize,
    feeds_type_ids: bool,
}

impl OnnxEmbedder {
    /// Load an encoder from a directory containing `model.onnx` and `tokenizer.json`.
    ///
    /// Inputs longer than `max_length` tokens are truncated.
    pub fn load(model_dir: &Path, max_length: usize) -> Result<Self, ModelError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            return Err(ModelError::artifact(&model_path, "model.onnx not found"));
        }
        if !tokenizer_path.exists() {
            return Err(ModelError::artifact(
                &tokenizer_path,
                "tokenizer.json not found",
            ));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::artifact(&model_path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::artifact(&model_path, e))?
            .commit_from_file(&model_path)
            .map_err(|e| ModelError::artifact(&model_path, e))?;

        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(FALLBACK_DIM);
        let feeds_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::artifact(&tokenizer_path, e))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ModelError::artifact(&tokenizer_path, e))?;

        // Batch-longest padding; a single input is never padded.
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(
            dim,
            max_length,
            feeds_type_ids,
            model = %model_path.display(),
            "loaded encoder"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dim,
            feeds_type_ids,
        })
    }

    /// Embed a batch of texts, one vector per input.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, ModelError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::encoding(format!("tokenize: {e}")))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Flat input tensors: [batch_size, seq_len].
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }
        debug!(batch_size, seq_len, "tokenized");

        let shape = [batch_size as i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))
            .map_err(ModelError::encoding)?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))
            .map_err(ModelError::encoding)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::encoding("encoder session lock poisoned"))?;

        let run = if self.feeds_type_ids {
            let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))
                .map_err(ModelError::encoding)?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])
        };
        let outputs = run.map_err(|e| ModelError::encoding(format!("forward pass: {e}")))?;

        // Last hidden state: [batch_size, seq_len, dim].
        let (output_shape, output_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ModelError::encoding)?;
        let dims: &[i64] = output_shape;
        if dims.len() != 3 || dims[0] as usize != batch_size || dims[2] as usize != self.dim {
            return Err(ModelError::encoding(format!(
                "unexpected output shape {dims:?}, expected [{batch_size}, {seq_len}, {}]",
                self.dim
            )));
        }

        let actual_seq_len = dims[1] as usize;
        let pooled = mean_pool(
            output_data,
            &attention_mask,
            batch_size,
            actual_seq_len,
            self.dim,
        );

        Ok(pooled.into_iter().map(Embedding::new).collect())
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, ModelError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::encoding("encoder returned no embedding"))
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Try to infer the hidden size from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
