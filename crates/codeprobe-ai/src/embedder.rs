//! Embedding capability and the pooling step shared by encoder backends.

use codeprobe_core::{Embedding, ModelError};

/// Turns source text into a fixed-length dense vector.
///
/// Implementations must be deterministic for a fixed model and input, and
/// must truncate inputs longer than the encoder's context instead of failing.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Embedding, ModelError>;

    /// Length of every vector returned by [`embed`](Self::embed).
    fn dim(&self) -> usize;
}

/// Mean-pool token vectors over the sequence axis, weighted by the attention mask.
///
/// `hidden` is the flattened `[batch, seq_len, dim]` last hidden state and
/// `mask` the flattened `[batch, mask_seq_len]` attention mask. Padding
/// positions (mask 0) are skipped. A row with no attended tokens pools to zeros.
/// No normalisation is applied.
pub fn mean_pool(
    hidden: &[f32],
    mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    dim: usize,
) -> Vec<Vec<f32>> {
    let mask_seq_len = if batch_size == 0 {
        0
    } else {
        mask.len() / batch_size
    };

    let mut pooled_rows = Vec::with_capacity(batch_size);
    for i in 0..batch_size {
        let mut pooled = vec![0.0f32; dim];
        let mut token_count = 0.0f32;

        for j in 0..seq_len.min(mask_seq_len) {
            let mask_val = mask[i * mask_seq_len + j] as f32;
            if mask_val > 0.0 {
                let offset = (i * seq_len + j) * dim;
                for (d, p) in pooled.iter_mut().enumerate() {
                    *p += hidden[offset + d] * mask_val;
                }
                token_count += mask_val;
            }
        }

        if token_count > 0.0 {
            for p in &mut pooled {
                *p /= token_count;
            }
        }
        pooled_rows.push(pooled);
    }

    pooled_rows
}
