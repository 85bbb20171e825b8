//! Values produced by the pipeline: embeddings and classification results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed-length dense vector summarising a piece of source code.
///
/// Produced by mean-pooling the encoder's last hidden layer. Read-only once
/// built.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Predicted authorship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Human,
    Ai,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complementary probability split for one submission.
///
/// Only the AI probability comes from the classifier; the human probability
/// is `1 - p_ai`, so the two always sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    ai_probability: f32,
    human_probability: f32,
    label: Label,
}

impl ClassificationResult {
    /// Build a result from the classifier's probability that the code is
    /// AI-generated.
    ///
    /// The label is `Human` only when `p_human > p_ai`; an exact 0.5 tie
    /// falls through to `Ai`.
    pub fn from_ai_probability(ai_probability: f32) -> Self {
        let human_probability = 1.0 - ai_probability;
        let label = if human_probability > ai_probability {
            Label::Human
        } else {
            Label::Ai
        };
        Self {
            ai_probability,
            human_probability,
            label,
        }
    }

    pub fn ai_probability(&self) -> f32 {
        self.ai_probability
    }

    pub fn human_probability(&self) -> f32 {
        self.human_probability
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// P(AI) scaled to 0..=100.
    pub fn ai_percentage(&self) -> f32 {
        self.ai_probability * 100.0
    }

    /// P(Human) scaled to 0..=100.
    pub fn human_percentage(&self) -> f32 {
        100.0 - self.ai_percentage()
    }

    /// Percentage of the winning label; sizes the proportion widget.
    pub fn winning_percentage(&self) -> f32 {
        match self.label {
            Label::Human => self.human_percentage(),
            Label::Ai => self.ai_percentage(),
        }
    }

    /// `(human, ai)` percentages rounded to two decimals.
    ///
    /// Only the AI share is rounded; the human share is its complement in
    /// hundredths, so the pair always adds up to exactly 100.00.
    pub fn rounded_percentages(&self) -> (f32, f32) {
        let ai_hundredths = (f64::from(self.ai_probability) * 10_000.0)
            .round()
            .clamp(0.0, 10_000.0) as u32;
        let human_hundredths = 10_000 - ai_hundredths;
        (
            human_hundredths as f32 / 100.0,
            ai_hundredths as f32 / 100.0,
        )
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (P(human)={:.3}, P(ai)={:.3})",
            self.label, self.human_probability, self.ai_probability
        )
    }
}
