//! Feed-forward authorship classifier over CodeBERT embeddings.
//!
//! The reference network is 768 -> 128 -> 256 -> 512 -> 256 -> 128 -> 1 with
//! ELU hidden layers, dropout (rate 0.5) after every hidden layer, and a
//! single sigmoid output giving P(AI). Dropout only matters during training
//! and is skipped here.
//!
//! Weights are stored as JSON:
//!
//! ```json
//! {
//!   "input_dim": 768,
//!   "layers": [
//!     { "type": "dense", "kernel": [[...], ...], "bias": [...], "activation": "elu" },
//!     { "type": "dropout", "rate": 0.5 },
//!     { "type": "dense", "kernel": [[...], ...], "bias": [...], "activation": "sigmoid" }
//!   ]
//! }
//! ```
//!
//! Kernels are input-major (`kernel[i][j]` connects input `i` to unit `j`).

use std::fmt;
use std::path::Path;

use codeprobe_core::{Embedding, ModelError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Units per dense layer of the reference network, output layer included.
pub const REFERENCE_UNITS: &[usize] = &[128, 256, 512, 256, 128, 1];

/// Scores an embedding with the probability that the code is AI-generated.
pub trait Classifier: Send + Sync {
    /// Returns P(AI) in `[0, 1]`.
    fn predict(&self, embedding: &Embedding) -> Result<f32, ModelError>;

    /// Embedding dimension the classifier was trained on.
    fn input_dim(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Exponential linear unit, alpha = 1.
    Elu,
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Self::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            Self::Sigmoid => sigmoid(x),
            Self::Linear => x,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elu => "elu",
            Self::Sigmoid => "sigmoid",
            Self::Linear => "linear",
        }
    }
}

/// One layer of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    Dense {
        kernel: Vec<Vec<f32>>,
        bias: Vec<f32>,
        activation: Activation,
    },
    /// Training-time regulariser; identity at inference.
    Dropout { rate: f32 },
}

impl Layer {
    fn forward(&self, input: Vec<f32>) -> Vec<f32> {
        match self {
            Self::Dense {
                kernel,
                bias,
                activation,
            } => {
                let mut out = bias.clone();
                for (&x, row) in input.iter().zip(kernel) {
                    for (o, &w) in out.iter_mut().zip(row) {
                        *o += x * w;
                    }
                }
                for o in &mut out {
                    *o = activation.apply(*o);
                }
                out
            }
            Self::Dropout { .. } => input,
        }
    }
}

/// Inconsistent layer shapes in a weight set.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("network has no dense layers")]
    NoDenseLayers,

    #[error("layer {layer}: kernel rows have differing widths")]
    RaggedKernel { layer: usize },

    #[error("layer {layer}: bias has {actual} entries, kernel has {expected} units")]
    BiasLength {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("layer {layer}: kernel takes {actual} inputs, previous layer produces {expected}")]
    InputMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("layer {layer}: dropout rate {rate} outside [0, 1)")]
    DropoutRate { layer: usize, rate: f32 },

    #[error("output layer has {0} units, expected 1")]
    OutputUnits(usize),

    #[error("output layer uses {0} activation, expected sigmoid")]
    OutputActivation(&'static str),
}

#[derive(Serialize, Deserialize)]
struct WeightsFile {
    input_dim: usize,
    layers: Vec<Layer>,
}

/// Dense/dropout stack with a single sigmoid output.
///
/// Built once from a weight file and never mutated, so prediction is
/// deterministic.
#[derive(Debug, Clone)]
pub struct FeedForwardClassifier {
    input_dim: usize,
    layers: Vec<Layer>,
}

impl FeedForwardClassifier {
    /// Build a classifier, checking that consecutive layer shapes line up and
    /// that the network ends in one sigmoid unit.
    pub fn new(input_dim: usize, layers: Vec<Layer>) -> Result<Self, LayoutError> {
        let mut width = input_dim;
        let mut last_dense = None;

        for (idx, layer) in layers.iter().enumerate() {
            match layer {
                Layer::Dense {
                    kernel,
                    bias,
                    activation,
                } => {
                    if kernel.len() != width {
                        return Err(LayoutError::InputMismatch {
                            layer: idx,
                            expected: width,
                            actual: kernel.len(),
                        });
                    }
                    let units = kernel.first().map(Vec::len).unwrap_or(bias.len());
                    if kernel.iter().any(|row| row.len() != units) {
                        return Err(LayoutError::RaggedKernel { layer: idx });
                    }
                    if bias.len() != units {
                        return Err(LayoutError::BiasLength {
                            layer: idx,
                            expected: units,
                            actual: bias.len(),
                        });
                    }
                    width = units;
                    last_dense = Some((units, *activation));
                }
                Layer::Dropout { rate } => {
                    if !(0.0..1.0).contains(rate) {
                        return Err(LayoutError::DropoutRate {
                            layer: idx,
                            rate: *rate,
                        });
                    }
                }
            }
        }

        match last_dense {
            None => return Err(LayoutError::NoDenseLayers),
            Some((units, _)) if units != 1 => return Err(LayoutError::OutputUnits(units)),
            Some((_, act)) if act != Activation::Sigmoid => {
                return Err(LayoutError::OutputActivation(act.as_str()));
            }
            Some(_) => {}
        }

        Ok(Self { input_dim, layers })
    }

    /// Load weights from a JSON file.
    ///
    /// Any I/O, parse, or shape error is reported as `ArtifactLoadFailure`.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|e| ModelError::artifact(path, e))?;
        let file: WeightsFile =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::artifact(path, e))?;
        let classifier =
            Self::new(file.input_dim, file.layers).map_err(|e| ModelError::artifact(path, e))?;

        info!(
            input_dim = classifier.input_dim,
            dense_layers = classifier.units().len(),
            reference_layout = classifier.matches_reference_layout(),
            weights = %path.display(),
            "loaded classifier"
        );
        Ok(classifier)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Units of each dense layer, in order.
    pub fn units(&self) -> Vec<usize> {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                Layer::Dense { bias, .. } => Some(bias.len()),
                Layer::Dropout { .. } => None,
            })
            .collect()
    }

    /// True for the 768 -> 128 -> 256 -> 512 -> 256 -> 128 -> 1 network.
    pub fn matches_reference_layout(&self) -> bool {
        self.input_dim == 768 && self.units() == REFERENCE_UNITS
    }

    /// Human-readable summary of the layer stack.
    pub fn layout(&self) -> Layout<'_> {
        Layout(self)
    }
}

impl Classifier for FeedForwardClassifier {
    fn predict(&self, embedding: &Embedding) -> Result<f32, ModelError> {
        if embedding.dim() != self.input_dim {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_dim,
                actual: embedding.dim(),
            });
        }

        let output = self
            .layers
            .iter()
            .fold(embedding.as_slice().to_vec(), |acc, layer| layer.forward(acc));

        // `new` guarantees the last dense layer has exactly one unit.
        Ok(output[0])
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }
}

/// Display adapter returned by [`FeedForwardClassifier::layout`].
pub struct Layout<'a>(&'a FeedForwardClassifier);

impl fmt::Display for Layout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut width = self.0.input_dim;
        writeln!(f, "input      {width}")?;
        for layer in &self.0.layers {
            match layer {
                Layer::Dense {
                    bias, activation, ..
                } => {
                    writeln!(
                        f,
                        "dense      {width} -> {} ({})",
                        bias.len(),
                        activation.as_str()
                    )?;
                    width = bias.len();
                }
                Layer::Dropout { rate } => {
                    writeln!(f, "dropout    {rate} (inactive)")?;
                }
            }
        }
        Ok(())
    }
}

/// Logistic sigmoid, stable for large |x|.
fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dense(kernel: Vec<Vec<f32>>, bias: Vec<f32>, activation: Activation) -> Layer {
        Layer::Dense {
            kernel,
            bias,
            activation,
        }
    }

    /// 2 -> 2 (elu, identity) -> dropout -> 1 (sigmoid, sum).
    fn tiny_net(with_dropout: bool) -> FeedForwardClassifier {
        let mut layers = vec![dense(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![0.0, 0.0],
            Activation::Elu,
        )];
        if with_dropout {
            layers.push(Layer::Dropout { rate: 0.5 });
        }
        layers.push(dense(vec![vec![1.0], vec![1.0]], vec![0.0], Activation::Sigmoid));
        FeedForwardClassifier::new(2, layers).unwrap()
    }

    #[test]
    fn zero_input_gives_half() {
        let p = tiny_net(true).predict(&Embedding::new(vec![0.0, 0.0])).unwrap();
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn elu_then_sigmoid_known_value() {
        // elu(1) + elu(-1) = 1 + (e^-1 - 1) = e^-1
        let p = tiny_net(true).predict(&Embedding::new(vec![1.0, -1.0])).unwrap();
        let expected = sigmoid((-1.0f32).exp());
        assert!((p - expected).abs() < 1e-6, "got {p}, expected {expected}");
        assert!((p - 0.5909).abs() < 1e-3);
    }

    #[test]
    fn dropout_is_noop_at_inference() {
        let with = tiny_net(true);
        let without = tiny_net(false);
        for input in [[0.3, -2.0], [5.0, 1.0], [-0.1, -0.1]] {
            let e = Embedding::new(input.to_vec());
            assert_eq!(with.predict(&e).unwrap(), without.predict(&e).unwrap());
        }
    }

    #[test]
    fn output_always_in_unit_interval() {
        let net = tiny_net(true);
        for input in [[1e6, 1e6], [-1e6, -1e6], [1e-9, -1e-9], [80.0, 80.0]] {
            let p = net.predict(&Embedding::new(input.to_vec())).unwrap();
            assert!((0.0..=1.0).contains(&p), "{input:?} -> {p}");
        }
    }

    #[test]
    fn predict_is_deterministic() {
        let net = tiny_net(true);
        let e = Embedding::new(vec![0.42, -0.17]);
        assert_eq!(net.predict(&e).unwrap(), net.predict(&e).unwrap());
    }

    #[test]
    fn wrong_dimension_is_shape_mismatch() {
        let err = tiny_net(true)
            .predict(&Embedding::new(vec![0.0; 768]))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::ShapeMismatch {
                expected: 2,
                actual: 768
            }
        ));
    }

    #[test]
    fn rejects_input_chain_mismatch() {
        let err = FeedForwardClassifier::new(
            3,
            vec![dense(vec![vec![1.0], vec![1.0]], vec![0.0], Activation::Sigmoid)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            LayoutError::InputMismatch {
                layer: 0,
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn rejects_ragged_kernel() {
        let err = FeedForwardClassifier::new(
            2,
            vec![dense(vec![vec![1.0, 2.0], vec![1.0]], vec![0.0, 0.0], Activation::Elu)],
        )
        .unwrap_err();
        assert_eq!(err, LayoutError::RaggedKernel { layer: 0 });
    }

    #[test]
    fn rejects_bias_length_mismatch() {
        let err = FeedForwardClassifier::new(
            1,
            vec![dense(vec![vec![1.0]], vec![0.0, 0.0], Activation::Sigmoid)],
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::BiasLength { .. }));
    }

    #[test]
    fn rejects_multi_unit_output() {
        let err = FeedForwardClassifier::new(
            1,
            vec![dense(vec![vec![1.0, 1.0]], vec![0.0, 0.0], Activation::Sigmoid)],
        )
        .unwrap_err();
        assert_eq!(err, LayoutError::OutputUnits(2));
    }

    #[test]
    fn rejects_zero_unit_output() {
        let err = FeedForwardClassifier::new(
            2,
            vec![dense(vec![vec![], vec![]], vec![], Activation::Sigmoid)],
        )
        .unwrap_err();
        assert_eq!(err, LayoutError::OutputUnits(0));
    }

    #[test]
    fn rejects_non_sigmoid_output() {
        let err = FeedForwardClassifier::new(
            1,
            vec![dense(vec![vec![1.0]], vec![0.0], Activation::Elu)],
        )
        .unwrap_err();
        assert_eq!(err, LayoutError::OutputActivation("elu"));
    }

    #[test]
    fn rejects_empty_network() {
        let err = FeedForwardClassifier::new(4, vec![Layer::Dropout { rate: 0.5 }]).unwrap_err();
        assert_eq!(err, LayoutError::NoDenseLayers);
    }

    #[test]
    fn rejects_bad_dropout_rate() {
        let err = FeedForwardClassifier::new(
            1,
            vec![
                Layer::Dropout { rate: 1.5 },
                dense(vec![vec![1.0]], vec![0.0], Activation::Sigmoid),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::DropoutRate { layer: 0, .. }));
    }

    #[test]
    fn load_from_json_file() {
        let json = r#"{
            "input_dim": 2,
            "layers": [
                { "type": "dense", "kernel": [[1.0, 0.0], [0.0, 1.0]], "bias": [0.0, 0.0], "activation": "elu" },
                { "type": "dropout", "rate": 0.5 },
                { "type": "dense", "kernel": [[1.0], [1.0]], "bias": [0.0], "activation": "sigmoid" }
            ]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let clf = FeedForwardClassifier::load(file.path()).unwrap();
        assert_eq!(clf.input_dim(), 2);
        assert_eq!(clf.units(), vec![2, 1]);
        assert_eq!(clf.layers().len(), 3);
        assert!(!clf.matches_reference_layout());

        let p = clf.predict(&Embedding::new(vec![0.0, 0.0])).unwrap();
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn load_missing_file_is_artifact_failure() {
        let err = FeedForwardClassifier::load(Path::new("/nonexistent/classifier.json")).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactLoadFailure { .. }));
    }

    #[test]
    fn load_malformed_json_is_artifact_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = FeedForwardClassifier::load(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactLoadFailure { .. }));
    }

    #[test]
    fn load_inconsistent_shapes_is_artifact_failure() {
        let json = r#"{
            "input_dim": 3,
            "layers": [
                { "type": "dense", "kernel": [[1.0]], "bias": [0.0], "activation": "sigmoid" }
            ]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let err = FeedForwardClassifier::load(file.path()).unwrap_err();
        match err {
            ModelError::ArtifactLoadFailure { reason, .. } => {
                assert!(reason.contains("previous layer produces 3"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reference_layout_is_recognised() {
        let mut layers = Vec::new();
        let mut width = 768;
        for (i, &units) in REFERENCE_UNITS.iter().enumerate() {
            let last = i == REFERENCE_UNITS.len() - 1;
            layers.push(dense(
                vec![vec![0.0; units]; width],
                vec![0.0; units],
                if last { Activation::Sigmoid } else { Activation::Elu },
            ));
            if !last {
                layers.push(Layer::Dropout { rate: 0.5 });
            }
            width = units;
        }
        let clf = FeedForwardClassifier::new(768, layers).unwrap();
        assert!(clf.matches_reference_layout());

        let p = clf.predict(&Embedding::new(vec![0.1; 768])).unwrap();
        assert!((p - 0.5).abs() < 1e-6);

        let layout = clf.layout().to_string();
        assert!(layout.contains("dense      768 -> 128 (elu)"));
        assert!(layout.contains("dense      128 -> 1 (sigmoid)"));
        assert!(layout.contains("dropout    0.5 (inactive)"));
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < f32::EPSILON);
    }
}
