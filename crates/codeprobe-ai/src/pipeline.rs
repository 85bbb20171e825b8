//! Validate -> embed -> classify, once per submission.
//!
//! ```text
//! Idle -> Validating -> Embedding -> Classifying -> Done
//!                    \-> Rejected
//! ```
//!
//! `Rejected` and `Done` are terminal. Errors from the embedder or the
//! classifier abort the run and are returned with the stage they came from.
//! Nothing is retried.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use codeprobe_core::{
    ClassificationResult, ModelError, PipelineError, Report, SourceSubmission, Stage,
};
use tracing::{debug, error, warn};

use crate::models::LoadedModels;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Validating,
    Embedding,
    Classifying,
    Done,
    Rejected,
}

impl PipelineState {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Validating)
                | (Self::Validating, Self::Embedding)
                | (Self::Validating, Self::Rejected)
                | (Self::Embedding, Self::Classifying)
                | (Self::Classifying, Self::Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Embedding => "embedding",
            Self::Classifying => "classifying",
            Self::Done => "done",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The validator found no reserved words; nothing was embedded.
    Rejected,
    Classified(ClassificationResult),
}

impl Verdict {
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            Self::Rejected => None,
            Self::Classified(r) => Some(r),
        }
    }
}

/// Tracks the current state of one run and logs every transition.
struct Run {
    state: PipelineState,
    entered: Instant,
}

impl Run {
    fn start() -> Self {
        Self {
            state: PipelineState::Idle,
            entered: Instant::now(),
        }
    }

    fn enter(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        let elapsed_ms = self.entered.elapsed().as_secs_f64() * 1000.0;
        debug!(from = %self.state, to = %next, elapsed_ms, "pipeline transition");
        self.state = next;
        self.entered = Instant::now();
    }
}

/// Orchestrates one classification per call over a shared, read-only model context.
#[derive(Clone)]
pub struct Pipeline {
    models: Arc<LoadedModels>,
}

impl Pipeline {
    pub fn new(models: Arc<LoadedModels>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &LoadedModels {
        &self.models
    }

    /// Run a submission through the pipeline.
    pub fn classify_submission(
        &self,
        submission: &SourceSubmission,
    ) -> Result<Verdict, PipelineError> {
        let mut run = Run::start();

        run.enter(PipelineState::Validating);
        let language = submission.language();
        if !language.accepts(submission.content()) {
            warn!(
                language = %language,
                file = submission.file_name().unwrap_or("-"),
                bytes = submission.len(),
                "submission rejected: no reserved words found"
            );
            run.enter(PipelineState::Rejected);
            return Ok(Verdict::Rejected);
        }

        run.enter(PipelineState::Embedding);
        let embedding = self
            .models
            .embedder()
            .embed(submission.content())
            .map_err(|e| PipelineError::new(Stage::Embedding, e))?;

        run.enter(PipelineState::Classifying);
        let ai_probability = self
            .models
            .classifier()
            .predict(&embedding)
            .map_err(|e| PipelineError::new(Stage::Classifying, e))?;
        if !(0.0..=1.0).contains(&ai_probability) {
            return Err(PipelineError::new(
                Stage::Classifying,
                ModelError::InvalidProbability(ai_probability),
            ));
        }

        run.enter(PipelineState::Done);
        let result = ClassificationResult::from_ai_probability(ai_probability);
        debug!(label = %result.label(), ai_probability, "classified");
        Ok(Verdict::Classified(result))
    }

    /// Run a submission and turn any outcome, failures included, into a [`Report`].
    pub fn report(&self, submission: &SourceSubmission) -> Report {
        match self.classify_submission(submission) {
            Ok(Verdict::Rejected) => Report::rejected(submission.language()),
            Ok(Verdict::Classified(result)) => Report::classified(&result),
            Err(err) => {
                error!(stage = %err.stage, error = %err.source, "classification failed");
                Report::failed(&err)
            }
        }
    }
}
