//! Presentation-ready view of a pipeline outcome.
//!
//! Every output surface (terminal card, JSON, web page) renders a [`Report`],
//! so the wording, colours and rounding live in one place.

use std::fmt;

use serde::Serialize;

use crate::language::Language;
use crate::result::{ClassificationResult, Label};

pub const HUMAN_COLOR: &str = "#6DD400";
pub const AI_COLOR: &str = "#FF6347";
pub const HUMAN_HEADLINE_COLOR: &str = "green";
pub const AI_HEADLINE_COLOR: &str = "orange";

/// Outcome of one submission, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    /// The validator found no reserved words; nothing was classified.
    Rejected { message: String },
    Classified(Breakdown),
    /// Embedding or classification failed for this submission.
    Failed { message: String },
}

/// Probability split of a classified submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub label: Label,
    pub headline: String,
    /// Text colour of the headline.
    pub headline_color: &'static str,
    /// Accent colour of the chart and progress bar.
    pub color: &'static str,
    pub ai_probability: f32,
    pub human_probability: f32,
    /// Rounded to two decimals; `100 - ai_percentage` exactly.
    pub human_percentage: f32,
    /// Rounded to two decimals.
    pub ai_percentage: f32,
    /// Percentage of the winning label, rounded to two decimals.
    pub winning_percentage: f32,
}

impl Report {
    pub fn rejected(language: Language) -> Self {
        Self::Rejected {
            message: format!(
                "The uploaded file does not contain valid {language} code. \
                 Please upload a valid {language} file."
            ),
        }
    }

    pub fn classified(result: &ClassificationResult) -> Self {
        let (headline, headline_color, color) = match result.label() {
            Label::Human => (
                "We are highly confident this code is written by a human",
                HUMAN_HEADLINE_COLOR,
                HUMAN_COLOR,
            ),
            Label::Ai => (
                "We are highly confident this code is generated by AI",
                AI_HEADLINE_COLOR,
                AI_COLOR,
            ),
        };
        let (human_percentage, ai_percentage) = result.rounded_percentages();
        let winning_percentage = match result.label() {
            Label::Human => human_percentage,
            Label::Ai => ai_percentage,
        };
        Self::Classified(Breakdown {
            label: result.label(),
            headline: headline.to_string(),
            headline_color,
            color,
            ai_probability: result.ai_probability(),
            human_probability: result.human_probability(),
            human_percentage,
            ai_percentage,
            winning_percentage,
        })
    }

    pub fn failed(cause: impl fmt::Display) -> Self {
        Self::Failed {
            message: format!("Classification failed: {cause}"),
        }
    }

    pub fn breakdown(&self) -> Option<&Breakdown> {
        match self {
            Self::Classified(b) => Some(b),
            _ => None,
        }
    }
}

impl Breakdown {
    /// Display name of the winning label ("human" or "AI").
    pub fn label_title(&self) -> &'static str {
        match self.label {
            Label::Human => "human",
            Label::Ai => "AI",
        }
    }

    /// One-line probability summary, both values to two decimals.
    pub fn summary_line(&self) -> String {
        format!(
            "{:.2}% Probability Human-generated | {:.2}% Probability AI-generated",
            self.human_percentage, self.ai_percentage
        )
    }

    /// Winning percentage as a fraction in 0..=1, for progress widgets.
    pub fn winning_fraction(&self) -> f32 {
        (self.winning_percentage / 100.0).clamp(0.0, 1.0)
    }
}
