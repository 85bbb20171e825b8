//! Terminal cards for classification reports and the loaded models.

use codeprobe_ai::{Classifier, FeedForwardClassifier};
use codeprobe_core::report::Breakdown;
use codeprobe_core::{ModelConfig, Report, SourceSubmission};

const BAR_WIDTH: usize = 40;

// ── Public API ──

/// Print a report as a vertical card: submission, verdict, breakdown.
pub fn print_report_card(submission: &SourceSubmission, report: &Report, model_name: &str) {
    let name = submission.file_name().unwrap_or("<stdin>");
    println!("=== {name} ===");
    println!();

    println!("Submission");
    println!("  {:<26} {}", "language", submission.language());
    println!("  {:<26} {}", "bytes", submission.len());
    println!("  {:<26} {}", "lines", submission.content().lines().count());
    println!("  {:<26} {}", "model", model_name);
    println!();

    match report {
        Report::Rejected { message } => {
            println!("Warning");
            println!("  {message}");
        }
        Report::Failed { message } => {
            println!("Error");
            println!("  {message}");
        }
        Report::Classified(b) => print_breakdown(b),
    }
    println!();
}

/// Print the encoder settings and the classifier's layer stack.
pub fn print_model_card(config: &ModelConfig, classifier: &FeedForwardClassifier) {
    println!("=== {} ===", config.model_name);
    println!();

    println!("Encoder");
    println!("  {:<26} {}", "model_dir", config.model_dir.display());
    println!("  {:<26} {}", "max_length", config.max_length);
    println!("  {:<26} {}", "embedding_dim", classifier.input_dim());
    println!();

    println!("Classifier");
    println!("  {:<26} {}", "weights", config.classifier_weights.display());
    println!(
        "  {:<26} {}",
        "reference_layout",
        if classifier.matches_reference_layout() {
            "yes"
        } else {
            "no"
        }
    );
    for line in classifier.layout().to_string().lines() {
        println!("    {line}");
    }
    println!();
}

// ── Sections ──

fn print_breakdown(b: &Breakdown) {
    println!("Verdict");
    println!("  {:<26} {}", "label", b.label_title());
    println!("  {}", b.headline);
    println!();

    println!("Probability Breakdown");
    println!("  {:<26} {:.2}%", "human", b.human_percentage);
    println!("  {:<26} {:.2}%", "ai", b.ai_percentage);
    println!("  {}", b.summary_line());
    println!(
        "  {} {:.2}%",
        progress_bar(b.winning_fraction(), BAR_WIDTH),
        b.winning_percentage
    );
}

// ── Helpers ──

/// `[#####-----]` with `width` cells, filled in proportion to `fraction`.
fn progress_bar(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
