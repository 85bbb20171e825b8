mod display;
mod web;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use codeprobe_ai::{FeedForwardClassifier, LoadedModels, Pipeline};
use codeprobe_core::config::{DEFAULT_CLASSIFIER_WEIGHTS, DEFAULT_MAX_LENGTH, DEFAULT_MODEL_DIR};
use codeprobe_core::{Language, ModelConfig, Report, SourceSubmission};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codeprobe", version)]
#[command(about = "Tell AI-generated Java source from human-written code")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a single source file
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the report as JSON instead of a card
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        models: ModelArgs,
    },
    /// Serve the upload page over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "CODEPROBE_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,

        /// Largest accepted upload, in KiB
        #[arg(long, default_value_t = 1024)]
        max_upload_kb: usize,

        #[command(flatten)]
        models: ModelArgs,
    },
    /// Describe the configured encoder and classifier
    Inspect {
        #[command(flatten)]
        models: ModelArgs,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Directory holding model.onnx and tokenizer.json
    #[arg(long, env = "CODEPROBE_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    /// Classifier weights (JSON)
    #[arg(long, env = "CODEPROBE_CLASSIFIER", default_value = DEFAULT_CLASSIFIER_WEIGHTS)]
    classifier: PathBuf,

    /// Encoder context length in tokens; longer inputs are truncated
    #[arg(long, env = "CODEPROBE_MAX_LENGTH", default_value_t = DEFAULT_MAX_LENGTH)]
    max_length: usize,
}

impl ModelArgs {
    fn config(&self) -> ModelConfig {
        ModelConfig::default()
            .with_model_dir(&self.model_dir)
            .with_classifier_weights(&self.classifier)
            .with_max_length(self.max_length)
    }

    fn load(&self) -> anyhow::Result<Pipeline> {
        let config = self.config();
        let models = LoadedModels::load(&config).context("loading models")?;
        Ok(Pipeline::new(Arc::new(models)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("codeprobe v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Check {
            file,
            json,
            models,
        } => cmd_check(&file, json, &models.load()?),
        Command::Serve {
            bind,
            max_upload_kb,
            models,
        } => {
            let pipeline = models.load()?;
            web::serve(pipeline, bind, upload_limit_bytes(max_upload_kb)).await
        }
        Command::Inspect { models } => cmd_inspect(&models),
    }
}

fn upload_limit_bytes(max_upload_kb: usize) -> usize {
    max_upload_kb.saturating_mul(1024)
}

/// A classified file, ready to print.
struct Checked {
    submission: SourceSubmission,
    report: Report,
    /// Set when the file name does not look like the language it is checked as.
    warning: Option<String>,
}

fn check_file(path: &Path, pipeline: &Pipeline) -> anyhow::Result<Checked> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let (language, warning) = match Language::from_path(path) {
        Some(language) => (language, None),
        None => {
            let language = Language::default();
            let warning = format!(
                "{} does not have a .{} extension; checking it as {} anyway",
                path.display(),
                language.extension(),
                language
            );
            (language, Some(warning))
        }
    };

    let mut submission = SourceSubmission::from_utf8(bytes, language)
        .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
    if let Some(name) = path.file_name() {
        submission = submission.with_file_name(name.to_string_lossy());
    }

    let report = pipeline.report(&submission);
    Ok(Checked {
        submission,
        report,
        warning,
    })
}

fn cmd_check(path: &Path, json: bool, pipeline: &Pipeline) -> anyhow::Result<()> {
    let checked = check_file(path, pipeline)?;
    if let Some(warning) = &checked.warning {
        eprintln!("  warning: {warning}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&checked.report)?);
    } else {
        display::print_report_card(
            &checked.submission,
            &checked.report,
            pipeline.models().model_name(),
        );
    }

    if let Report::Failed { message } = &checked.report {
        bail!("{message}");
    }
    Ok(())
}

fn cmd_inspect(models: &ModelArgs) -> anyhow::Result<()> {
    let config = models.config();
    let classifier = FeedForwardClassifier::load(&config.classifier_weights)
        .context("loading classifier weights")?;

    let onnx = config.onnx_path();
    let tokenizer = config.tokenizer_path();
    if !onnx.exists() || !tokenizer.exists() {
        bail!(
            "encoder export not found under {} (expected model.onnx and tokenizer.json)",
            config.model_dir.display()
        );
    }

    display::print_model_card(&config, &classifier);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    use codeprobe_ai::{Classifier, Embedder};
    use codeprobe_core::{Embedding, ModelError};
    use tempfile::TempDir;

    struct StubEmbedder {
        fail: bool,
    }

    impl Embedder for StubEmbedder {
        fn embed(&self, _text: &str) -> Result<Embedding, ModelError> {
            if self.fail {
                return Err(ModelError::encoding("runtime unavailable"));
            }
            Ok(Embedding::new(vec![0.0; 4]))
        }

        fn dim(&self) -> usize {
            4
        }
    }

    struct StubClassifier(f32);

    impl Classifier for StubClassifier {
        fn predict(&self, _embedding: &Embedding) -> Result<f32, ModelError> {
            Ok(self.0)
        }

        fn input_dim(&self) -> usize {
            4
        }
    }

    fn stub_pipeline(fail_embed: bool, p_ai: f32) -> Pipeline {
        let models = LoadedModels::new(
            "stub",
            StubEmbedder { fail: fail_embed },
            StubClassifier(p_ai),
        )
        .unwrap();
        Pipeline::new(Arc::new(models))
    }

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn check_java_file_is_classified() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "Foo.java", b"public class Foo { void bar() {} }");

        let checked = check_file(&path, &stub_pipeline(false, 0.73)).unwrap();
        assert!(checked.warning.is_none());
        assert_eq!(checked.submission.file_name(), Some("Foo.java"));
        let b = checked.report.breakdown().expect("should be classified");
        assert_eq!(
            b.summary_line(),
            "27.00% Probability Human-generated | 73.00% Probability AI-generated"
        );
    }

    #[test]
    fn check_warns_on_other_extensions() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.txt", b"static int x;");

        let checked = check_file(&path, &stub_pipeline(false, 0.2)).unwrap();
        let warning = checked.warning.expect("extension warning");
        assert!(warning.contains("notes.txt"));
        assert!(warning.contains(".java extension"));
        assert!(checked.report.breakdown().is_some());
    }

    #[test]
    fn check_keyword_free_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "Hello.java", b"hello world");

        let checked = check_file(&path, &stub_pipeline(false, 0.9)).unwrap();
        assert!(matches!(checked.report, Report::Rejected { .. }));
        let json = serde_json::to_value(&checked.report).unwrap();
        assert_eq!(json["status"], "rejected");
    }

    #[test]
    fn check_reports_embedding_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "Foo.java", b"class Foo {}");

        let checked = check_file(&path, &stub_pipeline(true, 0.5)).unwrap();
        assert!(matches!(checked.report, Report::Failed { .. }));
        assert!(cmd_check(&path, true, &stub_pipeline(true, 0.5)).is_err());
    }

    #[test]
    fn check_rejects_non_utf8_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "Bin.java", &[0xff, 0xfe, 0x00]);
        assert!(check_file(&path, &stub_pipeline(false, 0.5)).is_err());
    }

    #[test]
    fn upload_limit_saturates() {
        assert_eq!(upload_limit_bytes(1024), 1024 * 1024);
        assert_eq!(upload_limit_bytes(usize::MAX), usize::MAX);
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["codeprobe", "serve"]).unwrap();
        let Command::Serve {
            bind,
            max_upload_kb,
            models,
        } = cli.command
        else {
            panic!("expected serve");
        };
        assert_eq!(bind.port(), 8501);
        assert_eq!(max_upload_kb, 1024);
        assert_eq!(models.max_length, 512);
        assert_eq!(models.config().model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
    }

    #[test]
    fn check_takes_file_and_overrides() {
        let cli = Cli::try_parse_from([
            "codeprobe",
            "check",
            "Foo.java",
            "--json",
            "--classifier",
            "weights/clf.json",
            "--max-length",
            "256",
        ])
        .unwrap();
        let Command::Check { file, json, models } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(file, PathBuf::from("Foo.java"));
        assert!(json);
        let config = models.config();
        assert_eq!(config.classifier_weights, PathBuf::from("weights/clf.json"));
        assert_eq!(config.max_length, 256);
    }
}
