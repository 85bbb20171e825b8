pub mod config;
pub mod error;
pub mod language;
pub mod report;
pub mod result;
pub mod submission;
pub mod validator;

pub use config::ModelConfig;
pub use error::{ModelError, PipelineError, Stage};
pub use language::Language;
pub use report::Report;
pub use result::{ClassificationResult, Embedding, Label};
pub use submission::SourceSubmission;
pub use validator::is_valid;
