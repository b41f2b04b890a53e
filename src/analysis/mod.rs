//! Repository analysis ("OSP") backed by an external runtime.
//!
//! The backend is reached through [`AnalysisBackend`], so callers work with
//! [`OspClient`]'s typed queries and never build task names themselves.

mod osp;
mod subprocess;

pub use osp::{OspClient, OspTask, RankedFile};
pub use subprocess::{SubprocessBackend, ARGS_ENV};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid analysis task name: {0:?}")]
    InvalidTask(String),

    #[error("failed to start analysis runtime for task {task}: {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis task {task} failed (exit code {code:?}): {stderr}")]
    Failed {
        task: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("analysis task {task} returned unexpected output: {detail}")]
    UnexpectedOutput { task: String, detail: String },
}

/// What an analysis task printed, decoded as JSON when possible.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutput {
    Empty,
    Json(Value),
    Text(String),
}

impl AnalysisOutput {
    /// Decode trimmed stdout: nothing, JSON, or raw text as a fallback.
    pub fn from_stdout(stdout: &str) -> Self {
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str(trimmed) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn run(
        &self,
        task: &str,
        args: &Map<String, Value>,
    ) -> Result<AnalysisOutput, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_decodes_json_text_and_empty() {
        assert_eq!(AnalysisOutput::from_stdout("  \n"), AnalysisOutput::Empty);
        assert_eq!(
            AnalysisOutput::from_stdout("[1, 2]\n"),
            AnalysisOutput::Json(json!([1, 2]))
        );
        assert_eq!(
            AnalysisOutput::from_stdout("ranking done\n"),
            AnalysisOutput::Text("ranking done".to_string())
        );
    }
}
