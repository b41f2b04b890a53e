use super::{AnalysisBackend, AnalysisError, AnalysisOutput};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Environment variable carrying the task arguments as a JSON object.
pub const ARGS_ENV: &str = "OSP_ARGS";

/// Runs each task as `<runtime> run <task>.jac` inside the analysis workspace.
#[derive(Debug, Clone)]
pub struct SubprocessBackend {
    runtime: String,
    workspace: PathBuf,
}

impl SubprocessBackend {
    pub fn new(runtime: impl Into<String>, workspace: PathBuf) -> Self {
        Self {
            runtime: runtime.into(),
            workspace,
        }
    }

    /// Ask the runtime for its version string.
    pub async fn version(&self) -> Result<String, AnalysisError> {
        let output = Command::new(&self.runtime)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| AnalysisError::Spawn {
                task: "--version".to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(AnalysisError::Failed {
                task: "--version".to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn validate_task_name(task: &str) -> Result<(), AnalysisError> {
    let valid = !task.is_empty()
        && task
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(AnalysisError::InvalidTask(task.to_string()))
    }
}

#[async_trait]
impl AnalysisBackend for SubprocessBackend {
    #[instrument(skip(self, args), fields(runtime = %self.runtime))]
    async fn run(
        &self,
        task: &str,
        args: &Map<String, Value>,
    ) -> Result<AnalysisOutput, AnalysisError> {
        validate_task_name(task)?;
        let script = format!("{task}.jac");

        let mut command = Command::new(&self.runtime);
        command
            .arg("run")
            .arg(&script)
            .current_dir(&self.workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !args.is_empty() {
            command.env(ARGS_ENV, Value::Object(args.clone()).to_string());
        }

        debug!(script = %script, "running analysis task");
        let output = command
            .output()
            .await
            .map_err(|source| AnalysisError::Spawn {
                task: task.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(code = ?output.status.code(), stderr = %stderr, "analysis task failed");
            return Err(AnalysisError::Failed {
                task: task.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(AnalysisOutput::from_stdout(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}
