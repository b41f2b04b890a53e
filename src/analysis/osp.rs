use super::{AnalysisBackend, AnalysisError, AnalysisOutput};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tasks the analysis runtime knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OspTask {
    RepoMap,
    Ranking,
    ImpactAnalyzer,
    ContextGatherer,
}

impl OspTask {
    pub fn script_name(self) -> &'static str {
        match self {
            Self::RepoMap => "repomap_osp",
            Self::Ranking => "ranking_algorithms",
            Self::ImpactAnalyzer => "impact_analyzer",
            Self::ContextGatherer => "context_gatherer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFile {
    #[serde(alias = "file")]
    pub path: String,
    #[serde(default, alias = "relevance")]
    pub score: f64,
}

/// Typed queries over an [`AnalysisBackend`].
pub struct OspClient<B> {
    backend: B,
}

impl<B: AnalysisBackend> OspClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn list_files(&self) -> Result<Vec<String>, AnalysisError> {
        self.query(OspTask::RepoMap, Map::new()).await
    }

    pub async fn list_functions(&self, file_path: &str) -> Result<Vec<String>, AnalysisError> {
        let mut args = Map::new();
        args.insert("file_path".to_string(), Value::from(file_path));
        self.query(OspTask::RepoMap, args).await
    }

    /// Rank repository files, best first, using the named strategy
    /// (`default`, `complexity`, `impact`, ...).
    pub async fn rank_files(&self, strategy: &str) -> Result<Vec<RankedFile>, AnalysisError> {
        let mut args = Map::new();
        args.insert("strategy".to_string(), Value::from(strategy));
        self.query(OspTask::Ranking, args).await
    }

    pub async fn file_dependencies(&self, file_path: &str) -> Result<Vec<String>, AnalysisError> {
        let mut args = Map::new();
        args.insert("file_path".to_string(), Value::from(file_path));
        self.query(OspTask::ImpactAnalyzer, args).await
    }

    pub async fn search_nodes(
        &self,
        query: &str,
        node_type: Option<&str>,
    ) -> Result<Vec<Value>, AnalysisError> {
        let mut args = Map::new();
        args.insert("query".to_string(), Value::from(query));
        args.insert(
            "node_type".to_string(),
            node_type.map_or(Value::Null, Value::from),
        );
        self.query(OspTask::ContextGatherer, args).await
    }

    async fn query<T: DeserializeOwned>(
        &self,
        task: OspTask,
        args: Map<String, Value>,
    ) -> Result<Vec<T>, AnalysisError> {
        let output = self.backend.run(task.script_name(), &args).await?;
        decode_list(task.script_name(), output)
    }
}

fn decode_list<T: DeserializeOwned>(
    task: &str,
    output: AnalysisOutput,
) -> Result<Vec<T>, AnalysisError> {
    match output {
        AnalysisOutput::Empty | AnalysisOutput::Json(Value::Null) => Ok(Vec::new()),
        AnalysisOutput::Json(value) => {
            serde_json::from_value(value).map_err(|error| AnalysisError::UnexpectedOutput {
                task: task.to_string(),
                detail: error.to_string(),
            })
        }
        AnalysisOutput::Text(text) => Err(AnalysisError::UnexpectedOutput {
            task: task.to_string(),
            detail: format!("expected a JSON list, got text: {text}"),
        }),
    }
}
