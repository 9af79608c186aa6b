use crate::analysis::{normalize, AnalysisResult};
use crate::history::HistoryRecord;
use crate::llm::{build_analysis_prompt, CompletionClient, LlmError};

const LOG_TARGET: &str = "pipeline";
const PREVIEW_CHARS: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("text is required")]
    EmptyText,
    #[error("analysis request failed: {0}")]
    Llm(#[from] LlmError),
}

/// One analysis request: prompt the model once, then normalize whatever
/// comes back. Upstream failures are returned as-is, never retried.
pub struct AnalysisPipeline<C> {
    client: C,
}

impl<C: CompletionClient> AnalysisPipeline<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyText);
        }

        tracing::info!(target: LOG_TARGET, preview = %preview(text), "analyzing text");

        let completion = self.client.complete(build_analysis_prompt(text)).await?;
        tracing::debug!(target: LOG_TARGET, %completion, "raw completion");

        Ok(normalize(&completion))
    }

    /// Analyzes and wraps the result for the history store.
    pub async fn analyze_for_history(&self, text: &str) -> Result<HistoryRecord, PipelineError> {
        let result = self.analyze(text).await?;
        Ok(HistoryRecord::new(text, result))
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
