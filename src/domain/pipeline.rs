//! Query path stages and the answer they produce

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prompt::TemplateVersion;

/// Stage of a single query as it moves through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "reason", rename_all = "snake_case")]
pub enum QueryStage {
    ReceivedQuery,
    Embedding,
    Retrieving,
    Composing,
    Generating,
    Completed,
    Failed(String),
}

impl QueryStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReceivedQuery => "received_query",
            Self::Embedding => "embedding",
            Self::Retrieving => "retrieving",
            Self::Composing => "composing",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    /// The only stage reachable from this one on success
    pub fn next(&self) -> Option<QueryStage> {
        match self {
            Self::ReceivedQuery => Some(Self::Embedding),
            Self::Embedding => Some(Self::Retrieving),
            Self::Retrieving => Some(Self::Composing),
            Self::Composing => Some(Self::Generating),
            Self::Generating => Some(Self::Completed),
            Self::Completed | Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("query already finished in stage '{0}'")]
    Finished(&'static str),

    #[error("cannot move from '{from}' to '{to}'")]
    OutOfOrder {
        from: &'static str,
        to: &'static str,
    },
}

/// Tracks one query through the linear stage sequence
///
/// Stages may only advance to their direct successor. `Failed` may be entered
/// from any non-terminal stage. No stage is ever re-entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryProgress {
    current: QueryStage,
    history: Vec<QueryStage>,
}

impl QueryProgress {
    pub fn new() -> Self {
        Self {
            current: QueryStage::ReceivedQuery,
            history: vec![QueryStage::ReceivedQuery],
        }
    }

    pub fn current(&self) -> &QueryStage {
        &self.current
    }

    /// Every stage visited so far, in order
    pub fn history(&self) -> &[QueryStage] {
        &self.history
    }

    pub fn advance(&mut self, to: QueryStage) -> Result<(), StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::Finished(self.current.name()));
        }

        let is_failure = matches!(to, QueryStage::Failed(_));
        if !is_failure && self.current.next().as_ref() != Some(&to) {
            return Err(StageTransitionError::OutOfOrder {
                from: self.current.name(),
                to: to.name(),
            });
        }

        self.enter(to);
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), StageTransitionError> {
        self.advance(QueryStage::Failed(reason.into()))
    }

    fn enter(&mut self, stage: QueryStage) {
        tracing::debug!(from = self.current.name(), stage = stage.name(), "Query stage transition");
        self.history.push(stage.clone());
        self.current = stage;
    }
}

impl Default for QueryProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Generated answer plus the sources of the context it was conditioned on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub answer: String,
    /// One entry per retrieved chunk, in rank order
    pub sources: Vec<String>,
    pub prompt_version: TemplateVersion,
}
