use serde::{Deserialize, Serialize};

/// A business-level workflow failure.
///
/// This is the value workflow code fails with and the only failure shape
/// the wire contract emits (`failWorkflowExecution { message }`). A richer
/// failure taxonomy is layered on top elsewhere; it is deliberately not
/// embedded here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFailure {
    pub message: String,
}

impl WorkflowFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WorkflowFailure {}
