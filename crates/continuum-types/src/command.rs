use serde::{Deserialize, Serialize};

use crate::failure::WorkflowFailure;
use crate::payload::Payload;
use crate::timer::TimerId;

/// One outgoing instruction to the coordinator, accumulated in the command
/// buffer during an activation and drained into the completion.
///
/// At most one terminal command (`CompleteWorkflowExecution` or
/// `FailWorkflowExecution`) is emitted over a workflow's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowCommand {
    /// Ask the coordinator to fire a timer after the given timeout.
    StartTimer {
        timer_id: TimerId,
        start_to_fire_millis: u64,
    },
    /// Workflow finished with a result (terminal).
    CompleteWorkflowExecution { payloads: Vec<Payload> },
    /// Workflow failed (terminal).
    FailWorkflowExecution { failure: WorkflowFailure },
}

impl WorkflowCommand {
    /// The variant name as a static string for error messages and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartTimer { .. } => "StartTimer",
            Self::CompleteWorkflowExecution { .. } => "CompleteWorkflowExecution",
            Self::FailWorkflowExecution { .. } => "FailWorkflowExecution",
        }
    }

    /// Whether this command ends the workflow (complete or fail).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::CompleteWorkflowExecution { .. } | Self::FailWorkflowExecution { .. }
        )
    }
}
