use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::timer::TimerId;

/// One unit of work within an activation.
///
/// Extensible: future driving events (signals, query cancellation) are
/// added as variants here, not as new message kinds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationJob {
    /// Begin the workflow: resolve the named implementation and run its
    /// top level with the decoded arguments.
    StartWorkflow {
        workflow_id: String,
        workflow_type: String,
        arguments: Vec<Payload>,
    },
    /// A previously started timer elapsed on the coordinator.
    TimerFired { timer_id: TimerId },
}

impl ActivationJob {
    /// The variant name as a static string for error messages and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartWorkflow { .. } => "StartWorkflow",
            Self::TimerFired { .. } => "TimerFired",
        }
    }
}

/// One externally delivered driving message: the jobs to apply to a
/// workflow since its last completion, plus the logical time they occur at.
///
/// Consumed exactly once; the timestamp becomes the workflow's `now` for
/// the whole activation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowActivation {
    pub run_id: String,
    pub timestamp_millis: u64,
    pub jobs: Vec<ActivationJob>,
}
