use continuum_types::{PayloadError, TimerId};

/// Protocol and infrastructure failures surfaced out of `activate`.
///
/// None of these are business outcomes: the driver reports them to the
/// coordinator as activation failures (retried there), never as a
/// `failWorkflowExecution` command. Each variant names one violated
/// protocol rule.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    /// The logical clock only moves forward.
    #[error("activation timestamp regressed: previous {previous_millis}ms, got {got_millis}ms")]
    TimestampRegression {
        previous_millis: u64,
        got_millis: u64,
    },
    /// A fire job named a timer that was never started (or already fired).
    #[error("timer fired for unknown timer id {timer_id}")]
    UnknownTimer { timer_id: TimerId },
    /// `startWorkflow` named a type with no registered implementation.
    #[error("no workflow implementation registered for type {workflow_type:?}")]
    UnknownWorkflowType { workflow_type: String },
    /// A second `startWorkflow` job arrived for a running instance.
    #[error("workflow already started; duplicate startWorkflow job")]
    DuplicateStart,
    /// The activation's run does not match the run this instance serves.
    #[error("activation run id {got:?} does not match established run id {expected:?}")]
    RunIdMismatch { expected: String, got: String },
    /// `startWorkflow` named a different workflow than this instance.
    #[error("startWorkflow workflow id {got:?} does not match this instance {expected:?}")]
    WorkflowIdMismatch { expected: String, got: String },
    /// The payload converter failed on arguments or a return value.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}
