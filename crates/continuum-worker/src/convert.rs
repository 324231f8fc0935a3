//! Folds wire shapes into domain shapes and back.
//!
//! Ingress is fallible: a decoded activation may still be malformed
//! (missing timestamp, empty oneof), and those are infrastructure errors,
//! not workflow outcomes. Egress is total.

use continuum_types::{
    ActivationJob, Payload, TimerId, WorkflowActivation, WorkflowCommand, millis_to_parts,
    parts_to_millis,
};

use crate::error::MalformedActivation;
use crate::proto;

pub fn payload_from_proto(payload: proto::Payload) -> Payload {
    Payload {
        metadata: payload.metadata,
        data: payload.data,
    }
}

pub fn payload_to_proto(payload: Payload) -> proto::Payload {
    proto::Payload {
        metadata: payload.metadata,
        data: payload.data,
    }
}

/// Validate and convert an inbound activation.
pub fn activation_from_proto(
    activation: proto::WorkflowActivation,
) -> Result<WorkflowActivation, MalformedActivation> {
    let Some(timestamp) = activation.timestamp else {
        return Err(MalformedActivation::MissingTimestamp);
    };
    let timestamp_millis = parts_to_millis(timestamp.seconds, timestamp.nanos)?;
    let mut jobs = Vec::with_capacity(activation.jobs.len());
    for (index, job) in activation.jobs.into_iter().enumerate() {
        let Some(variant) = job.variant else {
            return Err(MalformedActivation::EmptyJob { index });
        };
        jobs.push(match variant {
            proto::activation_job::Variant::StartWorkflow(start) => ActivationJob::StartWorkflow {
                workflow_id: start.workflow_id,
                workflow_type: start.workflow_type,
                arguments: start.arguments.into_iter().map(payload_from_proto).collect(),
            },
            proto::activation_job::Variant::TimerFired(fired) => ActivationJob::TimerFired {
                timer_id: TimerId::new(fired.timer_id),
            },
        });
    }
    Ok(WorkflowActivation {
        run_id: activation.run_id,
        timestamp_millis,
        jobs,
    })
}

/// Render one command into its wire form.
pub fn command_to_proto(command: WorkflowCommand) -> proto::WorkflowCommand {
    let variant = match command {
        WorkflowCommand::StartTimer {
            timer_id,
            start_to_fire_millis,
        } => {
            let (seconds, nanos) = millis_to_parts(start_to_fire_millis);
            proto::workflow_command::Variant::StartTimer(proto::StartTimer {
                timer_id: timer_id.as_str().to_string(),
                start_to_fire_timeout: Some(::prost_types::Duration { seconds, nanos }),
            })
        }
        WorkflowCommand::CompleteWorkflowExecution { payloads } => {
            proto::workflow_command::Variant::CompleteWorkflowExecution(
                proto::CompleteWorkflowExecution {
                    result: Some(proto::Payloads {
                        payloads: payloads.into_iter().map(payload_to_proto).collect(),
                    }),
                },
            )
        }
        WorkflowCommand::FailWorkflowExecution { failure } => {
            proto::workflow_command::Variant::FailWorkflowExecution(proto::FailWorkflowExecution {
                failure: Some(proto::Failure {
                    message: failure.message,
                }),
            })
        }
    };
    proto::WorkflowCommand {
        variant: Some(variant),
    }
}
