//! The outside-the-sandbox driver.
//!
//! Decodes activation bytes, dispatches them into the sandbox, and encodes
//! the `CompleteTaskReq` response with the caller's task token echoed
//! verbatim. Errors out of [`Workflow::activate`] are infrastructure
//! failures for the caller to report and retry; once one is returned the
//! sandbox state is indeterminate and the instance must be discarded.

use prost::Message;
use tracing::debug;

use continuum_sandbox::{Activator, WorkflowRegistry};
use continuum_types::WorkflowValue;

use crate::convert;
use crate::error::WorkerError;
use crate::proto;

/// One workflow instance as seen from the transport: create it, inject
/// host functions, then feed it encoded activations sequentially.
pub struct Workflow {
    activator: Activator,
}

impl Workflow {
    /// Prepare a fresh instance for the given workflow id. Implementations
    /// are resolved against `registry` when the start job arrives.
    pub fn create(registry: WorkflowRegistry, workflow_id: impl Into<String>) -> Self {
        Self {
            activator: Activator::new(registry, workflow_id),
        }
    }

    /// Install a host callback reachable from workflow code.
    pub fn inject(
        &mut self,
        name: impl Into<String>,
        host_fn: impl FnMut(&[WorkflowValue]) -> Option<WorkflowValue> + 'static,
    ) {
        self.activator.inject(name, host_fn);
    }

    /// Whether the workflow has emitted its terminal command.
    pub fn completed(&self) -> bool {
        self.activator.completed()
    }

    /// Apply one length-delimited activation and return the
    /// length-delimited `CompleteTaskReq` bytes.
    pub fn activate(
        &mut self,
        task_token: &[u8],
        activation: &[u8],
    ) -> Result<Vec<u8>, WorkerError> {
        let decoded = proto::WorkflowActivation::decode_length_delimited(activation)?;
        let activation = convert::activation_from_proto(decoded)?;
        debug!(run_id = %activation.run_id, "dispatching activation into the sandbox");
        let commands = self.activator.activate(activation)?;
        let completion = proto::CompleteTaskReq {
            task_token: task_token.to_vec(),
            completion: Some(proto::complete_task_req::Completion::Workflow(
                proto::WorkflowActivationCompletion {
                    status: Some(proto::workflow_activation_completion::Status::Successful(
                        proto::Success {
                            commands: commands.into_iter().map(convert::command_to_proto).collect(),
                        },
                    )),
                },
            )),
        };
        Ok(completion.encode_length_delimited_to_vec())
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use continuum_types::Payload;

    use super::*;

    fn registry() -> WorkflowRegistry {
        let mut registry = WorkflowRegistry::new();
        registry.register("hello", |_ctx| async {
            Ok(WorkflowValue::text("success"))
        });
        registry.register("sleeper", |ctx| async move {
            ctx.sleep(100).await?;
            Ok(WorkflowValue::Null)
        });
        registry
    }

    fn start_activation(workflow_type: &str, seconds: i64) -> Vec<u8> {
        proto::WorkflowActivation {
            run_id: "test-runId".to_string(),
            timestamp: Some(::prost_types::Timestamp { seconds, nanos: 0 }),
            jobs: vec![proto::ActivationJob {
                variant: Some(proto::activation_job::Variant::StartWorkflow(
                    proto::StartWorkflow {
                        workflow_id: "test-workflowId".to_string(),
                        workflow_type: workflow_type.to_string(),
                        arguments: Vec::new(),
                    },
                )),
            }],
        }
        .encode_length_delimited_to_vec()
    }

    fn fire_activation(timer_id: &str, seconds: i64) -> Vec<u8> {
        proto::WorkflowActivation {
            run_id: "test-runId".to_string(),
            timestamp: Some(::prost_types::Timestamp { seconds, nanos: 0 }),
            jobs: vec![proto::ActivationJob {
                variant: Some(proto::activation_job::Variant::TimerFired(
                    proto::TimerFired {
                        timer_id: timer_id.to_string(),
                    },
                )),
            }],
        }
        .encode_length_delimited_to_vec()
    }

    fn decode_commands(response: &[u8]) -> (Vec<u8>, Vec<proto::WorkflowCommand>) {
        let completion = proto::CompleteTaskReq::decode_length_delimited(response).unwrap();
        let Some(proto::complete_task_req::Completion::Workflow(workflow)) = completion.completion
        else {
            panic!("expected a workflow completion");
        };
        let Some(proto::workflow_activation_completion::Status::Successful(success)) =
            workflow.status
        else {
            panic!("expected a successful completion");
        };
        (completion.task_token, success.commands)
    }

    #[test]
    fn task_token_is_echoed_verbatim() {
        let mut workflow = Workflow::create(registry(), "test-workflowId");
        let token = b"opaque token bytes \x00\x01".to_vec();

        let response = workflow
            .activate(&token, &start_activation("hello", 1))
            .unwrap();

        let (echoed, _commands) = decode_commands(&response);
        assert_eq!(echoed, token);
    }

    #[test]
    fn completion_carries_the_encoded_return_value() {
        let mut workflow = Workflow::create(registry(), "test-workflowId");

        let response = workflow
            .activate(b"token", &start_activation("hello", 1))
            .unwrap();

        let (_token, commands) = decode_commands(&response);
        let expected = proto::WorkflowCommand {
            variant: Some(proto::workflow_command::Variant::CompleteWorkflowExecution(
                proto::CompleteWorkflowExecution {
                    result: Some(proto::Payloads {
                        payloads: vec![convert::payload_to_proto(Payload::json_bytes(
                            b"\"success\"".to_vec(),
                        ))],
                    }),
                },
            )),
        };
        assert_eq!(commands, vec![expected]);
    }

    #[test]
    fn sleep_spans_two_wire_activations() {
        let mut workflow = Workflow::create(registry(), "test-workflowId");

        let first = workflow
            .activate(b"t1", &start_activation("sleeper", 1))
            .unwrap();
        let (_token, commands) = decode_commands(&first);
        let expected_timer = proto::WorkflowCommand {
            variant: Some(proto::workflow_command::Variant::StartTimer(
                proto::StartTimer {
                    timer_id: "0".to_string(),
                    start_to_fire_timeout: Some(::prost_types::Duration {
                        seconds: 0,
                        nanos: 100_000_000,
                    }),
                },
            )),
        };
        assert_eq!(commands, vec![expected_timer]);
        assert!(!workflow.completed());

        let second = workflow.activate(b"t2", &fire_activation("0", 2)).unwrap();
        let (_token, commands) = decode_commands(&second);
        let expected_complete = proto::WorkflowCommand {
            variant: Some(proto::workflow_command::Variant::CompleteWorkflowExecution(
                proto::CompleteWorkflowExecution {
                    result: Some(proto::Payloads {
                        payloads: vec![convert::payload_to_proto(Payload::null())],
                    }),
                },
            )),
        };
        assert_eq!(commands, vec![expected_complete]);
        assert!(workflow.completed());
    }

    #[test]
    fn identical_activation_sequences_produce_identical_bytes() {
        let run = || {
            let mut workflow = Workflow::create(registry(), "test-workflowId");
            let mut responses = Vec::new();
            responses.push(
                workflow
                    .activate(b"t1", &start_activation("sleeper", 1))
                    .unwrap(),
            );
            responses.push(workflow.activate(b"t2", &fire_activation("0", 2)).unwrap());
            responses
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn protocol_violations_surface_as_errors_not_completions() {
        let mut workflow = Workflow::create(registry(), "test-workflowId");
        workflow
            .activate(b"t1", &start_activation("sleeper", 1))
            .unwrap();

        let err = workflow
            .activate(b"t2", &fire_activation("99", 2))
            .unwrap_err();

        assert!(matches!(err, WorkerError::Activation(_)));
    }

    #[test]
    fn missing_timestamp_is_a_malformed_activation() {
        let mut workflow = Workflow::create(registry(), "test-workflowId");
        let bytes = proto::WorkflowActivation {
            run_id: "test-runId".to_string(),
            timestamp: None,
            jobs: Vec::new(),
        }
        .encode_length_delimited_to_vec();

        let err = workflow.activate(b"t", &bytes).unwrap_err();

        assert!(matches!(err, WorkerError::Malformed(_)));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let mut workflow = Workflow::create(registry(), "test-workflowId");

        let err = workflow.activate(b"t", &[0xff, 0xff, 0xff]).unwrap_err();

        assert!(matches!(err, WorkerError::Decode(_)));
    }
}
