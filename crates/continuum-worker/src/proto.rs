//! Wire messages for the coordinator contract, hand-written in the shape
//! prost generates.
//!
//! Field tags are the contract; they never change meaning. Payload
//! metadata uses a `btree_map` so encoding a completion is
//! byte-deterministic regardless of insertion order.

use std::collections::BTreeMap;

/// Opaque user datum: a metadata map (at minimum the encoding declaration)
/// plus optional data bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Payload {
    #[prost(btree_map = "string, bytes", tag = "1")]
    pub metadata: BTreeMap<String, Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub data: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Payloads {
    #[prost(message, repeated, tag = "1")]
    pub payloads: Vec<Payload>,
}

/// Job: begin the workflow.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartWorkflow {
    #[prost(string, tag = "1")]
    pub workflow_id: String,
    #[prost(string, tag = "2")]
    pub workflow_type: String,
    #[prost(message, repeated, tag = "3")]
    pub arguments: Vec<Payload>,
}

/// Job: a previously started timer elapsed.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimerFired {
    #[prost(string, tag = "1")]
    pub timer_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivationJob {
    #[prost(oneof = "activation_job::Variant", tags = "1, 2")]
    pub variant: Option<activation_job::Variant>,
}

pub mod activation_job {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        #[prost(message, tag = "1")]
        StartWorkflow(super::StartWorkflow),
        #[prost(message, tag = "2")]
        TimerFired(super::TimerFired),
    }
}

/// Inbound driving message: the jobs to apply at a logical instant.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkflowActivation {
    #[prost(string, tag = "1")]
    pub run_id: String,
    #[prost(message, optional, tag = "2")]
    pub timestamp: Option<::prost_types::Timestamp>,
    #[prost(message, repeated, tag = "3")]
    pub jobs: Vec<ActivationJob>,
}

/// Command: ask the coordinator to fire a timer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartTimer {
    #[prost(string, tag = "1")]
    pub timer_id: String,
    #[prost(message, optional, tag = "2")]
    pub start_to_fire_timeout: Option<::prost_types::Duration>,
}

/// Command: terminal success with the workflow's result payloads.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompleteWorkflowExecution {
    #[prost(message, optional, tag = "1")]
    pub result: Option<Payloads>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Failure {
    #[prost(string, tag = "1")]
    pub message: String,
}

/// Command: terminal business failure.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FailWorkflowExecution {
    #[prost(message, optional, tag = "1")]
    pub failure: Option<Failure>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkflowCommand {
    #[prost(oneof = "workflow_command::Variant", tags = "1, 2, 3")]
    pub variant: Option<workflow_command::Variant>,
}

pub mod workflow_command {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        #[prost(message, tag = "1")]
        StartTimer(super::StartTimer),
        #[prost(message, tag = "2")]
        CompleteWorkflowExecution(super::CompleteWorkflowExecution),
        #[prost(message, tag = "3")]
        FailWorkflowExecution(super::FailWorkflowExecution),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Success {
    #[prost(message, repeated, tag = "1")]
    pub commands: Vec<WorkflowCommand>,
}

/// The outcome of one activation: the commands it produced, or a
/// worker-side failure report.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkflowActivationCompletion {
    #[prost(oneof = "workflow_activation_completion::Status", tags = "1, 2")]
    pub status: Option<workflow_activation_completion::Status>,
}

pub mod workflow_activation_completion {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Status {
        #[prost(message, tag = "1")]
        Successful(super::Success),
        #[prost(message, tag = "2")]
        Failed(super::Failure),
    }
}

/// Outbound response. The task token is echoed verbatim.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompleteTaskReq {
    #[prost(bytes = "vec", tag = "1")]
    pub task_token: Vec<u8>,
    #[prost(oneof = "complete_task_req::Completion", tags = "2")]
    pub completion: Option<complete_task_req::Completion>,
}

pub mod complete_task_req {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Completion {
        #[prost(message, tag = "2")]
        Workflow(super::WorkflowActivationCompletion),
    }
}
