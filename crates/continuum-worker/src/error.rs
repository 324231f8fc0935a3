use continuum_sandbox::ActivationError;
use continuum_types::TimeError;

/// An inbound activation that decoded but does not satisfy the contract.
#[derive(Debug, thiserror::Error)]
pub enum MalformedActivation {
    #[error("activation is missing its timestamp")]
    MissingTimestamp,
    #[error("activation job {index} has no variant")]
    EmptyJob { index: usize },
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Failures surfaced to the driver's caller.
///
/// All of these are infrastructure errors: the coordinator retries them.
/// They are never rendered as a `failWorkflowExecution` command, which
/// would be a terminal business outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to decode activation: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error(transparent)]
    Malformed(#[from] MalformedActivation),
    #[error(transparent)]
    Activation(#[from] ActivationError),
}

/// Failures reading a length-delimited frame from a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to decode framed message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("frame length prefix exceeds 64 bits")]
    OversizedLengthPrefix,
}
