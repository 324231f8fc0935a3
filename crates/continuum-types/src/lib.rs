pub mod activation;
pub mod command;
pub mod error;
pub mod failure;
pub mod payload;
pub mod timer;
pub mod timestamp;
pub mod value;

pub use activation::{ActivationJob, WorkflowActivation};
pub use command::WorkflowCommand;
pub use error::{PayloadError, TimeError};
pub use failure::WorkflowFailure;
pub use payload::{ENCODING_KEY, Encoding, Payload};
pub use timer::TimerId;
pub use timestamp::{millis_to_parts, parts_to_millis};
pub use value::WorkflowValue;
