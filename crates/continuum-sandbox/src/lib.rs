//! The inside-the-isolate runtime: a deterministic cooperative scheduler,
//! the promise primitive it drives, the curated context surface workflow
//! code runs against, and the activator that folds activation jobs into
//! commands.
//!
//! Everything here is single-threaded per workflow. The handles are
//! deliberately `!Send`; distinct workflows never share state.

pub mod activator;
pub mod context;
pub mod error;
pub mod promise;
pub mod registry;
pub mod scheduler;

pub use activator::Activator;
pub use context::{HostFn, WorkflowContext};
pub use error::ActivationError;
pub use promise::{PromiseResolver, TaskPromise, all_of, race};
pub use registry::{WorkflowFn, WorkflowRegistry, WorkflowResult};
pub use scheduler::Scheduler;
