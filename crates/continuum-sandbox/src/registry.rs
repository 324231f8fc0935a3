use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use continuum_types::{WorkflowFailure, WorkflowValue};

use crate::context::WorkflowContext;

/// What a workflow implementation eventually produces: a value to encode
/// into the completion, or the failure the workflow ends with.
pub type WorkflowResult = Result<WorkflowValue, WorkflowFailure>;

/// A registered workflow implementation: given the context, produce the
/// workflow's root future.
pub type WorkflowFn = Rc<dyn Fn(WorkflowContext) -> Pin<Box<dyn Future<Output = WorkflowResult>>>>;

/// Named workflow implementations available to a worker.
///
/// This is the registration surface for implementations: a
/// `startWorkflow` job resolves its `workflow_type` here. Registries are
/// cheap to clone and are shared by every workflow created from them on
/// the same thread.
#[derive(Clone, Default)]
pub struct WorkflowRegistry {
    implementations: HashMap<String, WorkflowFn>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation under a workflow type name. Re-registering
    /// a name replaces the previous implementation.
    pub fn register<F, Fut>(&mut self, workflow_type: impl Into<String>, implementation: F)
    where
        F: Fn(WorkflowContext) -> Fut + 'static,
        Fut: Future<Output = WorkflowResult> + 'static,
    {
        self.implementations.insert(
            workflow_type.into(),
            Rc::new(move |ctx| Box::pin(implementation(ctx))),
        );
    }

    pub fn get(&self, workflow_type: &str) -> Option<WorkflowFn> {
        self.implementations.get(workflow_type).cloned()
    }

    pub fn contains(&self, workflow_type: &str) -> bool {
        self.implementations.contains_key(workflow_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_registered_types_only() {
        let mut registry = WorkflowRegistry::new();
        registry.register("echo", |_ctx| async { Ok(WorkflowValue::Null) });

        assert!(registry.contains("echo"));
        assert!(registry.get("echo").is_some());
        assert!(!registry.contains("missing"));
        assert!(registry.get("missing").is_none());
    }
}
