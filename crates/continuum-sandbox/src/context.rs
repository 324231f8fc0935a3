//! The curated environment workflow code runs against.
//!
//! [`WorkflowContext`] is the only capability surface reachable from a
//! workflow implementation: logical time, a per-workflow seeded PRNG,
//! timers, the decoded arguments, and the injected host-call table. There
//! is no ambient clock, entropy, or I/O behind it, which is what makes
//! replays reproduce the original execution step for step.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use continuum_types::{TimerId, WorkflowCommand, WorkflowValue};

use crate::promise::{PromiseResolver, TaskPromise};
use crate::scheduler::Scheduler;

/// An injected host callback. Receives decoded arguments and may return a
/// value to the caller.
pub type HostFn = Box<dyn FnMut(&[WorkflowValue]) -> Option<WorkflowValue>>;

/// Mutable per-workflow state shared between the activator and every
/// context handle cloned into workflow code. One instance per workflow;
/// instances share nothing.
pub(crate) struct WorkflowState {
    pub(crate) workflow_id: String,
    pub(crate) run_id: Option<String>,
    /// Logical time. Advances only at activation entry.
    pub(crate) now_millis: u64,
    pub(crate) next_timer_seq: u64,
    pub(crate) commands: Vec<WorkflowCommand>,
    /// Pending timers awaiting their fire job. Entries survive workflow
    /// completion so a late fire for a race loser resolves silently.
    pub(crate) timers: HashMap<TimerId, PromiseResolver<()>>,
    /// Set once a terminal command has been emitted.
    pub(crate) completed: bool,
    pub(crate) rng: StdRng,
    pub(crate) host_fns: HashMap<String, HostFn>,
}

impl WorkflowState {
    pub(crate) fn new(workflow_id: String) -> Self {
        let seed = derive_seed(&workflow_id);
        debug!(
            workflow_id = %workflow_id,
            seed = %hex::encode(&seed[..4]),
            "sandbox state initialized"
        );
        Self {
            workflow_id,
            run_id: None,
            now_millis: 0,
            next_timer_seq: 0,
            commands: Vec::new(),
            timers: HashMap::new(),
            completed: false,
            rng: StdRng::from_seed(seed),
            host_fns: HashMap::new(),
        }
    }
}

/// Derive the PRNG seed from the workflow id so replays of the same
/// workflow observe identical random sequences.
fn derive_seed(workflow_id: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(workflow_id.as_bytes());
    hasher.finalize().into()
}

/// Handle passed to workflow implementations. Cheap to clone; all clones
/// share the workflow's state and scheduler.
#[derive(Clone)]
pub struct WorkflowContext {
    state: Rc<RefCell<WorkflowState>>,
    scheduler: Scheduler,
    arguments: Rc<[WorkflowValue]>,
}

impl WorkflowContext {
    pub(crate) fn new(
        state: Rc<RefCell<WorkflowState>>,
        scheduler: Scheduler,
        arguments: Rc<[WorkflowValue]>,
    ) -> Self {
        Self {
            state,
            scheduler,
            arguments,
        }
    }

    pub fn workflow_id(&self) -> String {
        self.state.borrow().workflow_id.clone()
    }

    pub fn run_id(&self) -> Option<String> {
        self.state.borrow().run_id.clone()
    }

    /// Logical time in epoch milliseconds: the current activation's
    /// timestamp, constant for the whole activation.
    pub fn now_millis(&self) -> u64 {
        self.state.borrow().now_millis
    }

    /// Logical time as a UTC datetime.
    pub fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_millis() as i64).unwrap_or_default()
    }

    /// Next value from the workflow's seeded PRNG.
    pub fn random_u64(&self) -> u64 {
        self.state.borrow_mut().rng.random()
    }

    /// Next value in `[0, 1)` from the workflow's seeded PRNG.
    pub fn random_f64(&self) -> f64 {
        self.state.borrow_mut().rng.random()
    }

    /// The decoded start arguments.
    pub fn arguments(&self) -> &[WorkflowValue] {
        &self.arguments
    }

    /// The workflow's scheduler, for composing promises with the
    /// aggregators.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Start a timer. Appends the `StartTimer` command with the next
    /// sequential id and returns a promise resolved when the matching
    /// fire job is processed.
    pub fn sleep(&self, millis: u64) -> TaskPromise<()> {
        let (promise, resolver) = TaskPromise::pending(&self.scheduler);
        let mut state = self.state.borrow_mut();
        let timer_id = TimerId::from_seq(state.next_timer_seq);
        state.next_timer_seq += 1;
        debug!(timer_id = %timer_id, millis, "starting timer");
        state.commands.push(WorkflowCommand::StartTimer {
            timer_id: timer_id.clone(),
            start_to_fire_millis: millis,
        });
        state.timers.insert(timer_id, resolver);
        promise
    }

    /// Call an injected host function by its dotted name. A name that was
    /// never injected returns `None`.
    ///
    /// The workflow state is borrowed for the duration of the call; host
    /// callbacks must not re-enter the context.
    pub fn host_call(&self, name: &str, args: &[WorkflowValue]) -> Option<WorkflowValue> {
        let mut state = self.state.borrow_mut();
        match state.host_fns.get_mut(name) {
            Some(host_fn) => host_fn(args),
            None => {
                warn!(name, "host call to a function that was never injected");
                None
            }
        }
    }

    /// Shorthand for the conventional `console.log` injection.
    pub fn log(&self, args: &[WorkflowValue]) {
        self.host_call("console.log", args);
    }
}
