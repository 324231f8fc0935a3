//! Translates activation jobs into workflow entry points, accumulates
//! commands, and drains the scheduler to quiescence.
//!
//! One [`Activator`] exists per workflow run. The driver calls
//! [`Activator::activate`] sequentially; re-entry for the same workflow is
//! never allowed, so all interior state is single-threaded.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Wake, Waker};

use tracing::{debug, warn};

use continuum_types::{
    ActivationJob, Payload, TimerId, WorkflowActivation, WorkflowCommand, WorkflowFailure,
    WorkflowValue,
};

use crate::context::{WorkflowContext, WorkflowState};
use crate::error::ActivationError;
use crate::registry::{WorkflowRegistry, WorkflowResult};
use crate::scheduler::Scheduler;

/// Wake signal for the root task. Raising it marks the workflow future as
/// runnable; the drain loop polls once per raise.
struct WakeFlag(AtomicBool);

impl WakeFlag {
    fn new(raised: bool) -> Self {
        Self(AtomicBool::new(raised))
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl Wake for WakeFlag {
    fn wake(self: Arc<Self>) {
        self.0.store(true, Ordering::Release);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.store(true, Ordering::Release);
    }
}

/// The workflow's root future plus its wake plumbing.
struct RootTask {
    future: Pin<Box<dyn Future<Output = WorkflowResult>>>,
    flag: Arc<WakeFlag>,
    waker: Waker,
}

/// The workflow-facing runtime: workflow identity, logical time, the timer
/// table, and the command buffer, driven job by job.
pub struct Activator {
    scheduler: Scheduler,
    state: Rc<RefCell<WorkflowState>>,
    registry: WorkflowRegistry,
    root: Option<RootTask>,
    /// Set by the first `startWorkflow` job and never cleared, so a
    /// duplicate start is rejected even after the root future finished.
    started: bool,
}

impl Activator {
    pub fn new(registry: WorkflowRegistry, workflow_id: impl Into<String>) -> Self {
        Self {
            scheduler: Scheduler::new(),
            state: Rc::new(RefCell::new(WorkflowState::new(workflow_id.into()))),
            registry,
            root: None,
            started: false,
        }
    }

    /// Install a host callback reachable from workflow code by the given
    /// dotted name. Injection is not retractable.
    pub fn inject(
        &mut self,
        name: impl Into<String>,
        host_fn: impl FnMut(&[WorkflowValue]) -> Option<WorkflowValue> + 'static,
    ) {
        self.state
            .borrow_mut()
            .host_fns
            .insert(name.into(), Box::new(host_fn));
    }

    /// Whether a terminal command has been emitted for this workflow.
    pub fn completed(&self) -> bool {
        self.state.borrow().completed
    }

    /// Apply one activation: set logical time, run the jobs in order,
    /// drain to quiescence, and return the commands emitted.
    pub fn activate(
        &mut self,
        activation: WorkflowActivation,
    ) -> Result<Vec<WorkflowCommand>, ActivationError> {
        self.begin_activation(&activation)?;
        for job in activation.jobs {
            self.apply_job(job)?;
        }
        self.drain()?;
        let commands = std::mem::take(&mut self.state.borrow_mut().commands);
        debug!(commands = commands.len(), "activation quiesced");
        Ok(commands)
    }

    fn begin_activation(&mut self, activation: &WorkflowActivation) -> Result<(), ActivationError> {
        let mut state = self.state.borrow_mut();
        match &state.run_id {
            None => state.run_id = Some(activation.run_id.clone()),
            Some(run_id) if *run_id != activation.run_id => {
                return Err(ActivationError::RunIdMismatch {
                    expected: run_id.clone(),
                    got: activation.run_id.clone(),
                });
            }
            Some(_) => {}
        }
        if activation.timestamp_millis < state.now_millis {
            return Err(ActivationError::TimestampRegression {
                previous_millis: state.now_millis,
                got_millis: activation.timestamp_millis,
            });
        }
        state.now_millis = activation.timestamp_millis;
        state.commands.clear();
        debug!(
            run_id = %activation.run_id,
            now_millis = state.now_millis,
            jobs = activation.jobs.len(),
            "activation begins"
        );
        Ok(())
    }

    fn apply_job(&mut self, job: ActivationJob) -> Result<(), ActivationError> {
        match job {
            ActivationJob::StartWorkflow {
                workflow_id,
                workflow_type,
                arguments,
            } => self.start_workflow(workflow_id, workflow_type, &arguments),
            ActivationJob::TimerFired { timer_id } => self.timer_fired(timer_id),
        }
    }

    fn start_workflow(
        &mut self,
        workflow_id: String,
        workflow_type: String,
        arguments: &[Payload],
    ) -> Result<(), ActivationError> {
        if self.started {
            return Err(ActivationError::DuplicateStart);
        }
        {
            let state = self.state.borrow();
            if state.workflow_id != workflow_id {
                return Err(ActivationError::WorkflowIdMismatch {
                    expected: state.workflow_id.clone(),
                    got: workflow_id,
                });
            }
        }
        let Some(implementation) = self.registry.get(&workflow_type) else {
            return Err(ActivationError::UnknownWorkflowType { workflow_type });
        };
        let decoded: Vec<WorkflowValue> = arguments
            .iter()
            .map(WorkflowValue::from_payload)
            .collect::<Result<_, _>>()?;
        debug!(workflow_type = %workflow_type, arguments = decoded.len(), "starting workflow");
        let ctx = WorkflowContext::new(
            self.state.clone(),
            self.scheduler.clone(),
            Rc::from(decoded),
        );
        let future = implementation(ctx);
        let flag = Arc::new(WakeFlag::new(true));
        let waker = Waker::from(flag.clone());
        self.root = Some(RootTask {
            future,
            flag,
            waker,
        });
        self.started = true;
        Ok(())
    }

    fn timer_fired(&mut self, timer_id: TimerId) -> Result<(), ActivationError> {
        let resolver = self.state.borrow_mut().timers.remove(&timer_id);
        match resolver {
            Some(resolver) => {
                debug!(timer_id = %timer_id, "timer fired");
                resolver.resolve(());
                Ok(())
            }
            None => Err(ActivationError::UnknownTimer { timer_id }),
        }
    }

    /// Run microtasks and the root task until neither can make progress
    /// without an external event, then convert any rejection that nothing
    /// handled into the terminal failure command.
    fn drain(&mut self) -> Result<(), ActivationError> {
        loop {
            self.scheduler.run_until_idle();
            if self.poll_root()? {
                continue;
            }
            if !self.scheduler.has_pending() {
                break;
            }
        }
        for failure in self.scheduler.take_unhandled_rejections() {
            warn!(message = %failure.message, "unhandled promise rejection fails the workflow");
            self.fail(failure);
        }
        Ok(())
    }

    /// Poll the root future if its wake flag is raised. Returns whether a
    /// poll happened (meaning the drain loop should go around again).
    fn poll_root(&mut self) -> Result<bool, ActivationError> {
        let outcome = {
            let Some(task) = self.root.as_mut() else {
                return Ok(false);
            };
            if !task.flag.take() {
                return Ok(false);
            }
            let waker = task.waker.clone();
            let mut cx = Context::from_waker(&waker);
            task.future.as_mut().poll(&mut cx)
        };
        match outcome {
            Poll::Pending => Ok(true),
            Poll::Ready(result) => {
                self.root = None;
                match result {
                    Ok(value) => self.complete(value)?,
                    Err(failure) => self.fail(failure),
                }
                Ok(true)
            }
        }
    }

    /// Emit the terminal success command, unless a terminal command was
    /// already emitted.
    fn complete(&mut self, value: WorkflowValue) -> Result<(), ActivationError> {
        let mut state = self.state.borrow_mut();
        if state.completed {
            debug!("terminal command already emitted; ignoring completion");
            return Ok(());
        }
        let payload = value.to_payload()?;
        state.completed = true;
        state.commands.push(WorkflowCommand::CompleteWorkflowExecution {
            payloads: vec![payload],
        });
        Ok(())
    }

    /// Emit the terminal failure command, unless a terminal command was
    /// already emitted. Failures past the first are dropped.
    fn fail(&mut self, failure: WorkflowFailure) {
        let mut state = self.state.borrow_mut();
        if state.completed {
            debug!(message = %failure.message, "terminal command already emitted; ignoring failure");
            return;
        }
        state.completed = true;
        state.commands.push(WorkflowCommand::FailWorkflowExecution { failure });
    }
}
