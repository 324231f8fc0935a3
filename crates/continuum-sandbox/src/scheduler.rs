//! The deterministic microtask queue.
//!
//! This replaces the host runtime's scheduler entirely: every continuation
//! in the sandbox is dispatched through this FIFO queue, so microtask
//! ordering is a function of the activation sequence alone and replays
//! bit-identically across processes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::rc::Rc;

use continuum_types::WorkflowFailure;

type Microtask = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerInner {
    queue: VecDeque<Microtask>,
    next_promise_id: u64,
    /// Rejected promises with no handler attached, keyed by promise id.
    /// Ordered so the sweep at quiescence is deterministic.
    unhandled_rejections: BTreeMap<u64, WorkflowFailure>,
}

/// Cheap-to-clone handle to one workflow's microtask queue.
///
/// Tasks run strictly in enqueue order; tasks enqueued while a batch is
/// draining run after the tasks already queued. There is no work stealing,
/// no timer wheel, and no idle parking: an empty queue means quiescent.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a continuation behind everything already queued.
    pub(crate) fn enqueue(&self, task: impl FnOnce() + 'static) {
        self.inner.borrow_mut().queue.push_back(Box::new(task));
    }

    /// Run queued microtasks until the queue is empty, including tasks
    /// enqueued by the tasks themselves. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must not be held across the task call: tasks
            // re-enter the scheduler to enqueue more work.
            let task = self.inner.borrow_mut().queue.pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// True if any microtask is queued.
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().queue.is_empty()
    }

    pub(crate) fn allocate_promise_id(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_promise_id;
        inner.next_promise_id += 1;
        id
    }

    /// Record a rejection that settled with no handler attached.
    pub(crate) fn note_unhandled_rejection(&self, promise_id: u64, failure: WorkflowFailure) {
        self.inner
            .borrow_mut()
            .unhandled_rejections
            .insert(promise_id, failure);
    }

    /// A handler attached (or consumed the rejection) after the fact.
    pub(crate) fn rejection_handled(&self, promise_id: u64) {
        self.inner.borrow_mut().unhandled_rejections.remove(&promise_id);
    }

    /// Drain the rejections still unhandled at quiescence, oldest first.
    pub fn take_unhandled_rejections(&self) -> Vec<WorkflowFailure> {
        let mut inner = self.inner.borrow_mut();
        std::mem::take(&mut inner.unhandled_rejections)
            .into_values()
            .collect()
    }
}
