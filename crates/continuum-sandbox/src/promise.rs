//! The promise primitive workflow code observes as "futures and timers".
//!
//! A [`TaskPromise`] is settled exactly once, by its [`PromiseResolver`].
//! Continuations never run inline: settling enqueues them on the owning
//! [`Scheduler`], so observable ordering is attachment order filtered
//! through the FIFO queue. The type also implements [`Future`], which is
//! the idiomatic chaining surface for workflow code; `then` exists for
//! host-side plumbing that composes promises outside an `async` context.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use continuum_types::WorkflowFailure;

use crate::scheduler::Scheduler;

/// The settled outcome of a promise.
pub type Settled<T> = Result<T, WorkflowFailure>;

type Callback<T> = Box<dyn FnOnce(Settled<T>)>;

enum State<T> {
    Pending,
    Fulfilled(T),
    Rejected(WorkflowFailure),
}

struct Shared<T> {
    id: u64,
    state: State<T>,
    callbacks: Vec<Callback<T>>,
    wakers: Vec<Waker>,
    /// True once any continuation or awaiter has attached. A rejection
    /// that settles while this is false is reported to the scheduler's
    /// unhandled-rejection registry.
    handled: bool,
}

/// A one-shot, single-threaded promise handle. Clones observe the same
/// settlement.
pub struct TaskPromise<T> {
    shared: Rc<RefCell<Shared<T>>>,
    scheduler: Scheduler,
}

impl<T> Clone for TaskPromise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

/// The write side of a [`TaskPromise`]. Consumed on settlement.
pub struct PromiseResolver<T> {
    shared: Rc<RefCell<Shared<T>>>,
    scheduler: Scheduler,
}

impl<T: Clone + 'static> TaskPromise<T> {
    /// A promise with its resolver, settled by whoever holds the resolver.
    pub fn pending(scheduler: &Scheduler) -> (Self, PromiseResolver<T>) {
        let shared = Rc::new(RefCell::new(Shared {
            id: scheduler.allocate_promise_id(),
            state: State::Pending,
            callbacks: Vec::new(),
            wakers: Vec::new(),
            handled: false,
        }));
        (
            Self {
                shared: shared.clone(),
                scheduler: scheduler.clone(),
            },
            PromiseResolver {
                shared,
                scheduler: scheduler.clone(),
            },
        )
    }

    /// An already-fulfilled promise. Continuations still run as microtasks.
    pub fn fulfilled(scheduler: &Scheduler, value: T) -> Self {
        let (promise, resolver) = Self::pending(scheduler);
        resolver.resolve(value);
        promise
    }

    /// An already-rejected promise. Counts as unhandled until something
    /// attaches to it.
    pub fn rejected(scheduler: &Scheduler, failure: WorkflowFailure) -> Self {
        let (promise, resolver) = Self::pending(scheduler);
        resolver.reject(failure);
        promise
    }

    fn id(&self) -> u64 {
        self.shared.borrow().id
    }

    /// Attach a continuation. Runs as a microtask with the settled outcome,
    /// in attachment order relative to other continuations on this promise.
    pub(crate) fn on_settled(&self, f: impl FnOnce(Settled<T>) + 'static) {
        let settled = {
            let mut shared = self.shared.borrow_mut();
            shared.handled = true;
            match &shared.state {
                State::Pending => {
                    shared.callbacks.push(Box::new(f));
                    return;
                }
                State::Fulfilled(value) => Ok(value.clone()),
                State::Rejected(failure) => Err(failure.clone()),
            }
        };
        self.scheduler.rejection_handled(self.id());
        self.scheduler.enqueue(move || f(settled));
    }

    /// Chain a transformation, producing a new promise for its outcome.
    /// The closure sees rejections too, so it doubles as `catch`.
    pub fn then<U, F>(&self, f: F) -> TaskPromise<U>
    where
        U: Clone + 'static,
        F: FnOnce(Settled<T>) -> Settled<U> + 'static,
    {
        let (promise, resolver) = TaskPromise::pending(&self.scheduler);
        self.on_settled(move |settled| resolver.settle(f(settled)));
        promise
    }
}

impl<T: Clone + 'static> PromiseResolver<T> {
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(self, failure: WorkflowFailure) {
        self.settle(Err(failure));
    }

    /// Settle with an outcome. No-op if the promise is already settled.
    pub(crate) fn settle(self, result: Settled<T>) {
        let (callbacks, wakers) = {
            let mut shared = self.shared.borrow_mut();
            if !matches!(shared.state, State::Pending) {
                return;
            }
            match &result {
                Ok(value) => shared.state = State::Fulfilled(value.clone()),
                Err(failure) => {
                    if !shared.handled {
                        self.scheduler
                            .note_unhandled_rejection(shared.id, failure.clone());
                    }
                    shared.state = State::Rejected(failure.clone());
                }
            }
            (
                std::mem::take(&mut shared.callbacks),
                std::mem::take(&mut shared.wakers),
            )
        };
        for callback in callbacks {
            let result = result.clone();
            self.scheduler.enqueue(move || callback(result));
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

impl<T: Clone + 'static> Future for TaskPromise<T> {
    type Output = Settled<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let (id, outcome) = {
            let mut shared = this.shared.borrow_mut();
            shared.handled = true;
            match &shared.state {
                State::Pending => {
                    if !shared.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                        shared.wakers.push(cx.waker().clone());
                    }
                    return Poll::Pending;
                }
                State::Fulfilled(value) => (shared.id, Ok(value.clone())),
                State::Rejected(failure) => (shared.id, Err(failure.clone())),
            }
        };
        this.scheduler.rejection_handled(id);
        Poll::Ready(outcome)
    }
}

/// Wait for every promise to fulfill, collecting values in input order.
/// Rejects eagerly with the first rejection; later settlements of the
/// other participants are ignored.
pub fn all_of<T: Clone + 'static>(
    scheduler: &Scheduler,
    promises: Vec<TaskPromise<T>>,
) -> TaskPromise<Vec<T>> {
    if promises.is_empty() {
        return TaskPromise::fulfilled(scheduler, Vec::new());
    }
    let (result, resolver) = TaskPromise::pending(scheduler);
    let slots: Rc<RefCell<Vec<Option<T>>>> =
        Rc::new(RefCell::new((0..promises.len()).map(|_| None).collect()));
    let remaining = Rc::new(Cell::new(promises.len()));
    let resolver = Rc::new(RefCell::new(Some(resolver)));
    for (index, promise) in promises.iter().enumerate() {
        let slots = slots.clone();
        let remaining = remaining.clone();
        let resolver = resolver.clone();
        promise.on_settled(move |settled| match settled {
            Ok(value) => {
                slots.borrow_mut()[index] = Some(value);
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    if let Some(resolver) = resolver.borrow_mut().take() {
                        let values: Vec<T> =
                            slots.borrow_mut().iter_mut().filter_map(Option::take).collect();
                        resolver.resolve(values);
                    }
                }
            }
            Err(failure) => {
                if let Some(resolver) = resolver.borrow_mut().take() {
                    resolver.reject(failure);
                }
            }
        });
    }
    result
}

/// Settle with the first participant to settle, success or failure.
///
/// Losers are not cancelled: they stay pending (or settle later) and can
/// still be observed. An empty input stays pending forever, matching the
/// aggregator this models.
pub fn race<T: Clone + 'static>(
    scheduler: &Scheduler,
    promises: Vec<TaskPromise<T>>,
) -> TaskPromise<T> {
    let (result, resolver) = TaskPromise::pending(scheduler);
    let resolver = Rc::new(RefCell::new(Some(resolver)));
    for promise in &promises {
        let resolver = resolver.clone();
        promise.on_settled(move |settled| {
            if let Some(resolver) = resolver.borrow_mut().take() {
                resolver.settle(settled);
            }
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use std::task::Waker;

    use super::*;

    fn outcome_slot<T: Clone + 'static>(
        promise: &TaskPromise<T>,
    ) -> Rc<RefCell<Option<Settled<T>>>> {
        let slot = Rc::new(RefCell::new(None));
        let sink = slot.clone();
        promise.on_settled(move |settled| *sink.borrow_mut() = Some(settled));
        slot
    }

    #[test]
    fn continuations_run_in_attachment_order() {
        let scheduler = Scheduler::new();
        let (promise, resolver) = TaskPromise::<u32>::pending(&scheduler);
        let record: Rc<RefCell<Vec<u32>>> = Rc::default();

        for tag in [1, 2, 3] {
            let record = record.clone();
            promise.on_settled(move |_| record.borrow_mut().push(tag));
        }
        resolver.resolve(7);

        assert!(record.borrow().is_empty(), "continuations must not run inline");
        scheduler.run_until_idle();
        assert_eq!(*record.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn late_attachment_to_a_settled_promise_still_fires() {
        let scheduler = Scheduler::new();
        let promise = TaskPromise::fulfilled(&scheduler, 41u32);
        scheduler.run_until_idle();

        let slot = outcome_slot(&promise);
        scheduler.run_until_idle();

        assert_eq!(*slot.borrow(), Some(Ok(41)));
    }

    #[test]
    fn then_chains_values_and_propagates_failures() {
        let scheduler = Scheduler::new();
        let (promise, resolver) = TaskPromise::<u32>::pending(&scheduler);
        let chained = promise
            .then(|settled| settled.map(|n| n + 1))
            .then(|settled| settled.and_then(|n| {
                if n % 2 == 0 {
                    Ok(n)
                } else {
                    Err(WorkflowFailure::new("odd"))
                }
            }));
        let slot = outcome_slot(&chained);

        resolver.resolve(2);
        scheduler.run_until_idle();

        assert_eq!(*slot.borrow(), Some(Err(WorkflowFailure::new("odd"))));
    }

    #[test]
    fn poll_surfaces_settlement_and_registers_a_waker_while_pending() {
        let scheduler = Scheduler::new();
        let (mut promise, resolver) = TaskPromise::<u32>::pending(&scheduler);
        let mut cx = std::task::Context::from_waker(Waker::noop());

        assert!(Pin::new(&mut promise).poll(&mut cx).is_pending());
        resolver.resolve(9);
        assert_eq!(Pin::new(&mut promise).poll(&mut cx), Poll::Ready(Ok(9)));
    }

    #[test]
    fn rejection_without_a_handler_is_reported_at_the_scheduler() {
        let scheduler = Scheduler::new();
        let _orphan = TaskPromise::<u32>::rejected(&scheduler, WorkflowFailure::new("dropped"));
        scheduler.run_until_idle();

        assert_eq!(
            scheduler.take_unhandled_rejections(),
            vec![WorkflowFailure::new("dropped")]
        );
    }

    #[test]
    fn attaching_a_handler_clears_the_unhandled_rejection() {
        let scheduler = Scheduler::new();
        let rejected = TaskPromise::<u32>::rejected(&scheduler, WorkflowFailure::new("caught"));
        let slot = outcome_slot(&rejected);
        scheduler.run_until_idle();

        assert_eq!(*slot.borrow(), Some(Err(WorkflowFailure::new("caught"))));
        assert!(scheduler.take_unhandled_rejections().is_empty());
    }

    #[test]
    fn handlers_attached_before_rejection_also_count() {
        let scheduler = Scheduler::new();
        let (promise, resolver) = TaskPromise::<u32>::pending(&scheduler);
        let slot = outcome_slot(&promise);

        resolver.reject(WorkflowFailure::new("seen"));
        scheduler.run_until_idle();

        assert_eq!(*slot.borrow(), Some(Err(WorkflowFailure::new("seen"))));
        assert!(scheduler.take_unhandled_rejections().is_empty());
    }

    #[test]
    fn all_of_collects_in_input_order_despite_settlement_order() {
        let scheduler = Scheduler::new();
        let (first, resolve_first) = TaskPromise::<u32>::pending(&scheduler);
        let (second, resolve_second) = TaskPromise::<u32>::pending(&scheduler);
        let joined = all_of(&scheduler, vec![first, second]);
        let slot = outcome_slot(&joined);

        resolve_second.resolve(2);
        resolve_first.resolve(1);
        scheduler.run_until_idle();

        assert_eq!(*slot.borrow(), Some(Ok(vec![1, 2])));
    }

    #[test]
    fn all_of_rejects_eagerly_on_the_first_rejection() {
        let scheduler = Scheduler::new();
        let (first, resolve_first) = TaskPromise::<u32>::pending(&scheduler);
        let (second, resolve_second) = TaskPromise::<u32>::pending(&scheduler);
        let joined = all_of(&scheduler, vec![first, second]);
        let slot = outcome_slot(&joined);

        resolve_second.reject(WorkflowFailure::new("boom"));
        scheduler.run_until_idle();
        assert_eq!(*slot.borrow(), Some(Err(WorkflowFailure::new("boom"))));

        // The straggler settles without disturbing the aggregate.
        resolve_first.resolve(1);
        scheduler.run_until_idle();
        assert_eq!(*slot.borrow(), Some(Err(WorkflowFailure::new("boom"))));
    }

    #[test]
    fn all_of_nothing_fulfills_with_an_empty_vec() {
        let scheduler = Scheduler::new();
        let joined = all_of::<u32>(&scheduler, Vec::new());
        let slot = outcome_slot(&joined);

        scheduler.run_until_idle();
        assert_eq!(*slot.borrow(), Some(Ok(Vec::new())));
    }

    #[test]
    fn race_settles_with_the_first_and_leaves_losers_pending() {
        let scheduler = Scheduler::new();
        let (fast, resolve_fast) = TaskPromise::<u32>::pending(&scheduler);
        let (slow, resolve_slow) = TaskPromise::<u32>::pending(&scheduler);
        let winner = race(&scheduler, vec![fast, slow.clone()]);
        let slot = outcome_slot(&winner);

        resolve_fast.resolve(20);
        scheduler.run_until_idle();
        assert_eq!(*slot.borrow(), Some(Ok(20)));

        // The loser was not cancelled: it can still settle and be observed.
        let loser_slot = outcome_slot(&slow);
        resolve_slow.resolve(30);
        scheduler.run_until_idle();
        assert_eq!(*loser_slot.borrow(), Some(Ok(30)));
    }

    #[test]
    fn race_propagates_a_losing_first_settlement_as_failure() {
        let scheduler = Scheduler::new();
        let (fast, resolve_fast) = TaskPromise::<u32>::pending(&scheduler);
        let (slow, _resolve_slow) = TaskPromise::<u32>::pending(&scheduler);
        let winner = race(&scheduler, vec![fast, slow]);
        let slot = outcome_slot(&winner);

        resolve_fast.reject(WorkflowFailure::new("first wins, badly"));
        scheduler.run_until_idle();

        assert_eq!(
            *slot.borrow(),
            Some(Err(WorkflowFailure::new("first wins, badly")))
        );
    }
}
