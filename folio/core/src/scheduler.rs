//! Deferred Task Scheduling
//!
//! Every animation in folio is a chain of deferred steps. Components never
//! sleep; they hand a task to a [`Scheduler`] and return immediately. When the
//! delay elapses the host hands the task back to the component that owns it.
//!
//! # Design
//!
//! - [`Timeline`] is a virtual-clock timer queue. Hosts advance it with the
//!   wall clock (the TUI) or by hand (tests), so sequencing is deterministic.
//! - [`Scoped`] lets a component schedule its own task type inside a parent's
//!   timeline (the blackboard wraps its engine's steps, the stage wraps every
//!   component's tasks).
//! - [`TimerSet`] tracks the live timers of one component. A fired task must
//!   [`settle`](TimerSet::settle) its ticket before acting, so a task that
//!   outlived a `stop()`/`reset()` is a no-op.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::marker::PhantomData;
use std::time::Duration;

/// Handle to a scheduled task, used for cancellation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Something that can run a task after a delay
pub trait Scheduler<T> {
    /// Schedule `task` to fire after `delay`
    fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle;

    /// Cancel a scheduled task
    ///
    /// Returns `false` if the task already fired or was already cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

/// Virtual-clock timer queue
///
/// Tasks fire in due order; tasks due at the same instant fire in the order
/// they were scheduled.
#[derive(Debug)]
pub struct Timeline<T> {
    /// Current virtual time
    now: Duration,
    /// Sequence number for the next scheduled task
    next_seq: u64,
    /// (due, seq) min-heap; cancelled entries are skipped lazily
    queue: BinaryHeap<Reverse<(Duration, u64)>>,
    /// Live tasks by sequence number
    tasks: HashMap<u64, T>,
}

impl<T> Timeline<T> {
    /// Create an empty timeline at time zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
            tasks: HashMap::new(),
        }
    }

    /// Current virtual time
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of live (not fired, not cancelled) tasks
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is waiting
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Due time of the earliest live task
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.discard_cancelled();
        self.queue.peek().map(|Reverse((due, _))| *due)
    }

    /// Pop the earliest live task due at or before `until`
    ///
    /// The clock moves to the popped task's due time, so tasks scheduled
    /// while handling it are timed relative to the moment it fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        self.discard_cancelled();
        let Reverse((due, seq)) = *self.queue.peek()?;
        if due > until {
            return None;
        }
        self.queue.pop();
        self.now = self.now.max(due);
        self.tasks.remove(&seq)
    }

    /// Move the clock forward to `now` (never backwards)
    pub fn advance(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, seq))) = self.queue.peek() {
            if self.tasks.contains_key(seq) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> for Timeline<T> {
    fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((self.now + delay, seq)));
        self.tasks.insert(seq, task);
        TimerHandle(seq)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.tasks.remove(&handle.0).is_some()
    }
}

/// A scheduler that wraps tasks before handing them to a parent scheduler
pub struct Scoped<'a, S: ?Sized, F, U> {
    inner: &'a mut S,
    wrap: F,
    _task: PhantomData<fn() -> U>,
}

/// Schedule child tasks through `inner`, wrapping each with `wrap`
pub fn scoped<S, F, U>(inner: &mut S, wrap: F) -> Scoped<'_, S, F, U>
where
    S: Scheduler<U> + ?Sized,
{
    Scoped {
        inner,
        wrap,
        _task: PhantomData,
    }
}

impl<T, U, S, F> Scheduler<T> for Scoped<'_, S, F, U>
where
    S: Scheduler<U> + ?Sized,
    F: Fn(T) -> U,
{
    fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        self.inner.schedule(delay, (self.wrap)(task))
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.inner.cancel(handle)
    }
}

/// Identifies one timer inside a [`TimerSet`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// The live timers of one component
#[derive(Debug, Default)]
pub struct TimerSet {
    next_ticket: u64,
    live: HashMap<Ticket, TimerHandle>,
}

impl TimerSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task built from a fresh ticket
    pub fn schedule<T>(
        &mut self,
        scheduler: &mut impl Scheduler<T>,
        delay: Duration,
        make: impl FnOnce(Ticket) -> T,
    ) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let handle = scheduler.schedule(delay, make(ticket));
        self.live.insert(ticket, handle);
        ticket
    }

    /// Mark a ticket as fired
    ///
    /// Returns `false` if the ticket was cancelled in the meantime; the
    /// caller must then ignore the task.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        self.live.remove(&ticket).is_some()
    }

    /// Cancel every live timer
    pub fn cancel_all<T>(&mut self, scheduler: &mut impl Scheduler<T>) {
        for (_, handle) in self.live.drain() {
            scheduler.cancel(handle);
        }
    }

    /// Number of live timers
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no timer is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
