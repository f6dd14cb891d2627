//! Chat Bubble Animation
//!
//! A bubble pops in with a slight overshoot, settles, then floats up and
//! down until it is stopped. Stopping pops it out.

use std::time::Duration;

use crate::animation::{EasingFunction, Transform, Transition, TransitionProperty};
use crate::scheduler::{Scheduler, Ticket, TimerSet};
use crate::surface::{SurfaceKey, Surfaces};

/// Pop-in duration
pub const POP_IN_MS: u64 = 600;
/// Peak scale of the pop-in
pub const POP_SCALE: f32 = 1.05;
/// Delay from pop-in to settling at natural size
pub const SETTLE_MS: u64 = 300;
/// Delay from settling to the first float step
pub const FLOAT_DELAY_MS: u64 = 200;
/// Float half-period
pub const FLOAT_PERIOD_MS: u64 = 1000;
/// Float height (negative is up)
pub const FLOAT_OFFSET: f32 = -8.0;
/// Pop-out duration
pub const POP_OUT_MS: u64 = 400;

const POP_IN: Transition = Transition::new(TransitionProperty::All, POP_IN_MS, EasingFunction::EaseOutBack);
const FLOAT: Transition = Transition::new(TransitionProperty::Transform, FLOAT_PERIOD_MS, EasingFunction::EaseInOut);
const POP_OUT: Transition = Transition::new(TransitionProperty::All, POP_OUT_MS, EasingFunction::EaseOut);

/// Which chat bubble a task belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BubbleSlot {
    /// Bubble next to the intro avatar
    Intro,
    /// Bubble next to the blackboard avatar
    Blackboard,
}

impl BubbleSlot {
    /// Surface the bubble animates
    #[must_use]
    pub fn surface(self) -> SurfaceKey {
        match self {
            Self::Intro => SurfaceKey::IntroBubble,
            Self::Blackboard => SurfaceKey::BoardBubble,
        }
    }
}

/// Lifecycle of a bubble
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubblePhase {
    /// Collapsed and transparent
    Hidden,
    /// Growing past natural size
    PoppingIn,
    /// At natural size, float not yet started
    Settled,
    /// Bobbing up and down
    Floating,
    /// Shrinking away
    PoppingOut,
}

/// Deferred bubble work
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleTask {
    /// Shrink from the pop-in peak to natural size
    Settle(Ticket),
    /// Start the float loop
    BeginFloat(Ticket),
    /// One float step
    Float(Ticket),
}

/// Animation controller for one bubble surface
#[derive(Debug)]
pub struct ChatBubble {
    key: SurfaceKey,
    started: bool,
    /// Direction of the next float step
    rising: bool,
    phase: BubblePhase,
    timers: TimerSet,
}

impl ChatBubble {
    /// Create a controller for `key`
    ///
    /// Call [`reset`](Self::reset) to put the surface into its hidden state.
    #[must_use]
    pub fn new(key: SurfaceKey) -> Self {
        Self {
            key,
            started: false,
            rising: true,
            phase: BubblePhase::Hidden,
            timers: TimerSet::new(),
        }
    }

    /// Surface being animated
    #[must_use]
    pub fn key(&self) -> SurfaceKey {
        self.key
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> BubblePhase {
        self.phase
    }

    /// Whether `start` has run since the last `stop`/`reset`
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Jump to the hidden state without animating
    pub fn reset(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BubbleTask>) {
        self.timers.cancel_all(scheduler);
        self.started = false;
        self.phase = BubblePhase::Hidden;

        surfaces.set_opacity(self.key, 0.0);
        surfaces.set_transform(self.key, Transform::COLLAPSED, None);
    }

    /// Pop in, settle, then float (no-op if already started)
    pub fn start(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BubbleTask>) {
        if self.started {
            return;
        }
        self.started = true;
        self.phase = BubblePhase::PoppingIn;

        surfaces.set_opacity(self.key, 1.0);
        surfaces.set_transform(self.key, Transform::new(POP_SCALE, 0.0), Some(POP_IN));
        self.timers
            .schedule(scheduler, Duration::from_millis(SETTLE_MS), BubbleTask::Settle);
    }

    /// Stop floating and pop out
    pub fn stop(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BubbleTask>) {
        self.timers.cancel_all(scheduler);
        self.started = false;
        self.phase = BubblePhase::PoppingOut;

        surfaces.set_transform(self.key, Transform::COLLAPSED, Some(POP_OUT));
        surfaces.set_opacity(self.key, 0.0);
    }

    /// Handle a fired task
    pub fn on_task(&mut self, task: BubbleTask, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BubbleTask>) {
        let (BubbleTask::Settle(ticket) | BubbleTask::BeginFloat(ticket) | BubbleTask::Float(ticket)) = task;
        if !self.timers.settle(ticket) {
            tracing::trace!(?task, bubble = self.key.id(), "Ignoring stale bubble task");
            return;
        }

        match task {
            BubbleTask::Settle(_) => {
                self.phase = BubblePhase::Settled;
                surfaces.set_transform(self.key, Transform::IDENTITY, Some(POP_IN));
                self.timers
                    .schedule(scheduler, Duration::from_millis(FLOAT_DELAY_MS), BubbleTask::BeginFloat);
            }
            BubbleTask::BeginFloat(_) => {
                self.rising = true;
                self.schedule_float(scheduler);
            }
            BubbleTask::Float(_) => {
                self.phase = BubblePhase::Floating;
                let offset = if self.rising { FLOAT_OFFSET } else { 0.0 };
                surfaces.set_transform(self.key, Transform::new(1.0, offset), Some(FLOAT));
                self.rising = !self.rising;
                self.schedule_float(scheduler);
            }
        }
    }

    fn schedule_float(&mut self, scheduler: &mut impl Scheduler<BubbleTask>) {
        self.timers
            .schedule(scheduler, Duration::from_millis(FLOAT_PERIOD_MS), BubbleTask::Float);
    }
}
