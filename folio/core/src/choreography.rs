//! Section Choreography
//!
//! Entrance and exit sequences for the two page sections, driven by how
//! much of each section is visible.
//!
//! The choreography only touches the section frames (avatar circles, chat
//! box, dialogue). Everything else it wants done (typing, bubbles, board
//! reset) comes back to the caller as [`Cue`]s, in the order they should
//! run.
//!
//! # Timing
//!
//! ```text
//! intro enter   0ms circle pops
//!             300ms chat box pops (typing starts 30ms after its animation ends)
//!            1000ms bubble pops
//! intro exit    0ms chat box hidden, typing reset
//!             100ms circle hidden
//!             200ms bubble pops out
//! board enter   0ms circle pops
//!             500ms bubble pops
//!            1000ms dialogue unfolds (still transparent)
//! board exit    0ms dialogue hidden
//!             100ms circle hidden
//!             200ms bubble pops out
//!             600ms board reset
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bubble::BubbleSlot;
use crate::scheduler::{Scheduler, Ticket, TimerSet};
use crate::surface::{classes, SurfaceKey, Surfaces};

const INTRO_BUBBLE_DELAY_MS: u64 = 1000;
const INTRO_BOX_DELAY_MS: u64 = 300;
const TYPING_DELAY_MS: u64 = 30;
const BOARD_BUBBLE_DELAY_MS: u64 = 500;
const BOARD_DIALOGUE_DELAY_MS: u64 = 1000;
const CIRCLE_EXIT_DELAY_MS: u64 = 100;
const BUBBLE_EXIT_DELAY_MS: u64 = 200;
const BOARD_RESET_DELAY_MS: u64 = 600;

/// A page section with its own entrance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    /// Avatar, bubble and typewriter
    Intro,
    /// Q&A blackboard
    Blackboard,
}

/// When a section counts as visible
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityPolicy {
    /// Minimum visible fraction of the section
    pub threshold: f32,
    /// Inset applied to both viewport edges before measuring, in CSS pixels
    pub root_margin: f32,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            root_margin: 50.0,
        }
    }
}

impl VisibilityPolicy {
    /// Fraction of a section (`top`, `height`) inside the inset viewport
    ///
    /// `top` is relative to the viewport's top edge.
    #[must_use]
    pub fn visible_ratio(&self, top: f32, height: f32, viewport_height: f32) -> f32 {
        if height <= 0.0 {
            return 0.0;
        }
        let view_top = self.root_margin;
        let view_bottom = viewport_height - self.root_margin;
        let overlap = (top + height).min(view_bottom) - top.max(view_top);
        (overlap / height).clamp(0.0, 1.0)
    }

    /// Whether `ratio` is enough for a hidden section to enter
    #[must_use]
    pub fn is_intersecting(&self, ratio: f32) -> bool {
        ratio > 0.0 && ratio >= self.threshold
    }

    /// Whether a section that entered stays in at `ratio`
    ///
    /// Once in, a section only leaves when nothing of it is inside the
    /// inset viewport.
    #[must_use]
    pub fn stays_in(&self, ratio: f32) -> bool {
        ratio > 0.0
    }
}

/// Work the choreography hands back to its owner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Reset the intro typewriter
    ResetIntro,
    /// Start the intro typewriter
    StartIntro,
    /// Put a bubble in its hidden state
    ResetBubble(BubbleSlot),
    /// Pop a bubble in
    StartBubble(BubbleSlot),
    /// Pop a bubble out
    StopBubble(BubbleSlot),
    /// Reset the blackboard to its questions
    ResetBlackboard,
}

/// Deferred choreography work
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoreoTask {
    /// Pop the intro bubble
    IntroBubbleIn(Ticket),
    /// Pop the intro chat box
    IntroChatBoxIn(Ticket),
    /// Start typing in the intro chat box
    IntroTyping(Ticket),
    /// Hide the intro circle
    IntroCircleOut(Ticket),
    /// Pop the intro bubble out
    IntroBubbleOut(Ticket),
    /// Pop the blackboard bubble
    BoardBubbleIn(Ticket),
    /// Unfold the blackboard dialogue
    BoardDialogueIn(Ticket),
    /// Hide the blackboard circle
    BoardCircleOut(Ticket),
    /// Pop the blackboard bubble out
    BoardBubbleOut(Ticket),
    /// Reset the blackboard
    BoardReset(Ticket),
}

impl ChoreoTask {
    fn ticket(self) -> Ticket {
        match self {
            Self::IntroBubbleIn(t)
            | Self::IntroChatBoxIn(t)
            | Self::IntroTyping(t)
            | Self::IntroCircleOut(t)
            | Self::IntroBubbleOut(t)
            | Self::BoardBubbleIn(t)
            | Self::BoardDialogueIn(t)
            | Self::BoardCircleOut(t)
            | Self::BoardBubbleOut(t)
            | Self::BoardReset(t) => t,
        }
    }

    fn section(self) -> Section {
        match self {
            Self::IntroBubbleIn(_)
            | Self::IntroChatBoxIn(_)
            | Self::IntroTyping(_)
            | Self::IntroCircleOut(_)
            | Self::IntroBubbleOut(_) => Section::Intro,
            _ => Section::Blackboard,
        }
    }
}

/// Visibility-driven entrance and exit sequencing
#[derive(Debug)]
pub struct Choreography {
    policy: VisibilityPolicy,
    intro_in: bool,
    board_in: bool,
    intro_timers: TimerSet,
    board_timers: TimerSet,
    /// The chat box pop is armed and typing waits for it to end
    awaiting_box_pop: bool,
}

impl Choreography {
    /// Create a choreography with both sections out of view
    #[must_use]
    pub fn new(policy: VisibilityPolicy) -> Self {
        Self {
            policy,
            intro_in: false,
            board_in: false,
            intro_timers: TimerSet::new(),
            board_timers: TimerSet::new(),
            awaiting_box_pop: false,
        }
    }

    /// Visibility policy
    #[must_use]
    pub fn policy(&self) -> &VisibilityPolicy {
        &self.policy
    }

    /// Whether a section has entered
    #[must_use]
    pub fn is_in(&self, section: Section) -> bool {
        match section {
            Section::Intro => self.intro_in,
            Section::Blackboard => self.board_in,
        }
    }

    /// Whether typing waits for the chat box animation
    #[must_use]
    pub fn is_awaiting_chat_box(&self) -> bool {
        self.awaiting_box_pop
    }

    /// Put every section frame into its pre-entrance state
    pub fn mount(&self, surfaces: &mut dyn Surfaces) -> Vec<Cue> {
        for key in [
            SurfaceKey::IntroCircle,
            SurfaceKey::IntroChatBox,
            SurfaceKey::BoardCircle,
            SurfaceKey::BoardDialogue,
        ] {
            collapse(surfaces, key);
        }
        vec![
            Cue::ResetBubble(BubbleSlot::Intro),
            Cue::ResetBubble(BubbleSlot::Blackboard),
        ]
    }

    /// Report the visible ratio of a section
    ///
    /// Only edges (out to in, in to out) do anything.
    pub fn set_visibility(
        &mut self,
        section: Section,
        ratio: f32,
        surfaces: &mut dyn Surfaces,
        scheduler: &mut impl Scheduler<ChoreoTask>,
    ) -> Vec<Cue> {
        let was_in = self.is_in(section);
        let visible = if was_in {
            self.policy.stays_in(ratio)
        } else {
            self.policy.is_intersecting(ratio)
        };
        if visible == was_in {
            return Vec::new();
        }
        tracing::debug!(?section, ratio, visible, "Section visibility changed");

        match (section, visible) {
            (Section::Intro, true) => self.intro_enter(surfaces, scheduler),
            (Section::Intro, false) => self.intro_exit(surfaces, scheduler),
            (Section::Blackboard, true) => self.board_enter(surfaces, scheduler),
            (Section::Blackboard, false) => self.board_exit(surfaces, scheduler),
        }
    }

    /// Report that a surface's class animation finished
    pub fn animation_ended(&mut self, key: SurfaceKey, scheduler: &mut impl Scheduler<ChoreoTask>) {
        if key != SurfaceKey::IntroChatBox || !self.awaiting_box_pop {
            return;
        }
        self.awaiting_box_pop = false;
        self.intro_timers
            .schedule(scheduler, Duration::from_millis(TYPING_DELAY_MS), ChoreoTask::IntroTyping);
    }

    /// Handle a fired task
    pub fn on_task(&mut self, task: ChoreoTask, surfaces: &mut dyn Surfaces) -> Vec<Cue> {
        let timers = match task.section() {
            Section::Intro => &mut self.intro_timers,
            Section::Blackboard => &mut self.board_timers,
        };
        if !timers.settle(task.ticket()) {
            tracing::trace!(?task, "Ignoring stale choreography task");
            return Vec::new();
        }

        match task {
            ChoreoTask::IntroBubbleIn(_) => pop_bubble(BubbleSlot::Intro),
            ChoreoTask::IntroChatBoxIn(_) => {
                let key = SurfaceKey::IntroChatBox;
                surfaces.remove_classes(key, &[classes::ANIMATE_POP, classes::ANIMATE_STRONG_POP]);
                surfaces.remove_classes(key, &classes::COLLAPSED);
                surfaces.arm_animation_end(key);
                surfaces.add_classes(key, &[classes::ANIMATE_QUICK_POP]);
                self.awaiting_box_pop = true;
                Vec::new()
            }
            ChoreoTask::IntroTyping(_) => vec![Cue::StartIntro],
            ChoreoTask::IntroCircleOut(_) => {
                collapse(surfaces, SurfaceKey::IntroCircle);
                Vec::new()
            }
            ChoreoTask::IntroBubbleOut(_) => vec![Cue::StopBubble(BubbleSlot::Intro)],
            ChoreoTask::BoardBubbleIn(_) => pop_bubble(BubbleSlot::Blackboard),
            ChoreoTask::BoardDialogueIn(_) => {
                surfaces.remove_classes(SurfaceKey::BoardDialogue, &classes::COLLAPSED);
                surfaces.set_opacity(SurfaceKey::BoardDialogue, 0.0);
                Vec::new()
            }
            ChoreoTask::BoardCircleOut(_) => {
                collapse(surfaces, SurfaceKey::BoardCircle);
                Vec::new()
            }
            ChoreoTask::BoardBubbleOut(_) => vec![Cue::StopBubble(BubbleSlot::Blackboard)],
            ChoreoTask::BoardReset(_) => vec![Cue::ResetBlackboard],
        }
    }

    fn intro_enter(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<ChoreoTask>) -> Vec<Cue> {
        self.intro_in = true;
        self.intro_timers.cancel_all(scheduler);

        pop(surfaces, SurfaceKey::IntroCircle);
        self.intro_timers.schedule(
            scheduler,
            Duration::from_millis(INTRO_BUBBLE_DELAY_MS),
            ChoreoTask::IntroBubbleIn,
        );
        self.intro_timers.schedule(
            scheduler,
            Duration::from_millis(INTRO_BOX_DELAY_MS),
            ChoreoTask::IntroChatBoxIn,
        );
        vec![Cue::ResetIntro]
    }

    fn intro_exit(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<ChoreoTask>) -> Vec<Cue> {
        self.intro_in = false;
        self.awaiting_box_pop = false;
        self.intro_timers.cancel_all(scheduler);

        collapse(surfaces, SurfaceKey::IntroChatBox);
        self.intro_timers.schedule(
            scheduler,
            Duration::from_millis(CIRCLE_EXIT_DELAY_MS),
            ChoreoTask::IntroCircleOut,
        );
        self.intro_timers.schedule(
            scheduler,
            Duration::from_millis(BUBBLE_EXIT_DELAY_MS),
            ChoreoTask::IntroBubbleOut,
        );
        vec![Cue::ResetIntro]
    }

    fn board_enter(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<ChoreoTask>) -> Vec<Cue> {
        self.board_in = true;
        self.board_timers.cancel_all(scheduler);

        pop(surfaces, SurfaceKey::BoardCircle);
        self.board_timers.schedule(
            scheduler,
            Duration::from_millis(BOARD_BUBBLE_DELAY_MS),
            ChoreoTask::BoardBubbleIn,
        );
        self.board_timers.schedule(
            scheduler,
            Duration::from_millis(BOARD_DIALOGUE_DELAY_MS),
            ChoreoTask::BoardDialogueIn,
        );
        Vec::new()
    }

    fn board_exit(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<ChoreoTask>) -> Vec<Cue> {
        self.board_in = false;
        self.board_timers.cancel_all(scheduler);

        collapse(surfaces, SurfaceKey::BoardDialogue);
        self.board_timers.schedule(
            scheduler,
            Duration::from_millis(CIRCLE_EXIT_DELAY_MS),
            ChoreoTask::BoardCircleOut,
        );
        self.board_timers.schedule(
            scheduler,
            Duration::from_millis(BUBBLE_EXIT_DELAY_MS),
            ChoreoTask::BoardBubbleOut,
        );
        self.board_timers.schedule(
            scheduler,
            Duration::from_millis(BOARD_RESET_DELAY_MS),
            ChoreoTask::BoardReset,
        );
        Vec::new()
    }
}

fn pop(surfaces: &mut dyn Surfaces, key: SurfaceKey) {
    surfaces.remove_classes(key, &classes::COLLAPSED);
    surfaces.add_classes(key, &[classes::ANIMATE_POP]);
}

fn collapse(surfaces: &mut dyn Surfaces, key: SurfaceKey) {
    surfaces.remove_classes(key, &classes::POP_ANIMATIONS);
    surfaces.add_classes(key, &classes::COLLAPSED);
}

fn pop_bubble(slot: BubbleSlot) -> Vec<Cue> {
    vec![Cue::ResetBubble(slot), Cue::StartBubble(slot)]
}
