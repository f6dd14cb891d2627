//! Stage
//!
//! The composition root. A [`Stage`] owns every component, the surfaces they
//! draw on, and the one [`Timeline`] all of their deferred work runs on.
//! Hosts talk to the stage only:
//!
//! - [`Stage::set_visibility`] when scrolling changes what is on screen
//! - [`Stage::activate`] when a control is clicked or picked
//! - [`Stage::animation_ended`] when an armed class animation finishes
//! - [`Stage::advance_to`] to let time pass

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::blackboard::{Blackboard, BoardTask, NavigationState};
use crate::bubble::{BubbleSlot, BubbleTask, ChatBubble};
use crate::choreography::{ChoreoTask, Choreography, Cue, Section};
use crate::config::FolioConfig;
use crate::content::ContentStore;
use crate::scheduler::{scoped, Timeline};
use crate::surface::{SurfaceKey, SurfaceMap, Surfaces};
use crate::typewriter::{IntroPhase, IntroTask, IntroTypewriter, TypewriterEngine};

/// Any deferred work on the page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageTask {
    /// Intro typewriter work
    Intro(IntroTask),
    /// Blackboard work
    Board(BoardTask),
    /// Chat bubble work
    Bubble(BubbleSlot, BubbleTask),
    /// Section choreography work
    Choreo(ChoreoTask),
}

/// The whole interactive page
pub struct Stage<S = SurfaceMap> {
    surfaces: S,
    timeline: Timeline<StageTask>,
    intro: IntroTypewriter,
    blackboard: Blackboard,
    bubbles: BTreeMap<BubbleSlot, ChatBubble>,
    choreography: Choreography,
    content: Arc<ContentStore>,
}

impl<S: Surfaces> Stage<S> {
    /// Build the page over `surfaces` and put it in its initial state
    pub fn new(config: &FolioConfig, content: Arc<ContentStore>, surfaces: S) -> Self {
        Self::with_engines(
            config,
            content,
            surfaces,
            TypewriterEngine::new(config.intro.clone()),
            TypewriterEngine::new(config.blackboard.clone()),
        )
    }

    /// Like [`Stage::new`], with deterministic typing jitter
    pub fn with_seed(config: &FolioConfig, content: Arc<ContentStore>, surfaces: S, seed: u64) -> Self {
        Self::with_engines(
            config,
            content,
            surfaces,
            TypewriterEngine::with_seed(config.intro.clone(), seed),
            TypewriterEngine::with_seed(config.blackboard.clone(), seed.wrapping_add(1)),
        )
    }

    fn with_engines(
        config: &FolioConfig,
        content: Arc<ContentStore>,
        surfaces: S,
        intro_engine: TypewriterEngine,
        board_engine: TypewriterEngine,
    ) -> Self {
        let intro = IntroTypewriter::new(
            intro_engine,
            content.intro_chunks().to_vec(),
            SurfaceKey::IntroText,
            SurfaceKey::IntroCursor,
        );
        let blackboard = Blackboard::new(board_engine, Arc::clone(&content));
        let bubbles = [BubbleSlot::Intro, BubbleSlot::Blackboard]
            .into_iter()
            .map(|slot| (slot, ChatBubble::new(slot.surface())))
            .collect();

        let mut stage = Self {
            surfaces,
            timeline: Timeline::new(),
            intro,
            blackboard,
            bubbles,
            choreography: Choreography::new(config.visibility),
            content,
        };

        stage.blackboard.mount(&mut stage.surfaces);
        let cues = stage.choreography.mount(&mut stage.surfaces);
        stage.apply(cues);
        tracing::debug!(topics = stage.content.topic_count(), "Stage mounted");
        stage
    }

    // =========================================================================
    // Host input
    // =========================================================================

    /// Report the visible ratio of a section
    pub fn set_visibility(&mut self, section: Section, ratio: f32) {
        let cues = self.choreography.set_visibility(
            section,
            ratio,
            &mut self.surfaces,
            &mut scoped(&mut self.timeline, StageTask::Choreo),
        );
        self.apply(cues);
    }

    /// Activate a control by id
    pub fn activate(&mut self, control_id: &str) {
        tracing::debug!(control = control_id, "Control activated");
        self.select_topic(control_id);
    }

    /// Navigate the blackboard
    pub fn select_topic(&mut self, id: &str) {
        self.blackboard.select_topic(
            id,
            &mut self.surfaces,
            &mut scoped(&mut self.timeline, StageTask::Board),
        );
    }

    /// Go back one blackboard topic
    pub fn go_back(&mut self) {
        self.blackboard
            .go_back(&mut self.surfaces, &mut scoped(&mut self.timeline, StageTask::Board));
    }

    /// Return the blackboard to its questions
    pub fn reset_blackboard(&mut self) {
        self.blackboard
            .reset(&mut self.surfaces, &mut scoped(&mut self.timeline, StageTask::Board));
    }

    /// Report that an armed animation on `key` finished
    pub fn animation_ended(&mut self, key: SurfaceKey) {
        self.choreography
            .animation_ended(key, &mut scoped(&mut self.timeline, StageTask::Choreo));
    }

    /// Fire every task due at or before `now`, in due order
    ///
    /// Returns the number of tasks fired.
    pub fn advance_to(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while let Some(task) = self.timeline.pop_due(now) {
            self.dispatch(task);
            fired += 1;
        }
        self.timeline.advance(now);
        fired
    }

    /// When the next task is due
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.timeline.next_deadline()
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Current stage time
    #[must_use]
    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// Number of scheduled tasks
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.timeline.pending()
    }

    /// Blackboard navigation state
    #[must_use]
    pub fn navigation(&self) -> &NavigationState {
        self.blackboard.navigation()
    }

    /// Intro typewriter phase
    #[must_use]
    pub fn intro_phase(&self) -> IntroPhase {
        self.intro.phase()
    }

    /// The intro typewriter
    #[must_use]
    pub fn intro(&self) -> &IntroTypewriter {
        &self.intro
    }

    /// The blackboard
    #[must_use]
    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// A chat bubble
    #[must_use]
    pub fn bubble(&self, slot: BubbleSlot) -> Option<&ChatBubble> {
        self.bubbles.get(&slot)
    }

    /// The section choreography
    #[must_use]
    pub fn choreography(&self) -> &Choreography {
        &self.choreography
    }

    /// Content on the page
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Surfaces the page draws on
    #[must_use]
    pub fn surfaces(&self) -> &S {
        &self.surfaces
    }

    /// Mutable surfaces (hosts consume animation-end flags through this)
    pub fn surfaces_mut(&mut self) -> &mut S {
        &mut self.surfaces
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn dispatch(&mut self, task: StageTask) {
        match task {
            StageTask::Intro(task) => {
                self.intro
                    .on_task(task, &mut self.surfaces, &mut scoped(&mut self.timeline, StageTask::Intro));
            }
            StageTask::Board(task) => {
                self.blackboard
                    .on_task(task, &mut self.surfaces, &mut scoped(&mut self.timeline, StageTask::Board));
            }
            StageTask::Bubble(slot, task) => {
                if let Some(bubble) = self.bubbles.get_mut(&slot) {
                    bubble.on_task(
                        task,
                        &mut self.surfaces,
                        &mut scoped(&mut self.timeline, move |t| StageTask::Bubble(slot, t)),
                    );
                }
            }
            StageTask::Choreo(task) => {
                let cues = self.choreography.on_task(task, &mut self.surfaces);
                self.apply(cues);
            }
        }
    }

    fn apply(&mut self, cues: Vec<Cue>) {
        for cue in cues {
            tracing::trace!(?cue, "Applying choreography cue");
            match cue {
                Cue::ResetIntro => self
                    .intro
                    .reset(&mut self.surfaces, &mut scoped(&mut self.timeline, StageTask::Intro)),
                Cue::StartIntro => self
                    .intro
                    .start(&mut self.surfaces, &mut scoped(&mut self.timeline, StageTask::Intro)),
                Cue::ResetBlackboard => self
                    .blackboard
                    .reset(&mut self.surfaces, &mut scoped(&mut self.timeline, StageTask::Board)),
                Cue::ResetBubble(slot) | Cue::StartBubble(slot) | Cue::StopBubble(slot) => {
                    let Some(bubble) = self.bubbles.get_mut(&slot) else {
                        continue;
                    };
                    let surfaces = &mut self.surfaces;
                    let mut scheduler = scoped(&mut self.timeline, move |t| StageTask::Bubble(slot, t));
                    match cue {
                        Cue::ResetBubble(_) => bubble.reset(surfaces, &mut scheduler),
                        Cue::StartBubble(_) => bubble.start(surfaces, &mut scheduler),
                        _ => bubble.stop(surfaces, &mut scheduler),
                    }
                }
            }
        }
    }
}

impl<S> std::fmt::Debug for Stage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("now", &self.timeline.now())
            .field("pending", &self.timeline.pending())
            .field("navigation", self.blackboard.navigation())
            .field("intro", &self.intro.phase())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::BubblePhase;
    use crate::surface::classes;
    use pretty_assertions::assert_eq;

    fn stage() -> Stage {
        Stage::with_seed(
            &FolioConfig::default(),
            Arc::new(ContentStore::builtin()),
            SurfaceMap::full(),
            42,
        )
    }

    #[test]
    fn test_mount_state() {
        let stage = stage();
        let surfaces = stage.surfaces();

        assert!(!surfaces.get(SurfaceKey::IntroChatBox).unwrap().is_visible());
        assert!(!surfaces.get(SurfaceKey::IntroBubble).unwrap().is_visible());
        assert!(surfaces.get(SurfaceKey::BoardFollowups).unwrap().has_class(classes::HIDDEN));
        assert_eq!(surfaces.get(SurfaceKey::BoardQuestions).unwrap().controls().len(), 4);
        assert_eq!(stage.intro_phase(), IntroPhase::Idle);
        assert_eq!(stage.pending_tasks(), 0);
    }

    #[test]
    fn test_visibility_routes_to_bubble() {
        let mut stage = stage();
        stage.set_visibility(Section::Blackboard, 1.0);
        stage.advance_to(Duration::from_millis(500));

        let bubble = stage.bubble(BubbleSlot::Blackboard).unwrap();
        assert_eq!(bubble.phase(), BubblePhase::PoppingIn);
        assert!(stage.surfaces().get(SurfaceKey::BoardBubble).unwrap().is_visible());
    }

    #[test]
    fn test_activate_navigates() {
        let mut stage = stage();
        stage.activate("education");
        stage.activate("education-uni");
        assert_eq!(stage.navigation().current(), Some("education-uni"));

        stage.go_back();
        assert_eq!(stage.navigation().current(), Some("education"));

        stage.reset_blackboard();
        assert!(stage.navigation().is_empty());
    }

    #[test]
    fn test_advance_fires_in_order_and_reports_count() {
        let mut stage = stage();
        stage.activate("music");
        assert_eq!(stage.next_deadline(), Some(Duration::from_millis(300)));
        assert_eq!(stage.advance_to(Duration::from_millis(299)), 0);
        assert!(stage.advance_to(Duration::from_millis(300)) >= 2);
        assert_eq!(stage.now(), Duration::from_millis(300));
    }
}
