//! Blackboard Q&A
//!
//! A small navigation state machine over the topic graph. Selecting a topic
//! pushes the previous one onto a history stack; `back` pops it; `main`
//! returns to the question list.
//!
//! # Rendering
//!
//! Every navigation swaps the board through a short sequence of deferred
//! steps (fade the old list, type the answer, fade the new list in). All of
//! them live in one [`TimerSet`]; each navigation cancels the set before
//! scheduling its own steps, so a fast click never interleaves two renders.

use std::sync::Arc;
use std::time::Duration;

use crate::content::{ContentStore, NavToken, TopicId};
use crate::scheduler::{scoped, Scheduler, Ticket, TimerSet};
use crate::surface::{classes, SurfaceKey, Surfaces};
use crate::typewriter::{EngineStep, TypeOptions, TypewriterEngine};

/// Fade duration between board states
pub const TRANSITION_MS: u64 = 300;

/// Delay between rebuilding the follow-ups and fading them in
pub const FOLLOWUP_FADE_MS: u64 = 50;

/// Where the reader is in the topic graph
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationState {
    current: Option<TopicId>,
    previous: Option<TopicId>,
    history: Vec<TopicId>,
}

impl NavigationState {
    /// Topic on screen
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Topic `back` would return to
    #[must_use]
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Back stack, oldest first
    #[must_use]
    pub fn history(&self) -> &[TopicId] {
        &self.history
    }

    /// Whether nothing is selected and the stack is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.history.is_empty()
    }

    /// Move forward to `id`, stacking the current topic unless it is `id`
    fn advance(&mut self, id: &str) {
        if let Some(current) = self.current.take() {
            if current != id {
                self.history.push(current);
            }
        }
        self.land(id.to_string());
    }

    fn pop(&mut self) -> Option<TopicId> {
        self.history.pop()
    }

    fn land(&mut self, id: TopicId) {
        self.current = Some(id);
        self.previous = self.history.last().cloned();
    }

    fn clear(&mut self) {
        self.current = None;
        self.previous = None;
        self.history.clear();
    }
}

/// Deferred blackboard work
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardTask {
    /// Step of the blackboard's engine
    Engine(EngineStep),
    /// Show the dialogue and type the current answer
    RevealAnswer(Ticket),
    /// Swap the question list for the current follow-ups
    ShowFollowups(Ticket),
    /// Fade the rebuilt follow-ups in
    FadeInFollowups(Ticket),
    /// Clear the answer and bring back the idle prompt
    ClearAnswer(Ticket),
    /// Swap the follow-ups for the question list
    ShowQuestions(Ticket),
}

/// The Q&A widget
#[derive(Debug)]
pub struct Blackboard {
    engine: TypewriterEngine,
    content: Arc<ContentStore>,
    nav: NavigationState,
    timers: TimerSet,
}

impl Blackboard {
    /// Create a board over `content`
    #[must_use]
    pub fn new(engine: TypewriterEngine, content: Arc<ContentStore>) -> Self {
        Self {
            engine,
            content,
            nav: NavigationState::default(),
            timers: TimerSet::new(),
        }
    }

    /// Put the main questions on the board and hide the follow-ups
    pub fn mount(&self, surfaces: &mut dyn Surfaces) {
        surfaces.set_controls(SurfaceKey::BoardQuestions, self.content.questions());
        surfaces.add_classes(SurfaceKey::BoardFollowups, &[classes::HIDDEN]);
        surfaces.set_opacity(SurfaceKey::BoardFollowups, 0.0);
    }

    /// Navigation state
    #[must_use]
    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    /// The engine typing answers
    #[must_use]
    pub fn engine(&self) -> &TypewriterEngine {
        &self.engine
    }

    /// Content being navigated
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Navigate to a topic or a navigation token
    ///
    /// Unknown ids are ignored.
    pub fn select_topic(&mut self, id: &str, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BoardTask>) {
        match NavToken::parse(id) {
            Some(NavToken::Back) => self.go_back(surfaces, scheduler),
            Some(NavToken::Main) => self.reset(surfaces, scheduler),
            None => {
                if self.content.topic(id).is_none() {
                    tracing::debug!(topic = id, "Ignoring unknown topic");
                    return;
                }
                self.nav.advance(id);
                tracing::debug!(
                    topic = id,
                    depth = self.nav.history.len(),
                    "Selected topic"
                );
                self.render_topic(surfaces, scheduler);
            }
        }
    }

    /// Return to the previous topic, or to the questions when there is none
    pub fn go_back(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BoardTask>) {
        let Some(previous) = self.nav.pop() else {
            self.reset(surfaces, scheduler);
            return;
        };
        if self.content.topic(&previous).is_none() {
            tracing::debug!(topic = %previous, "Back target no longer exists");
            self.reset(surfaces, scheduler);
            return;
        }

        tracing::debug!(topic = %previous, "Went back");
        self.nav.land(previous);
        self.render_topic(surfaces, scheduler);
    }

    /// Clear navigation and bring back the main questions
    pub fn reset(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BoardTask>) {
        self.nav.clear();
        self.cancel(scheduler);

        surfaces.set_opacity(SurfaceKey::BoardDialogue, 0.0);
        self.after(scheduler, TRANSITION_MS, BoardTask::ClearAnswer);

        surfaces.set_opacity(SurfaceKey::BoardFollowups, 0.0);
        self.after(scheduler, TRANSITION_MS, BoardTask::ShowQuestions);
    }

    /// Handle a fired task
    pub fn on_task(&mut self, task: BoardTask, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BoardTask>) {
        let ticket = match task {
            BoardTask::Engine(step) => {
                let _ = self
                    .engine
                    .on_step(step, surfaces, &mut scoped(&mut *scheduler, BoardTask::Engine));
                return;
            }
            BoardTask::RevealAnswer(t)
            | BoardTask::ShowFollowups(t)
            | BoardTask::FadeInFollowups(t)
            | BoardTask::ClearAnswer(t)
            | BoardTask::ShowQuestions(t) => t,
        };
        if !self.timers.settle(ticket) {
            tracing::trace!(?task, "Ignoring stale blackboard task");
            return;
        }

        match task {
            BoardTask::RevealAnswer(_) => {
                let Some(topic) = self.nav.current().and_then(|id| self.content.topic(id)) else {
                    return;
                };
                surfaces.set_opacity(SurfaceKey::BoardDialogue, 1.0);
                let _ = self.engine.type_text(
                    &topic.answer,
                    SurfaceKey::BoardAnswer,
                    Some(SurfaceKey::BoardCursor),
                    TypeOptions::default(),
                    surfaces,
                    &mut scoped(&mut *scheduler, BoardTask::Engine),
                );
            }
            BoardTask::ShowFollowups(_) => {
                let Some(topic) = self.nav.current().and_then(|id| self.content.topic(id)) else {
                    return;
                };
                surfaces.add_classes(SurfaceKey::BoardQuestions, &[classes::HIDDEN]);
                surfaces.remove_classes(SurfaceKey::BoardFollowups, &[classes::HIDDEN]);
                surfaces.set_controls(SurfaceKey::BoardFollowups, &topic.followups);
                surfaces.set_opacity(SurfaceKey::BoardFollowups, 0.0);
                self.after(scheduler, FOLLOWUP_FADE_MS, BoardTask::FadeInFollowups);
            }
            BoardTask::FadeInFollowups(_) => {
                surfaces.set_opacity(SurfaceKey::BoardFollowups, 1.0);
            }
            BoardTask::ClearAnswer(_) => {
                surfaces.set_text(SurfaceKey::BoardAnswer, "");
                surfaces.set_opacity(SurfaceKey::BoardBubble, 1.0);
            }
            BoardTask::ShowQuestions(_) => {
                surfaces.add_classes(SurfaceKey::BoardFollowups, &[classes::HIDDEN]);
                surfaces.remove_classes(SurfaceKey::BoardQuestions, &[classes::HIDDEN]);
                surfaces.set_opacity(SurfaceKey::BoardQuestions, 1.0);
            }
            BoardTask::Engine(_) => {}
        }
    }

    /// Start the swap to the current topic
    fn render_topic(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<BoardTask>) {
        self.cancel(scheduler);

        surfaces.set_opacity(SurfaceKey::BoardBubble, 0.0);
        surfaces.set_text(SurfaceKey::BoardAnswer, "");
        self.after(scheduler, TRANSITION_MS, BoardTask::RevealAnswer);

        surfaces.set_opacity(SurfaceKey::BoardQuestions, 0.0);
        self.after(scheduler, TRANSITION_MS, BoardTask::ShowFollowups);
    }

    /// Stop typing and drop every deferred render step
    fn cancel(&mut self, scheduler: &mut impl Scheduler<BoardTask>) {
        self.engine.stop(&mut scoped(&mut *scheduler, BoardTask::Engine));
        self.timers.cancel_all(scheduler);
    }

    fn after(&mut self, scheduler: &mut impl Scheduler<BoardTask>, delay_ms: u64, make: fn(Ticket) -> BoardTask) {
        self.timers
            .schedule(scheduler, Duration::from_millis(delay_ms), make);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Followup, IntroChunk, TopicNode};
    use crate::scheduler::Timeline;
    use crate::surface::{RenderSurface, SurfaceMap};
    use crate::typewriter::TypewriterConfig;
    use pretty_assertions::assert_eq;

    fn board() -> Blackboard {
        let engine = TypewriterEngine::with_seed(TypewriterConfig::blackboard(), 5);
        Blackboard::new(engine, Arc::new(ContentStore::builtin()))
    }

    fn settle(board: &mut Blackboard, timeline: &mut Timeline<BoardTask>, surfaces: &mut SurfaceMap) {
        while let Some(task) = timeline.pop_due(Duration::MAX) {
            board.on_task(task, surfaces, timeline);
        }
    }

    fn history(board: &Blackboard) -> Vec<&str> {
        board.navigation().history().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_stack_discipline() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        for id in ["education", "education-uni", "music"] {
            board.select_topic(id, &mut surfaces, &mut timeline);
        }
        assert_eq!(history(&board), vec!["education", "education-uni"]);

        board.go_back(&mut surfaces, &mut timeline);
        assert_eq!(board.navigation().current(), Some("education-uni"));
        board.go_back(&mut surfaces, &mut timeline);
        assert_eq!(board.navigation().current(), Some("education"));
        assert!(board.navigation().history().is_empty());

        // One more back on an empty stack lands on the questions
        board.go_back(&mut surfaces, &mut timeline);
        assert!(board.navigation().is_empty());
        assert_eq!(board.navigation().current(), None);
        settle(&mut board, &mut timeline, &mut surfaces);

        let questions = surfaces.get(SurfaceKey::BoardQuestions).unwrap();
        assert!(!questions.has_class(classes::HIDDEN));
        assert_eq!(questions.opacity(), 1.0);
        assert!(surfaces
            .get(SurfaceKey::BoardFollowups)
            .unwrap()
            .has_class(classes::HIDDEN));
        assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), "");
    }

    #[test]
    fn test_self_loop_does_not_stack() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        board.select_topic("music", &mut surfaces, &mut timeline);
        board.select_topic("music", &mut surfaces, &mut timeline);
        assert_eq!(board.navigation().current(), Some("music"));
        assert!(board.navigation().history().is_empty());
    }

    #[test]
    fn test_education_round_trip() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        board.select_topic("education", &mut surfaces, &mut timeline);
        board.select_topic("education-uni", &mut surfaces, &mut timeline);
        assert_eq!(board.navigation().previous(), Some("education"));
        assert_eq!(history(&board), vec!["education"]);

        board.select_topic("back", &mut surfaces, &mut timeline);
        assert_eq!(board.navigation().current(), Some("education"));
        assert_eq!(board.navigation().previous(), None);
        assert!(board.navigation().history().is_empty());

        settle(&mut board, &mut timeline, &mut surfaces);
        let education = board.content().topic("education").unwrap();
        assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), education.answer);
        assert_eq!(
            surfaces.get(SurfaceKey::BoardFollowups).unwrap().controls(),
            education.followups.as_slice()
        );
    }

    #[test]
    fn test_back_aliases() {
        for alias in NavToken::BACK_ALIASES {
            let mut board = board();
            let mut timeline = Timeline::new();
            let mut surfaces = SurfaceMap::full();

            board.select_topic("projects", &mut surfaces, &mut timeline);
            board.select_topic("projects-future", &mut surfaces, &mut timeline);
            board.select_topic(alias, &mut surfaces, &mut timeline);
            assert_eq!(board.navigation().current(), Some("projects"), "alias {alias}");
        }
    }

    #[test]
    fn test_unknown_topic_on_empty_state() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        board.select_topic("no-such-topic", &mut surfaces, &mut timeline);
        assert!(board.navigation().is_empty());
        assert!(timeline.is_idle());
        assert_eq!(surfaces.get(SurfaceKey::BoardAnswer).unwrap().writes(), 0);
    }

    #[test]
    fn test_go_back_on_empty_history_resets() {
        let mut via_back = board();
        let mut via_reset = board();
        let (mut t1, mut t2) = (Timeline::new(), Timeline::new());
        let (mut s1, mut s2) = (SurfaceMap::full(), SurfaceMap::full());

        via_back.select_topic("music", &mut s1, &mut t1);
        via_reset.select_topic("music", &mut s2, &mut t2);
        settle(&mut via_back, &mut t1, &mut s1);
        settle(&mut via_reset, &mut t2, &mut s2);

        // One back pops nothing (music was the first topic) and resets
        via_back.go_back(&mut s1, &mut t1);
        via_reset.reset(&mut s2, &mut t2);
        settle(&mut via_back, &mut t1, &mut s1);
        settle(&mut via_reset, &mut t2, &mut s2);

        assert_eq!(via_back.navigation(), via_reset.navigation());
        for key in SurfaceKey::ALL {
            let (a, b) = (s1.get(key).unwrap(), s2.get(key).unwrap());
            assert_eq!(a.text(), b.text(), "{key:?}");
            assert_eq!(a.opacity(), b.opacity(), "{key:?}");
            assert_eq!(a.classes().collect::<Vec<_>>(), b.classes().collect::<Vec<_>>(), "{key:?}");
        }
    }

    #[test]
    fn test_main_token_resets() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        board.select_topic("music", &mut surfaces, &mut timeline);
        board.select_topic("music-genres", &mut surfaces, &mut timeline);
        board.select_topic("main", &mut surfaces, &mut timeline);
        assert!(board.navigation().is_empty());

        settle(&mut board, &mut timeline, &mut surfaces);
        let questions = surfaces.get(SurfaceKey::BoardQuestions).unwrap();
        assert!(!questions.has_class(classes::HIDDEN));
        assert!((questions.opacity() - 1.0).abs() < f32::EPSILON);
        assert!(surfaces.get(SurfaceKey::BoardFollowups).unwrap().has_class(classes::HIDDEN));
        assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), "");
        assert!((surfaces.get(SurfaceKey::BoardBubble).unwrap().opacity() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        board.select_topic("projects", &mut surfaces, &mut timeline);
        board.reset(&mut surfaces, &mut timeline);
        let pending = timeline.pending();
        board.reset(&mut surfaces, &mut timeline);
        assert_eq!(timeline.pending(), pending);
        settle(&mut board, &mut timeline, &mut surfaces);
        let once = surfaces.clone();

        board.reset(&mut surfaces, &mut timeline);
        settle(&mut board, &mut timeline, &mut surfaces);
        for key in SurfaceKey::ALL {
            assert_eq!(surfaces.text(key), once.text(key), "{key:?}");
            assert_eq!(surfaces.get(key).unwrap().is_visible(), once.get(key).unwrap().is_visible(), "{key:?}");
        }
        assert!(board.navigation().is_empty());
    }

    #[test]
    fn test_render_sequence_timing() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();
        board.mount(&mut surfaces);

        surfaces.set_text(SurfaceKey::BoardAnswer, "stale answer");
        board.select_topic("music", &mut surfaces, &mut timeline);

        let opacity = |s: &SurfaceMap, key: SurfaceKey| s.get(key).unwrap().opacity();
        assert_eq!(opacity(&surfaces, SurfaceKey::BoardBubble), 0.0);
        assert_eq!(opacity(&surfaces, SurfaceKey::BoardQuestions), 0.0);
        assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), "");

        let step = |board: &mut Blackboard, timeline: &mut Timeline<BoardTask>, surfaces: &mut SurfaceMap, until: u64| {
            let until = Duration::from_millis(until);
            while let Some(task) = timeline.pop_due(until) {
                board.on_task(task, surfaces, timeline);
            }
            timeline.advance(until);
        };

        step(&mut board, &mut timeline, &mut surfaces, TRANSITION_MS - 1);
        assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), "");

        step(&mut board, &mut timeline, &mut surfaces, TRANSITION_MS);
        assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), "I");
        assert!(surfaces.get(SurfaceKey::BoardQuestions).unwrap().has_class(classes::HIDDEN));
        assert!(!surfaces.get(SurfaceKey::BoardFollowups).unwrap().has_class(classes::HIDDEN));
        assert_eq!(opacity(&surfaces, SurfaceKey::BoardFollowups), 0.0);

        step(&mut board, &mut timeline, &mut surfaces, TRANSITION_MS + FOLLOWUP_FADE_MS);
        assert_eq!(opacity(&surfaces, SurfaceKey::BoardFollowups), 1.0);
        let labels: Vec<&str> = surfaces
            .get(SurfaceKey::BoardFollowups)
            .unwrap()
            .controls()
            .iter()
            .map(|f| f.label.as_str())
            .collect();
        assert_eq!(labels, vec!["What instruments?", "Favorite genres?", "← Back"]);
    }

    #[test]
    fn test_fast_navigation_cancels_older_render() {
        let mut board = board();
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        board.select_topic("education", &mut surfaces, &mut timeline);
        timeline.advance(Duration::from_millis(100));
        board.select_topic("projects", &mut surfaces, &mut timeline);
        settle(&mut board, &mut timeline, &mut surfaces);

        let projects = board.content().topic("projects").unwrap();
        assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), projects.answer);
        assert_eq!(
            surfaces.get(SurfaceKey::BoardFollowups).unwrap().controls(),
            projects.followups.as_slice()
        );
    }

    #[test]
    fn test_dangling_followup_is_noop() {
        let content = ContentStore::new(
            vec![IntroChunk::plain("hi")],
            vec![Followup::new("a", "A")],
            vec![TopicNode {
                id: "a".to_string(),
                answer: "Answer".to_string(),
                followups: vec![Followup::new("missing", "Gone")],
            }],
        );
        let engine = TypewriterEngine::with_seed(TypewriterConfig::blackboard(), 1);
        let mut board = Blackboard::new(engine, Arc::new(content));
        let mut timeline = Timeline::new();
        let mut surfaces = SurfaceMap::full();

        board.select_topic("a", &mut surfaces, &mut timeline);
        board.select_topic("missing", &mut surfaces, &mut timeline);
        assert_eq!(board.navigation().current(), Some("a"));
        assert!(board.navigation().history().is_empty());
    }
}
