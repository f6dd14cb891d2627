//! Typewriter Engine
//!
//! Reveals text on a target surface one character per step, or deletes it
//! one character per step from the end.
//!
//! # Pacing
//!
//! The delay before the next character depends on the character just
//! revealed and the text before it:
//!
//! - `, . ! ?` pause for base speed + 300ms
//! - a space right after a configured pause word pauses for base speed +
//!   `pause_duration_ms`
//! - anything else waits base speed + 0..=20ms of jitter
//!
//! A per-session [`TypeOptions::speed`] replaces the base speed for plain
//! characters only; the two pauses always use the configured base.
//!
//! # Sessions
//!
//! An engine runs at most one session and owns at most one pending timer.
//! Starting a session or calling [`TypewriterEngine::stop`] cancels that
//! timer and bumps the generation, so a step that slipped through the
//! cancellation is recognised as stale and ignored.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::markup;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::surface::{classes, SurfaceKey, Surfaces};

/// Characters that always pause after being revealed
const PUNCTUATION: [char; 4] = [',', '.', '!', '?'];

/// Extra delay after punctuation
const PUNCTUATION_PAUSE_MS: u64 = 300;

/// Upper bound of the per-character jitter
const MAX_JITTER_MS: u64 = 20;

/// Delay between completion and hiding the cursor
const CURSOR_GRACE_MS: u64 = 1000;

/// Words the intro pauses on, besides punctuation
pub const INTRO_HIGHLIGHT_WORDS: [&str; 8] = [
    "cute things",
    "music",
    "coffee",
    "breather",
    "constant",
    "peacefulness",
    "student",
    "website",
];

/// Engine configuration, fixed at construction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    /// Delay between characters (ms)
    pub base_speed_ms: u64,
    /// Delay between deletions (ms)
    pub deleting_speed_ms: u64,
    /// Words followed by a space that trigger the long pause
    pub pause_words: Vec<String>,
    /// Extra delay after a pause word (ms)
    pub pause_duration_ms: u64,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            base_speed_ms: 20,
            deleting_speed_ms: 10,
            pause_words: PUNCTUATION.iter().map(char::to_string).collect(),
            pause_duration_ms: 250,
        }
    }
}

impl TypewriterConfig {
    /// Settings for the intro section
    #[must_use]
    pub fn intro() -> Self {
        let mut config = Self::default();
        config
            .pause_words
            .extend(INTRO_HIGHLIGHT_WORDS.iter().map(|w| (*w).to_string()));
        config
    }

    /// Settings for the blackboard answers
    #[must_use]
    pub fn blackboard() -> Self {
        Self {
            base_speed_ms: 30,
            pause_duration_ms: 200,
            ..Self::default()
        }
    }
}

/// Per-session options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TypeOptions {
    /// Leave the cursor visible after completion
    pub keep_cursor: bool,
    /// Override the base speed for this session (ms)
    pub speed: Option<u64>,
}

impl TypeOptions {
    /// Options that keep the cursor after completion
    #[must_use]
    pub fn keep_cursor() -> Self {
        Self {
            keep_cursor: true,
            speed: None,
        }
    }

    /// Override the base speed
    #[must_use]
    pub fn with_speed(mut self, speed_ms: u64) -> Self {
        self.speed = Some(speed_ms);
        self
    }
}

/// What the engine is doing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypingMode {
    /// No session
    Idle,
    /// Revealing characters
    Typing,
    /// Removing characters
    Deleting,
}

/// Outcome of an engine call, reported to the engine's owner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Progress {
    /// The session continues; another step is scheduled
    Pending,
    /// The session finished just now
    Completed,
    /// Nothing to report (stale step, cursor housekeeping)
    Idle,
}

/// A deferred engine step
///
/// Opaque to owners: schedule it, then hand it back to
/// [`TypewriterEngine::on_step`] when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineStep {
    generation: u64,
    kind: StepKind,
}

impl EngineStep {
    /// Session generation the step was scheduled for
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepKind {
    Advance,
    HideCursor(SurfaceKey),
}

#[derive(Debug)]
struct Session {
    target: SurfaceKey,
    cursor: Option<SurfaceKey>,
    mode: TypingMode,
    /// Characters still to reveal (typing only)
    source: Vec<char>,
    position: usize,
    /// Text currently shown on the target
    shown: String,
    /// Markup swapped in at the end of a `type_markup` session
    markup: Option<String>,
    options: TypeOptions,
}

/// Character-by-character text reveal
#[derive(Debug)]
pub struct TypewriterEngine {
    config: TypewriterConfig,
    rng: StdRng,
    generation: u64,
    pending: Option<TimerHandle>,
    session: Option<Session>,
}

impl TypewriterEngine {
    /// Create an engine
    #[must_use]
    pub fn new(config: TypewriterConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an engine with deterministic jitter
    #[must_use]
    pub fn with_seed(config: TypewriterConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: TypewriterConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            generation: 0,
            pending: None,
            session: None,
        }
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &TypewriterConfig {
        &self.config
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> TypingMode {
        self.session.as_ref().map_or(TypingMode::Idle, |s| s.mode)
    }

    /// Whether a step (reveal, deletion or cursor hide) is pending
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Current session generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Type plain text into `target`
    pub fn type_text(
        &mut self,
        text: &str,
        target: SurfaceKey,
        cursor: Option<SurfaceKey>,
        options: TypeOptions,
        surfaces: &mut dyn Surfaces,
        scheduler: &mut impl Scheduler<EngineStep>,
    ) -> Progress {
        self.begin_typing(text.chars().collect(), None, target, cursor, options, surfaces, scheduler)
    }

    /// Type markup into `target`
    ///
    /// The reveal runs over the plain-text projection; the markup replaces
    /// it once the whole projection is shown.
    pub fn type_markup(
        &mut self,
        html: &str,
        target: SurfaceKey,
        cursor: Option<SurfaceKey>,
        options: TypeOptions,
        surfaces: &mut dyn Surfaces,
        scheduler: &mut impl Scheduler<EngineStep>,
    ) -> Progress {
        let plain = markup::plain_text(html);
        self.begin_typing(
            plain.chars().collect(),
            Some(html.to_string()),
            target,
            cursor,
            options,
            surfaces,
            scheduler,
        )
    }

    /// Delete the target's content one character at a time
    pub fn delete_text(
        &mut self,
        target: SurfaceKey,
        surfaces: &mut dyn Surfaces,
        scheduler: &mut impl Scheduler<EngineStep>,
    ) -> Progress {
        self.stop(scheduler);
        self.session = Some(Session {
            target,
            cursor: None,
            mode: TypingMode::Deleting,
            source: Vec::new(),
            position: 0,
            shown: surfaces.text(target),
            markup: None,
            options: TypeOptions::default(),
        });
        self.advance(surfaces, scheduler)
    }

    /// Cancel the pending step, if any
    ///
    /// Safe to call with no session and any number of times.
    pub fn stop(&mut self, scheduler: &mut impl Scheduler<EngineStep>) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.generation += 1;
        self.session = None;
    }

    /// Handle a fired step
    pub fn on_step(
        &mut self,
        step: EngineStep,
        surfaces: &mut dyn Surfaces,
        scheduler: &mut impl Scheduler<EngineStep>,
    ) -> Progress {
        if step.generation != self.generation {
            tracing::trace!(
                step = step.generation,
                current = self.generation,
                "Ignoring stale typewriter step"
            );
            return Progress::Idle;
        }
        self.pending = None;

        match step.kind {
            StepKind::Advance => self.advance(surfaces, scheduler),
            StepKind::HideCursor(cursor) => {
                surfaces.add_classes(cursor, &[classes::CURSOR_HIDDEN]);
                Progress::Idle
            }
        }
    }

    /// Delay after revealing `revealed`, given the text before it
    pub fn typing_delay(&mut self, revealed: char, preceding: &str) -> Duration {
        let base = self.config.base_speed_ms;
        next_delay(&self.config, &mut self.rng, base, revealed, preceding)
    }

    #[allow(clippy::too_many_arguments)]
    fn begin_typing(
        &mut self,
        source: Vec<char>,
        markup: Option<String>,
        target: SurfaceKey,
        cursor: Option<SurfaceKey>,
        options: TypeOptions,
        surfaces: &mut dyn Surfaces,
        scheduler: &mut impl Scheduler<EngineStep>,
    ) -> Progress {
        self.stop(scheduler);
        surfaces.set_text(target, "");
        if let Some(cursor) = cursor {
            surfaces.remove_classes(cursor, &[classes::CURSOR_HIDDEN]);
            surfaces.add_classes(cursor, &[classes::CURSOR_BLINK]);
        }

        self.session = Some(Session {
            target,
            cursor,
            mode: TypingMode::Typing,
            source,
            position: 0,
            shown: String::new(),
            markup,
            options,
        });
        self.advance(surfaces, scheduler)
    }

    /// Perform one reveal or deletion, or finish the session
    fn advance(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<EngineStep>) -> Progress {
        let generation = self.generation;
        let Some(session) = self.session.as_mut() else {
            return Progress::Idle;
        };

        let delay = match session.mode {
            TypingMode::Typing => {
                let Some(&revealed) = session.source.get(session.position) else {
                    return self.finish(surfaces, scheduler);
                };
                session.position += 1;
                session.shown.push(revealed);
                surfaces.set_text(session.target, &session.shown);

                let preceding = &session.shown[..session.shown.len() - revealed.len_utf8()];
                let base = session.options.speed.unwrap_or(self.config.base_speed_ms);
                next_delay(&self.config, &mut self.rng, base, revealed, preceding)
            }
            TypingMode::Deleting => {
                if session.shown.pop().is_none() {
                    return self.finish(surfaces, scheduler);
                }
                surfaces.set_text(session.target, &session.shown);
                Duration::from_millis(self.config.deleting_speed_ms)
            }
            TypingMode::Idle => return Progress::Idle,
        };

        let step = EngineStep {
            generation,
            kind: StepKind::Advance,
        };
        self.pending = Some(scheduler.schedule(delay, step));
        Progress::Pending
    }

    fn finish(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<EngineStep>) -> Progress {
        let Some(session) = self.session.take() else {
            return Progress::Idle;
        };

        if let Some(html) = &session.markup {
            surfaces.set_markup(session.target, html);
        }

        if session.mode == TypingMode::Typing && !session.options.keep_cursor {
            if let Some(cursor) = session.cursor {
                let step = EngineStep {
                    generation: self.generation,
                    kind: StepKind::HideCursor(cursor),
                };
                self.pending = Some(scheduler.schedule(Duration::from_millis(CURSOR_GRACE_MS), step));
            }
        }

        Progress::Completed
    }
}

/// Delay before the next reveal
///
/// `base` is the session speed and only paces plain characters; pauses
/// always build on the configured base speed.
fn next_delay(config: &TypewriterConfig, rng: &mut StdRng, base: u64, revealed: char, preceding: &str) -> Duration {
    let ms = if PUNCTUATION.contains(&revealed) {
        config.base_speed_ms + PUNCTUATION_PAUSE_MS
    } else if revealed == ' ' && ends_with_pause_word(preceding, &config.pause_words) {
        config.base_speed_ms + config.pause_duration_ms
    } else {
        base + rng.gen_range(0..=MAX_JITTER_MS)
    };
    Duration::from_millis(ms)
}

/// Whether `text` ends with one of `words`, starting at a word boundary
fn ends_with_pause_word(text: &str, words: &[String]) -> bool {
    words.iter().filter(|w| !w.is_empty()).any(|word| {
        text.strip_suffix(word.as_str())
            .is_some_and(|head| head.is_empty() || head.ends_with(char::is_whitespace))
    })
}
