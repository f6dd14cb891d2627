//! Intro Typewriter
//!
//! Plays the intro chunks through one engine: type a chunk, wait, delete it,
//! wait, type the next. The last chunk stays on screen with its cursor.
//!
//! ```text
//! Idle -> Typing(i) -> [last] Done
//!                   -> WaitingToDelete(i) -> Deleting(i) -> WaitingToType(i+1) -> Typing(i+1) ...
//! ```

use std::time::Duration;

use crate::content::IntroChunk;
use crate::scheduler::{scoped, Scheduler, Ticket, TimerSet};
use crate::surface::{classes, SurfaceKey, Surfaces};

use super::engine::{EngineStep, Progress, TypeOptions, TypewriterEngine};

/// Pause between finishing a chunk and deleting it
pub const DELETE_PAUSE_MS: u64 = 1000;

/// Where the intro is in its chunk cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroPhase {
    /// Not started, or reset
    Idle,
    /// Typing chunk `i`
    Typing(usize),
    /// Chunk `i` is fully shown; deletion is scheduled
    WaitingToDelete(usize),
    /// Deleting chunk `i`
    Deleting(usize),
    /// Chunk `i` is next; typing is scheduled
    WaitingToType(usize),
    /// The last chunk is on screen
    Done,
    /// Halted by `stop()`
    Stopped,
}

/// Deferred intro work
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroTask {
    /// Step of the intro's engine
    Engine(EngineStep),
    /// Start deleting the current chunk
    Delete(Ticket),
    /// Type the current chunk
    TypeNext(Ticket),
}

/// Chunk sequencer for the intro section
#[derive(Debug)]
pub struct IntroTypewriter {
    engine: TypewriterEngine,
    chunks: Vec<IntroChunk>,
    target: SurfaceKey,
    cursor: SurfaceKey,
    chunk_index: usize,
    running: bool,
    phase: IntroPhase,
    timers: TimerSet,
}

impl IntroTypewriter {
    /// Create a sequencer typing `chunks` into `target`
    #[must_use]
    pub fn new(engine: TypewriterEngine, chunks: Vec<IntroChunk>, target: SurfaceKey, cursor: SurfaceKey) -> Self {
        Self {
            engine,
            chunks,
            target,
            cursor,
            chunk_index: 0,
            running: false,
            phase: IntroPhase::Idle,
            timers: TimerSet::new(),
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> IntroPhase {
        self.phase
    }

    /// Index of the chunk being played
    #[must_use]
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    /// Number of chunks
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the sequence is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The engine doing the typing
    #[must_use]
    pub fn engine(&self) -> &TypewriterEngine {
        &self.engine
    }

    /// Begin typing the current chunk (no-op while running)
    pub fn start(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<IntroTask>) {
        if self.running {
            return;
        }
        self.running = true;
        self.type_current(surfaces, scheduler);
    }

    /// Cancel typing and timers, keeping the chunk index and running flag
    pub fn stop(&mut self, scheduler: &mut impl Scheduler<IntroTask>) {
        self.engine.stop(&mut scoped(&mut *scheduler, IntroTask::Engine));
        self.timers.cancel_all(scheduler);
        self.phase = IntroPhase::Stopped;
    }

    /// Cancel everything, rewind to the first chunk and clear the text
    pub fn reset(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<IntroTask>) {
        self.engine.stop(&mut scoped(&mut *scheduler, IntroTask::Engine));
        self.timers.cancel_all(scheduler);

        self.chunk_index = 0;
        self.running = false;
        self.phase = IntroPhase::Idle;

        surfaces.set_text(self.target, "");
        surfaces.remove_classes(self.cursor, &[classes::CURSOR_HIDDEN]);
        surfaces.add_classes(self.cursor, &[classes::CURSOR_BLINK]);
    }

    /// Handle a fired task
    pub fn on_task(&mut self, task: IntroTask, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<IntroTask>) {
        match task {
            IntroTask::Engine(step) => {
                let progress = self
                    .engine
                    .on_step(step, surfaces, &mut scoped(&mut *scheduler, IntroTask::Engine));
                self.on_progress(progress, scheduler);
            }
            IntroTask::Delete(ticket) => {
                if !self.live(ticket) {
                    return;
                }
                self.phase = IntroPhase::Deleting(self.chunk_index);
                let progress = self
                    .engine
                    .delete_text(self.target, surfaces, &mut scoped(&mut *scheduler, IntroTask::Engine));
                self.on_progress(progress, scheduler);
            }
            IntroTask::TypeNext(ticket) => {
                if self.live(ticket) {
                    self.type_current(surfaces, scheduler);
                }
            }
        }
    }

    /// Settle a ticket and check the running guard
    fn live(&mut self, ticket: Ticket) -> bool {
        let live = self.timers.settle(ticket) && self.running;
        if !live {
            tracing::trace!(?ticket, "Ignoring stale intro task");
        }
        live
    }

    fn is_last(&self) -> bool {
        self.chunk_index + 1 >= self.chunks.len()
    }

    fn type_current(&mut self, surfaces: &mut dyn Surfaces, scheduler: &mut impl Scheduler<IntroTask>) {
        if !self.running {
            return;
        }
        let Some(chunk) = self.chunks.get(self.chunk_index) else {
            self.finish();
            return;
        };

        let options = if self.is_last() {
            TypeOptions::keep_cursor()
        } else {
            TypeOptions::default()
        };
        self.phase = IntroPhase::Typing(self.chunk_index);
        tracing::debug!(chunk = self.chunk_index, "Typing intro chunk");

        let progress = self.engine.type_markup(
            &chunk.html,
            self.target,
            Some(self.cursor),
            options,
            surfaces,
            &mut scoped(&mut *scheduler, IntroTask::Engine),
        );
        self.on_progress(progress, scheduler);
    }

    fn on_progress(&mut self, progress: Progress, scheduler: &mut impl Scheduler<IntroTask>) {
        if progress != Progress::Completed || !self.running {
            return;
        }

        match self.phase {
            IntroPhase::Typing(_) if self.is_last() => self.finish(),
            IntroPhase::Typing(i) => {
                self.phase = IntroPhase::WaitingToDelete(i);
                self.timers
                    .schedule(scheduler, Duration::from_millis(DELETE_PAUSE_MS), IntroTask::Delete);
            }
            IntroPhase::Deleting(i) => {
                self.chunk_index = i + 1;
                self.phase = IntroPhase::WaitingToType(self.chunk_index);
                let pause = Duration::from_millis(self.engine.config().base_speed_ms);
                self.timers.schedule(scheduler, pause, IntroTask::TypeNext);
            }
            _ => {}
        }
    }

    /// The last chunk stays; a later `start()` retypes it
    fn finish(&mut self) {
        self.running = false;
        self.phase = IntroPhase::Done;
        self.chunk_index = self.chunk_index.min(self.chunks.len().saturating_sub(1));
        tracing::debug!("Intro sequence finished");
    }
}
