//! Typewriter Text Effect
//!
//! - [`engine`]: reveals and deletes text on one surface, one character per
//!   step, with punctuation and pause-word pacing.
//! - [`intro`]: cycles the intro chunks through one engine
//!   (type, wait, delete, type next).

pub mod engine;
pub mod intro;

pub use engine::{EngineStep, Progress, TypeOptions, TypewriterConfig, TypewriterEngine, TypingMode};
pub use intro::{IntroPhase, IntroTask, IntroTypewriter};
