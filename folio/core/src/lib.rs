//! Folio Core - Headless Animation and Navigation for the folio page
//!
//! This crate holds everything interactive about the portfolio page: the
//! typewriters, the blackboard Q&A navigation, the chat bubbles and the
//! visibility-driven section choreography. It knows nothing about how the
//! page is drawn. Hosts hand it a set of [`Surfaces`] to write to and a
//! clock to advance.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Host (TUI, tests)                        │
//! │   scroll ─► set_visibility     click ─► activate     tick ─► advance_to
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┼──────────────────────────────────┐
//! │                             Stage                                 │
//! │  ┌──────────────┐  ┌────────────┐  ┌───────────┐  ┌────────────┐  │
//! │  │ Choreography │─►│   Intro    │  │ Blackboard│  │ ChatBubble │  │
//! │  │   (cues)     │  │ Typewriter │  │   (nav)   │  │   x 2      │  │
//! │  └──────────────┘  └─────┬──────┘  └─────┬─────┘  └─────┬──────┘  │
//! │                          └──── TypewriterEngine ────────┘         │
//! │                                                                   │
//! │         Timeline<StageTask> (virtual clock, cancellable)          │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │ Surfaces (text, classes, opacity, transform)
//!                                 ▼
//!                           SurfaceMap / host
//! ```
//!
//! # Key Types
//!
//! - [`Stage`]: owns every component and their shared timeline
//! - [`TypewriterEngine`]: types, deletes and blinks text on one surface
//! - [`Blackboard`]: topic navigation with a back stack
//! - [`ContentStore`]: intro chunks and the topic graph
//! - [`FolioConfig`]: layered configuration (defaults, file, env, CLI)
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use folio_core::{ContentStore, FolioConfig, Section, Stage, SurfaceMap};
//!
//! let config = FolioConfig::default();
//! let content = Arc::new(ContentStore::builtin());
//! let mut stage = Stage::new(&config, content, SurfaceMap::full());
//!
//! stage.set_visibility(Section::Blackboard, 1.0);
//! stage.activate("music");
//! stage.advance_to(Duration::from_secs(5));
//! assert_eq!(stage.navigation().current(), Some("music"));
//! ```
//!
//! # No Timers, No Terminal
//!
//! Nothing in here sleeps or spawns. All deferred work goes through a
//! [`Scheduler`], and the crate has no dependency on ratatui or crossterm.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod blackboard;
pub mod bubble;
pub mod choreography;
pub mod config;
pub mod content;
pub mod markup;
pub mod scheduler;
pub mod stage;
pub mod surface;
pub mod typewriter;

// Re-exports for convenience
pub use animation::{EasingFunction, Transform, Transition, TransitionProperty};
pub use blackboard::{Blackboard, BoardTask, NavigationState};
pub use bubble::{BubblePhase, BubbleSlot, BubbleTask, ChatBubble};
pub use choreography::{ChoreoTask, Choreography, Cue, Section, VisibilityPolicy};
pub use content::{ContentError, ContentStore, Followup, IntroChunk, NavToken, TopicId, TopicNode};
pub use scheduler::{scoped, Scheduler, Scoped, Ticket, TimerHandle, TimerSet, Timeline};
pub use stage::{Stage, StageTask};
pub use surface::{classes, MemorySurface, RenderSurface, SurfaceContent, SurfaceKey, SurfaceMap, Surfaces};
pub use typewriter::{
    EngineStep, IntroPhase, IntroTask, IntroTypewriter, Progress, TypeOptions, TypewriterConfig, TypewriterEngine,
    TypingMode,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, ConfigError, ConfigOverrides,
    ConfigSource, FolioConfig, FolioToml,
};
