//! Folio TUI - Terminal host for the folio portfolio page
//!
//! This crate draws the headless page from `folio-core` in a terminal: two
//! stacked sections in a scrollable column, with the intro typewriter, the
//! blackboard Q&A and the floating chat bubbles.
//!
//! # Architecture
//!
//! - **App**: event loop, scroll-to-visibility, real clock to stage time
//! - **Page**: section geometry and visible ratios
//! - **Render**: offscreen page buffer, scrolled window copy, hit targets
//! - **Tween**: plays transform transitions frame by frame
//! - **Widgets**: borderless wrapped text with bold runs and a cursor

pub mod app;
pub mod page;
pub mod render;
pub mod theme;
pub mod tween;
pub mod widgets;

pub use app::App;
