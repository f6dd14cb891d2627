//! Theme and Colors
//!
//! The page's coffee-shop palette: warm browns on cream for the intro,
//! chalk on slate for the blackboard.

use ratatui::style::Color;

// ============================================================================
// Intro Palette
// ============================================================================

/// Avatar circle - latte
pub const AVATAR_CIRCLE: Color = Color::Rgb(221, 190, 169);

/// Intro chat box border - espresso
pub const CHAT_BOX_BORDER: Color = Color::Rgb(107, 79, 63);

/// Intro text
pub const INTRO_TEXT: Color = Color::Rgb(240, 228, 214);

/// Typewriter cursor
pub const CURSOR: Color = Color::Rgb(255, 200, 140);

// ============================================================================
// Blackboard Palette
// ============================================================================

/// Blackboard frame - wood
pub const BOARD_FRAME: Color = Color::Rgb(139, 94, 60);

/// Chalk white (answers)
pub const CHALK: Color = Color::Rgb(235, 235, 225);

/// Chalk yellow (control numbers)
pub const CHALK_YELLOW: Color = Color::Rgb(250, 230, 140);

/// Chalk blue (controls)
pub const CHALK_BLUE: Color = Color::Rgb(160, 200, 240);

// ============================================================================
// Shared
// ============================================================================

/// Speech bubble
pub const BUBBLE: Color = Color::Rgb(255, 248, 235);

/// Bubble text
pub const BUBBLE_TEXT: Color = Color::Rgb(90, 60, 45);

/// Status/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Scroll hint
pub const SCROLL_HINT: Color = Color::Rgb(150, 150, 150);
