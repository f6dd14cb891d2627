//! Page Geometry
//!
//! The page is two full-height sections stacked vertically, scrolled as one
//! column. Visibility is measured in CSS pixels so the configured root margin
//! means the same thing here as on the web page; one terminal row counts as
//! [`PIXELS_PER_ROW`] pixels.

use ratatui::layout::Rect;

use folio_core::{Section, VisibilityPolicy};

/// Pixel height of one terminal row
pub const PIXELS_PER_ROW: f32 = 16.0;

/// Sections never get shorter than this
pub const MIN_SECTION_ROWS: u16 = 16;

/// Rows reserved at the bottom for the status line
pub const STATUS_ROWS: u16 = 1;

/// Sections in page order
pub const SECTIONS: [Section; 2] = [Section::Intro, Section::Blackboard];

/// Scroll state and section placement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLayout {
    width: u16,
    viewport: u16,
    scroll: u16,
}

impl PageLayout {
    /// Layout for a terminal of `width` x `height`
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            viewport: height.saturating_sub(STATUS_ROWS),
            scroll: 0,
        }
    }

    /// Terminal width
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Rows available to the page
    #[must_use]
    pub fn viewport(&self) -> u16 {
        self.viewport
    }

    /// Rows scrolled past
    #[must_use]
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Height of each section
    #[must_use]
    pub fn section_height(&self) -> u16 {
        self.viewport.max(MIN_SECTION_ROWS)
    }

    /// Height of the whole page
    #[must_use]
    pub fn page_height(&self) -> u16 {
        self.section_height().saturating_mul(SECTIONS.len() as u16)
    }

    /// Furthest scroll position
    #[must_use]
    pub fn max_scroll(&self) -> u16 {
        self.page_height().saturating_sub(self.viewport)
    }

    /// Page-space area of a section
    #[must_use]
    pub fn section_area(&self, section: Section) -> Rect {
        let height = self.section_height();
        let index = match section {
            Section::Intro => 0,
            Section::Blackboard => 1,
        };
        Rect::new(0, height.saturating_mul(index), self.width, height)
    }

    /// Scroll by `delta` rows (positive is down), clamped to the page
    pub fn scroll_by(&mut self, delta: i32) {
        let target = i32::from(self.scroll) + delta;
        self.scroll = target.clamp(0, i32::from(self.max_scroll())) as u16;
    }

    /// Scroll so `section` starts at the top of the viewport
    pub fn scroll_to(&mut self, section: Section) {
        self.scroll = self.section_area(section).y.min(self.max_scroll());
    }

    /// Adopt a new terminal size, keeping the scroll position in range
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.viewport = height.saturating_sub(STATUS_ROWS);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Fraction of `section` visible under `policy`
    #[must_use]
    pub fn visible_ratio(&self, section: Section, policy: &VisibilityPolicy) -> f32 {
        let area = self.section_area(section);
        let top = f32::from(area.y) - f32::from(self.scroll);
        policy.visible_ratio(
            top * PIXELS_PER_ROW,
            f32::from(area.height) * PIXELS_PER_ROW,
            f32::from(self.viewport) * PIXELS_PER_ROW,
        )
    }

    /// Convert a page-space row to a viewport row, if it is on screen
    #[must_use]
    pub fn to_screen(&self, page_y: u16) -> Option<u16> {
        let y = page_y.checked_sub(self.scroll)?;
        (y < self.viewport).then_some(y)
    }

    /// Convert a viewport row to a page-space row
    #[must_use]
    pub fn to_page(&self, screen_y: u16) -> Option<u16> {
        (screen_y < self.viewport).then(|| screen_y + self.scroll)
    }
}
