//! Page Rendering
//!
//! Draws the stage's surfaces. The whole page is drawn into an offscreen
//! buffer in page coordinates, then the scrolled window is copied to the
//! frame, the same way the compositor used to flatten its layers.

use std::time::Duration;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, StatefulWidget, Widget};
use unicode_width::UnicodeWidthStr;

use folio_core::markup::{self, Segment};
use folio_core::{classes, Followup, MemorySurface, Section, Stage, SurfaceContent, SurfaceKey};

use crate::page::{PageLayout, PIXELS_PER_ROW, STATUS_ROWS};
use crate::theme;
use crate::tween::Tweens;
use crate::widgets::{TextBlock, TextBlockState};

/// Text inside the intro bubble
pub const INTRO_BUBBLE_TEXT: &str = "Hi there!";

/// Text inside the blackboard bubble (the idle prompt)
pub const BOARD_BUBBLE_TEXT: &str = "Ask me anything!";

/// Cursor blink half-period
const BLINK_MS: u128 = 530;

/// Below this scale a bubble is drawn as a dot
const BUBBLE_MIN_SCALE: f32 = 0.5;

const AVATAR: [&str; 3] = ["╭─────╮", "│ ◕‿◕ │", "╰─────╯"];

/// Where a clickable control was drawn, in screen coordinates
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlHit {
    /// Screen area of the control's row
    pub area: Rect,
    /// Id handed to `Stage::activate`
    pub id: String,
}

/// Frame-to-frame render state
#[derive(Debug)]
pub struct PageRenderer {
    intro_text: TextBlockState,
    answer: TextBlockState,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer {
    /// Create a renderer
    #[must_use]
    pub fn new() -> Self {
        Self {
            intro_text: TextBlockState::following(),
            answer: TextBlockState::following(),
        }
    }

    /// Draw the visible part of the page into `area`
    ///
    /// Returns the on-screen controls, for mouse hit testing.
    pub fn render(
        &mut self,
        stage: &Stage,
        page: &PageLayout,
        tweens: &Tweens,
        now: Duration,
        area: Rect,
        buf: &mut Buffer,
    ) -> Vec<ControlHit> {
        let mut canvas = Buffer::empty(Rect::new(0, 0, page.width(), page.page_height()));
        let view = View { stage, tweens, now };

        self.draw_intro(&view, page.section_area(Section::Intro), &mut canvas);
        let controls = self.draw_board(&view, page.section_area(Section::Blackboard), &mut canvas);
        if page.scroll() == 0 {
            draw_scroll_hint(page.section_area(Section::Intro), &mut canvas);
        }

        // Copy the scrolled window
        let rows = page.viewport().min(area.height.saturating_sub(STATUS_ROWS));
        let cols = page.width().min(area.width);
        for y in 0..rows {
            let page_y = y + page.scroll();
            if page_y >= canvas.area.height {
                break;
            }
            for x in 0..cols {
                buf[(area.x + x, area.y + y)] = canvas[(x, page_y)].clone();
            }
        }

        draw_status(stage, Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1), buf);

        controls
            .into_iter()
            .filter_map(|(row, id)| {
                let y = page.to_screen(row.y)?;
                (y < rows).then(|| ControlHit {
                    area: Rect::new(area.x + row.x, area.y + y, row.width.min(cols), 1),
                    id,
                })
            })
            .collect()
    }

    fn draw_intro(&mut self, view: &View<'_>, section: Rect, canvas: &mut Buffer) {
        let circle = Rect::new(section.x + 2, section.y + 2, 7, 3);
        if view.visible(SurfaceKey::IntroCircle) {
            draw_avatar(circle, canvas);
        }
        view.draw_bubble(
            SurfaceKey::IntroBubble,
            INTRO_BUBBLE_TEXT,
            Rect::new(circle.right() + 2, section.y + 1, 0, 0),
            canvas,
        );

        let chat_box = Rect::new(
            section.x + 2,
            section.y + 6,
            section.width.saturating_sub(4),
            section.height.saturating_sub(9).clamp(3, 10),
        )
        .intersection(canvas.area);
        if !view.visible(SurfaceKey::IntroChatBox) {
            return;
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::CHAT_BOX_BORDER));
        let inner = block.inner(chat_box);
        block.render(chat_box, canvas);

        let text = view.segments(SurfaceKey::IntroText);
        TextBlock::new(&text)
            .style(Style::default().fg(theme::INTRO_TEXT))
            .cursor(view.cursor(SurfaceKey::IntroCursor))
            .render(inner, canvas, &mut self.intro_text);
    }

    fn draw_board(&mut self, view: &View<'_>, section: Rect, canvas: &mut Buffer) -> Vec<(Rect, String)> {
        let frame = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(Style::default().fg(theme::BOARD_FRAME))
            .title(" blackboard ");
        let board = frame.inner(section);
        frame.render(section, canvas);

        let circle = Rect::new(board.x + 2, board.y + 1, 7, 3);
        if view.visible(SurfaceKey::BoardCircle) {
            draw_avatar(circle, canvas);
        }
        view.draw_bubble(
            SurfaceKey::BoardBubble,
            BOARD_BUBBLE_TEXT,
            Rect::new(circle.right() + 2, board.y, 0, 0),
            canvas,
        );

        let dialogue = Rect::new(
            board.x + 2,
            board.y + 5,
            board.width.saturating_sub(4),
            (board.height.saturating_sub(6) / 2).clamp(3, 10),
        )
        .intersection(canvas.area);
        if view.visible(SurfaceKey::BoardDialogue) {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme::CHALK));
            let inner = block.inner(dialogue);
            block.render(dialogue, canvas);

            let text = view.segments(SurfaceKey::BoardAnswer);
            TextBlock::new(&text)
                .style(Style::default().fg(theme::CHALK))
                .cursor(view.cursor(SurfaceKey::BoardCursor))
                .render(inner, canvas, &mut self.answer);
        }

        let Some(controls) = view.controls() else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        let mut y = dialogue.bottom() + 1;
        for (index, control) in controls.iter().enumerate().take(9) {
            if y >= board.bottom() {
                break;
            }
            let number = format!("[{}] ", index + 1);
            let x = board.x + 2;
            put(canvas, x, y, &number, Style::default().fg(theme::CHALK_YELLOW));
            put(
                canvas,
                x + number.width() as u16,
                y,
                &control.label,
                Style::default().fg(theme::CHALK_BLUE),
            );
            let width = (number.width() + control.label.width()) as u16;
            rows.push((Rect::new(x, y, width, 1), control.id.clone()));
            y += 1;
        }
        rows
    }
}

/// Read access to what is being drawn
struct View<'a> {
    stage: &'a Stage,
    tweens: &'a Tweens,
    now: Duration,
}

impl View<'_> {
    fn surface(&self, key: SurfaceKey) -> Option<&MemorySurface> {
        self.stage.surfaces().get(key)
    }

    fn visible(&self, key: SurfaceKey) -> bool {
        self.surface(key).is_some_and(MemorySurface::is_visible)
    }

    fn segments(&self, key: SurfaceKey) -> Vec<Segment> {
        match self.surface(key).map(MemorySurface::content) {
            Some(SurfaceContent::Text(text)) => vec![Segment {
                text: text.clone(),
                bold: false,
            }],
            Some(SurfaceContent::Markup(html)) => markup::segments(html),
            Some(SurfaceContent::Empty) | None => Vec::new(),
        }
    }

    /// Cursor style, or `None` while it is hidden or blinked off
    fn cursor(&self, key: SurfaceKey) -> Option<Style> {
        let cursor = self.surface(key)?;
        if cursor.has_class(classes::CURSOR_HIDDEN) {
            return None;
        }
        let blinked_off = cursor.has_class(classes::CURSOR_BLINK) && (self.now.as_millis() / BLINK_MS) % 2 == 1;
        (!blinked_off).then(|| Style::default().fg(theme::CURSOR))
    }

    /// The control list that is showing, if any
    fn controls(&self) -> Option<&[Followup]> {
        [SurfaceKey::BoardFollowups, SurfaceKey::BoardQuestions]
            .into_iter()
            .filter_map(|key| self.surface(key))
            .find(|s| !s.has_class(classes::HIDDEN) && s.opacity() > 0.0)
            .map(MemorySurface::controls)
    }

    /// Draw a speech bubble whose top-left corner is `anchor`
    fn draw_bubble(&self, key: SurfaceKey, text: &str, anchor: Rect, canvas: &mut Buffer) {
        let Some(surface) = self.surface(key) else {
            return;
        };
        if surface.opacity() <= 0.0 {
            return;
        }
        let transform = self.tweens.current(key, self.now);
        if transform.scale <= 0.0 {
            return;
        }

        let lift = (transform.translate_y / PIXELS_PER_ROW).round() as i32;
        let y = (i32::from(anchor.y) + lift).max(0) as u16;
        let style = Style::default().fg(theme::BUBBLE_TEXT).bg(theme::BUBBLE);
        if transform.scale < BUBBLE_MIN_SCALE {
            put(canvas, anchor.x, y + 1, "•", Style::default().fg(theme::BUBBLE));
            return;
        }

        let width = text.width() as u16 + 4;
        let area = Rect::new(anchor.x, y, width, 3).intersection(canvas.area);
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .style(style)
            .render(area, canvas);
        put(canvas, anchor.x + 2, y + 1, text, style.add_modifier(Modifier::BOLD));
    }
}

fn draw_avatar(area: Rect, canvas: &mut Buffer) {
    for (i, line) in AVATAR.iter().enumerate() {
        put(canvas, area.x, area.y + i as u16, line, Style::default().fg(theme::AVATAR_CIRCLE));
    }
}

fn draw_scroll_hint(section: Rect, canvas: &mut Buffer) {
    let hint = "↓ scroll down for the blackboard ↓";
    let x = section.x + section.width.saturating_sub(hint.width() as u16) / 2;
    put(canvas, x, section.bottom().saturating_sub(2), hint, Style::default().fg(theme::SCROLL_HINT));
}

fn draw_status(stage: &Stage, area: Rect, buf: &mut Buffer) {
    let depth = stage.navigation().history().len();
    let topic = stage.navigation().current().unwrap_or("main menu");
    let status = format!(" {topic} (depth {depth}) | 1-9 pick | b back | m menu | ↑↓ PgUp PgDn scroll | q quit");
    put(buf, area.x, area.y, &status, Style::default().fg(theme::DIM_GRAY));
}

/// `set_string` that ignores out-of-bounds positions
fn put(buf: &mut Buffer, x: u16, y: u16, text: &str, style: Style) {
    let area = buf.area;
    if y < area.top() || y >= area.bottom() || x < area.left() || x >= area.right() {
        return;
    }
    let room = usize::from(area.right() - x);
    buf.set_stringn(x, y, text, room, style);
}
