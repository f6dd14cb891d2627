//! Main Application
//!
//! The App struct is a thin host around the [`Stage`]:
//! - Event loop (keyboard, mouse, resize)
//! - Scroll position, turned into section visibility
//! - A real clock, turned into `advance_to` calls
//! - Class animations, reported back as ended once they would have played
//!
//! Everything except [`App::run`] is clock-free so it can be driven from
//! tests with made-up times.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Position, Rect};
use ratatui::{Frame, Terminal};

use folio_core::{
    classes, ContentStore, Followup, FolioConfig, MemorySurface, NavToken, Stage, SurfaceKey, SurfaceMap,
    VisibilityPolicy,
};

use crate::page::{PageLayout, SECTIONS};
use crate::render::{ControlHit, PageRenderer};
use crate::tween::Tweens;

/// Lines moved per mouse wheel notch
const WHEEL_ROWS: i32 = 3;

/// Surfaces whose transforms are tweened
const TWEENED: [SurfaceKey; 2] = [SurfaceKey::IntroBubble, SurfaceKey::BoardBubble];

/// How long a class animation plays (matches the page's stylesheet)
#[must_use]
pub fn animation_duration(surface: &MemorySurface) -> Duration {
    let ms = if surface.has_class(classes::ANIMATE_QUICK_POP) {
        300
    } else if surface.has_class(classes::ANIMATE_POP) {
        500
    } else if surface.has_class(classes::ANIMATE_STRONG_POP) {
        600
    } else {
        0
    };
    Duration::from_millis(ms)
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// The page
    stage: Stage,
    /// When sections count as visible
    policy: VisibilityPolicy,

    // === Display State ===
    page: PageLayout,
    tweens: Tweens,
    renderer: PageRenderer,
    /// Controls drawn in the last frame
    hits: Vec<ControlHit>,

    // === Timing ===
    /// Armed animation ends and when to report them
    pending_ends: Vec<(SurfaceKey, Duration)>,
    /// Time of the last tick
    now: Duration,
    /// Longest sleep between frames
    frame_interval: Duration,
}

impl App {
    /// Create an app for a `width` x `height` terminal
    #[must_use]
    pub fn new(config: &FolioConfig, content: ContentStore, width: u16, height: u16) -> Self {
        let stage = Stage::new(config, Arc::new(content), SurfaceMap::full());
        Self::with_stage(stage, config, width, height)
    }

    /// Create an app around an existing stage
    #[must_use]
    pub fn with_stage(stage: Stage, config: &FolioConfig, width: u16, height: u16) -> Self {
        let mut app = Self {
            running: true,
            stage,
            policy: config.visibility,
            page: PageLayout::new(width, height),
            tweens: Tweens::new(),
            renderer: PageRenderer::new(),
            hits: Vec::new(),
            pending_ends: Vec::new(),
            now: Duration::ZERO,
            frame_interval: Duration::from_millis(1000 / u64::from(config.fps.max(1))),
        };
        app.sync_visibility();
        app.tweens.sync(&TWEENED, app.stage.surfaces(), Duration::ZERO);
        app
    }

    /// Whether the app should keep running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The page being shown
    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Scroll state
    #[must_use]
    pub fn page(&self) -> &PageLayout {
        &self.page
    }

    /// Controls drawn in the last frame
    #[must_use]
    pub fn hits(&self) -> &[ControlHit] {
        &self.hits
    }

    /// The control list number keys pick from
    #[must_use]
    pub fn visible_controls(&self) -> &[Followup] {
        let surfaces = self.stage.surfaces();
        let followups = surfaces
            .get(SurfaceKey::BoardFollowups)
            .filter(|s| !s.has_class(classes::HIDDEN));
        followups
            .or_else(|| surfaces.get(SurfaceKey::BoardQuestions))
            .map(MemorySurface::controls)
            .unwrap_or_default()
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle one terminal event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(w, h) => self.handle_resize(w, h),
            _ => {}
        }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            // Quit
            KeyCode::Esc | KeyCode::Char('q') => self.quit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit(),

            // Navigation
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.activate_index(index);
            }
            KeyCode::Char('b') | KeyCode::Backspace => self.stage.go_back(),
            KeyCode::Char('m') => self.stage.activate(NavToken::Main.id()),

            // Scrolling
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-self.half_page()),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_by(self.half_page()),
            KeyCode::Home => self.scroll_to_top(),
            KeyCode::End => self.scroll_by(i32::from(self.page.max_scroll())),

            _ => {}
        }
    }

    /// Handle mouse input
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_by(-WHEEL_ROWS),
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_ROWS),
            MouseEventKind::Down(MouseButton::Left) => {
                let position = Position::new(mouse.column, mouse.row);
                let hit = self.hits.iter().find(|hit| hit.area.contains(position)).map(|hit| hit.id.clone());
                if let Some(id) = hit {
                    self.stage.activate(&id);
                }
            }
            _ => {}
        }
    }

    /// Handle terminal resize
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.page.resize(width, height);
        self.hits.clear();
        self.sync_visibility();
    }

    fn quit(&mut self) {
        tracing::info!("Quit requested");
        self.running = false;
    }

    fn activate_index(&mut self, index: usize) {
        let Some(id) = self.visible_controls().get(index).map(|c| c.id.clone()) else {
            return;
        };
        self.stage.activate(&id);
    }

    fn half_page(&self) -> i32 {
        i32::from(self.page.viewport() / 2).max(1)
    }

    fn scroll_to_top(&mut self) {
        self.scroll_by(-i32::from(self.page.scroll()));
    }

    fn scroll_by(&mut self, delta: i32) {
        self.page.scroll_by(delta);
        self.sync_visibility();
    }

    /// Tell the stage how much of each section is on screen
    fn sync_visibility(&mut self) {
        for section in SECTIONS {
            let ratio = self.page.visible_ratio(section, &self.policy);
            self.stage.set_visibility(section, ratio);
        }
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Let time pass up to `now`
    pub fn tick(&mut self, now: Duration) {
        // Report animation ends at the moment they finish, in order
        loop {
            self.track_animations();
            let due = self
                .pending_ends
                .iter()
                .enumerate()
                .filter(|(_, (_, due))| *due <= now)
                .min_by_key(|(_, (_, due))| *due)
                .map(|(index, _)| index);
            let Some(index) = due else {
                break;
            };
            let (key, at) = self.pending_ends.remove(index);
            self.stage.advance_to(at);
            let ended = self
                .stage
                .surfaces_mut()
                .get_mut(key)
                .is_some_and(MemorySurface::take_animation_end);
            if ended {
                self.stage.animation_ended(key);
            }
        }

        self.stage.advance_to(now);
        self.track_animations();
        self.tweens.sync(&TWEENED, self.stage.surfaces(), now);
        self.now = now;
    }

    /// How long the loop may sleep before the next tick is needed
    pub fn next_wakeup(&mut self) -> Duration {
        let now = self.now;
        let mut wait = self.frame_interval;
        if let Some(deadline) = self.stage.next_deadline() {
            wait = wait.min(deadline.saturating_sub(now));
        }
        for (_, due) in &self.pending_ends {
            wait = wait.min(due.saturating_sub(now));
        }
        wait
    }

    /// Start timing animations the stage armed since the last look
    fn track_animations(&mut self) {
        let base = self.stage.now();
        for key in self.stage.surfaces().armed() {
            if self.pending_ends.iter().any(|(k, _)| *k == key) {
                continue;
            }
            let duration = self
                .stage
                .surfaces()
                .get(key)
                .map_or(Duration::ZERO, animation_duration);
            tracing::trace!(surface = key.id(), ?duration, "Timing animation");
            self.pending_ends.push((key, base + duration));
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Draw the current state
    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        self.draw_to(area, frame.buffer_mut());
    }

    /// Draw into a buffer
    pub fn draw_to(&mut self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.hits = self
            .renderer
            .render(&self.stage, &self.page, &self.tweens, self.now, area, buf);
    }

    /// Main event loop
    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();
        let origin = Instant::now();

        // Render initial frame immediately so user sees UI
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            let wait = self.next_wakeup();

            tokio::select! {
                biased;

                // Check for terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => return Err(e.into()),
                        None => self.running = false,
                    }
                }

                // Frame tick or stage deadline
                () = tokio::time::sleep(wait) => {}
            }

            self.tick(origin.elapsed());
            terminal.draw(|frame| self.draw(frame))?;
        }

        Ok(())
    }
}
