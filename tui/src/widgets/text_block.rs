//! TextBlock Widget
//!
//! A borderless, scrollable text region that draws bold runs of markup in
//! bold and can end in a typewriter cursor.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;
use unicode_width::UnicodeWidthChar;

use folio_core::markup::Segment;

/// Glyph drawn for the typewriter cursor
pub const CURSOR_GLYPH: char = '▌';

/// State for a scrollable text block
#[derive(Debug, Default)]
pub struct TextBlockState {
    /// Scroll offset (lines from top)
    pub scroll_offset: usize,
    /// Total content lines
    pub total_lines: usize,
    /// Keep the last line in view as text grows
    pub follow: bool,
}

impl TextBlockState {
    /// State that keeps the tail in view
    #[must_use]
    pub fn following() -> Self {
        Self {
            follow: true,
            ..Self::default()
        }
    }

    /// Scroll by delta (positive = down)
    pub fn scroll(&mut self, delta: i32) {
        let new_offset = self.scroll_offset as i64 + i64::from(delta);
        self.scroll_offset = new_offset.max(0) as usize;
        self.follow = false;
    }

    /// Scroll to bottom
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.total_lines.saturating_sub(1);
        self.follow = true;
    }
}

/// A borderless, scrollable text block
pub struct TextBlock<'a> {
    segments: &'a [Segment],
    style: Style,
    cursor: Option<Style>,
}

impl<'a> TextBlock<'a> {
    /// Block showing `segments`
    #[must_use]
    pub fn new(segments: &'a [Segment]) -> Self {
        Self {
            segments,
            style: Style::default(),
            cursor: None,
        }
    }

    /// Base text style
    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// End the text with a cursor drawn in `style`
    #[must_use]
    pub fn cursor(mut self, style: Option<Style>) -> Self {
        self.cursor = style;
        self
    }

    /// Wrap to `width`, keeping each character's boldness
    fn styled_lines(&self, width: usize) -> Vec<Vec<(char, bool)>> {
        let source: Vec<(char, bool)> = self
            .segments
            .iter()
            .flat_map(|s| s.text.chars().map(move |c| (c, s.bold)))
            .collect();
        let plain: String = source.iter().map(|(c, _)| *c).collect();

        // Wrapping only drops whitespace, so each wrapped character can be
        // matched back to its source by scanning forward.
        let mut position = 0;
        let mut lines = Vec::new();
        for raw in plain.split('\n') {
            let wrapped = if raw.is_empty() {
                vec![std::borrow::Cow::Borrowed("")]
            } else {
                wrap(raw, width.max(1))
            };
            for line in wrapped {
                let mut styled = Vec::new();
                for c in line.chars() {
                    while position < source.len() && source[position].0 != c {
                        position += 1;
                    }
                    let bold = source.get(position).is_some_and(|(_, b)| *b);
                    styled.push((c, bold));
                    position += 1;
                }
                lines.push(styled);
            }
        }
        lines
    }
}

impl StatefulWidget for TextBlock<'_> {
    type State = TextBlockState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Leave a column for the cursor
        let mut lines: Vec<Vec<(char, Style)>> = self
            .styled_lines(usize::from(area.width.saturating_sub(1)))
            .into_iter()
            .map(|line| {
                line.into_iter()
                    .map(|(c, bold)| {
                        let style = if bold { self.style.add_modifier(Modifier::BOLD) } else { self.style };
                        (c, style)
                    })
                    .collect()
            })
            .collect();
        if let Some(cursor_style) = self.cursor {
            match lines.last_mut() {
                Some(last) => last.push((CURSOR_GLYPH, cursor_style)),
                None => lines.push(vec![(CURSOR_GLYPH, cursor_style)]),
            }
        }

        state.total_lines = lines.len();

        // Clamp scroll
        let max_scroll = state.total_lines.saturating_sub(usize::from(area.height));
        state.scroll_offset = if state.follow {
            max_scroll
        } else {
            state.scroll_offset.min(max_scroll)
        };

        // Render visible lines
        for (i, line) in lines
            .iter()
            .skip(state.scroll_offset)
            .take(usize::from(area.height))
            .enumerate()
        {
            let y = area.y + i as u16;
            let mut x = area.x;
            for (c, style) in line {
                let width = c.width().unwrap_or(0) as u16;
                if x + width > area.right() {
                    break;
                }
                buf.set_string(x, y, c.to_string(), *style);
                x += width;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::markup::segments;
    use pretty_assertions::assert_eq;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_wraps_and_keeps_bold() {
        let segs = segments("likes <b>coffee</b> a lot");
        let area = Rect::new(0, 0, 13, 3);
        let mut buf = Buffer::empty(area);
        let mut state = TextBlockState::default();

        TextBlock::new(&segs).render(area, &mut buf, &mut state);

        assert_eq!(row(&buf, 0), "likes coffee");
        assert_eq!(row(&buf, 1), "a lot");
        assert!(buf[(6, 0)].modifier.contains(Modifier::BOLD));
        assert!(!buf[(0, 0)].modifier.contains(Modifier::BOLD));
        assert!(!buf[(0, 1)].modifier.contains(Modifier::BOLD));
        assert_eq!(state.total_lines, 2);
    }

    #[test]
    fn test_cursor_follows_text() {
        let segs = segments("Hi");
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        let mut state = TextBlockState::default();

        TextBlock::new(&segs)
            .cursor(Some(Style::default()))
            .render(area, &mut buf, &mut state);
        assert_eq!(row(&buf, 0), format!("Hi{CURSOR_GLYPH}"));
    }

    #[test]
    fn test_follow_shows_tail() {
        let segs = segments("one two three four five six");
        let area = Rect::new(0, 0, 6, 2);
        let mut buf = Buffer::empty(area);
        let mut state = TextBlockState::following();

        TextBlock::new(&segs).render(area, &mut buf, &mut state);
        assert_eq!(row(&buf, 1), "six");
    }
}
