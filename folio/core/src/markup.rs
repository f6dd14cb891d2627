//! Markup Projection
//!
//! The typewriter reveals rich text as plain text and swaps the markup in at
//! the end. This module computes that plain-text projection, and a styled
//! segment view hosts can use to draw the final markup.
//!
//! Markup is parsed as an HTML fragment, so stray `<` or `>` in text and
//! character entities come out the way a browser's `textContent` shows them.
//! `<b>`/`<strong>` and `class='font-bold'` mark bold runs and `<br>`
//! becomes a newline.

use scraper::{ElementRef, Html, Node};

/// A run of text with uniform styling
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Visible text
    pub text: String,
    /// Whether the run is bold
    pub bold: bool,
}

/// Plain-text projection of `markup` (tags stripped, entities decoded)
#[must_use]
pub fn plain_text(markup: &str) -> String {
    segments(markup).into_iter().map(|s| s.text).collect()
}

/// Split `markup` into styled runs
#[must_use]
pub fn segments(markup: &str) -> Vec<Segment> {
    let fragment = Html::parse_fragment(markup);
    let mut out = Vec::new();
    collect(fragment.root_element(), false, &mut out);
    out
}

fn collect(element: ElementRef<'_>, bold: bool, out: &mut Vec<Segment>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_str(out, text, bold),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(child) else {
                    continue;
                };
                if el.value().name() == "br" {
                    push_str(out, "\n", bold);
                    continue;
                }
                collect(el, bold || is_bold(el), out);
            }
            _ => {}
        }
    }
}

fn is_bold(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "b" | "strong") || element.value().classes().any(|c| c == "font-bold")
}

fn push_str(out: &mut Vec<Segment>, text: &str, bold: bool) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(last) if last.bold == bold => last.text.push_str(text),
        _ => out.push(Segment {
            text: text.to_string(),
            bold,
        }),
    }
}
