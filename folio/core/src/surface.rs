//! Render Surfaces
//!
//! The core never touches a real document. Every element it animates is a
//! [`RenderSurface`] found through a [`Surfaces`] lookup by [`SurfaceKey`].
//! A key with no surface behind it turns every operation on it into a no-op,
//! so a host can omit parts of the page without breaking the rest.
//!
//! [`MemorySurface`] and [`SurfaceMap`] are the in-memory implementation: the
//! terminal host draws from them and the tests assert on them.

use std::collections::{BTreeSet, HashMap};

use crate::animation::{Transform, Transition};
use crate::content::Followup;
use crate::markup;

/// Presentation class names the core toggles
pub mod classes {
    /// Cursor is hidden
    pub const CURSOR_HIDDEN: &str = "cursor-hidden";
    /// Cursor blinks
    pub const CURSOR_BLINK: &str = "cursor-blink";
    /// Element is taken out of the layout
    pub const HIDDEN: &str = "hidden";
    /// Element is fully transparent
    pub const OPACITY_0: &str = "opacity-0";
    /// Element is collapsed
    pub const SCALE_0: &str = "scale-0";
    /// Pop-in keyframe animation
    pub const ANIMATE_POP: &str = "animate-pop";
    /// Faster pop-in keyframe animation
    pub const ANIMATE_QUICK_POP: &str = "animate-quick-pop";
    /// Bouncier pop-in keyframe animation
    pub const ANIMATE_STRONG_POP: &str = "animate-strong-pop";

    /// Every pop animation class
    pub const POP_ANIMATIONS: [&str; 3] = [ANIMATE_POP, ANIMATE_QUICK_POP, ANIMATE_STRONG_POP];

    /// The pre-entrance state of a section element
    pub const COLLAPSED: [&str; 2] = [OPACITY_0, SCALE_0];
}

/// Stable lookup keys for every element the core drives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceKey {
    /// Intro avatar circle
    IntroCircle,
    /// Intro floating chat bubble
    IntroBubble,
    /// Intro chat box framing the typewriter
    IntroChatBox,
    /// Intro typewriter text
    IntroText,
    /// Intro typewriter cursor
    IntroCursor,
    /// Blackboard avatar circle
    BoardCircle,
    /// Blackboard chat bubble (doubles as the idle prompt)
    BoardBubble,
    /// Blackboard dialogue container
    BoardDialogue,
    /// Blackboard answer text
    BoardAnswer,
    /// Blackboard typewriter cursor
    BoardCursor,
    /// Main question list
    BoardQuestions,
    /// Follow-up list
    BoardFollowups,
}

impl SurfaceKey {
    /// Every key, in page order
    pub const ALL: [Self; 12] = [
        Self::IntroCircle,
        Self::IntroBubble,
        Self::IntroChatBox,
        Self::IntroText,
        Self::IntroCursor,
        Self::BoardCircle,
        Self::BoardBubble,
        Self::BoardDialogue,
        Self::BoardAnswer,
        Self::BoardCursor,
        Self::BoardQuestions,
        Self::BoardFollowups,
    ];

    /// Element id in the hosting document
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::IntroCircle => "chibi-circle",
            Self::IntroBubble => "chat-bubble",
            Self::IntroChatBox => "chat-box",
            Self::IntroText => "typewriter-text",
            Self::IntroCursor => "cursor",
            Self::BoardCircle => "blackboard-chibi",
            Self::BoardBubble => "blackboard-chat-bubble",
            Self::BoardDialogue => "blackboard-dialogue",
            Self::BoardAnswer => "blackboard-answer",
            Self::BoardCursor => "blackboard-cursor",
            Self::BoardQuestions => "blackboard-questions",
            Self::BoardFollowups => "blackboard-followups",
        }
    }

    /// Reverse of [`SurfaceKey::id`]
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

/// One element the core can draw into
pub trait RenderSurface {
    /// Current plain-text content
    fn text(&self) -> String;

    /// Replace the content with plain text
    fn set_text(&mut self, text: &str);

    /// Replace the content with markup
    fn set_markup(&mut self, markup: &str);

    /// Set inline opacity (0.0 to 1.0)
    fn set_opacity(&mut self, opacity: f32);

    /// Add a presentation class
    fn add_class(&mut self, class: &str);

    /// Remove a presentation class
    fn remove_class(&mut self, class: &str);

    /// Set the transform, animating with `transition` (`None` = jump)
    fn set_transform(&mut self, transform: Transform, transition: Option<Transition>);

    /// Replace the activation targets rendered inside this surface
    fn set_controls(&mut self, controls: &[Followup]);

    /// Ask for one notification when the current class animation ends
    ///
    /// The host reports it through `Stage::animation_ended`.
    fn arm_animation_end(&mut self);
}

/// Lookup of surfaces by key
///
/// The provided methods skip missing surfaces silently.
pub trait Surfaces {
    /// Mutable access to a surface
    fn surface_mut(&mut self, key: SurfaceKey) -> Option<&mut dyn RenderSurface>;

    /// Shared access to a surface
    fn surface(&self, key: SurfaceKey) -> Option<&dyn RenderSurface>;

    /// Plain text of a surface (empty if missing)
    fn text(&self, key: SurfaceKey) -> String {
        self.surface(key).map(|s| s.text()).unwrap_or_default()
    }

    /// Set plain text
    fn set_text(&mut self, key: SurfaceKey, text: &str) {
        if let Some(s) = self.surface_mut(key) {
            s.set_text(text);
        }
    }

    /// Set markup
    fn set_markup(&mut self, key: SurfaceKey, markup: &str) {
        if let Some(s) = self.surface_mut(key) {
            s.set_markup(markup);
        }
    }

    /// Set opacity
    fn set_opacity(&mut self, key: SurfaceKey, opacity: f32) {
        if let Some(s) = self.surface_mut(key) {
            s.set_opacity(opacity);
        }
    }

    /// Add classes
    fn add_classes(&mut self, key: SurfaceKey, classes: &[&str]) {
        if let Some(s) = self.surface_mut(key) {
            for class in classes {
                s.add_class(class);
            }
        }
    }

    /// Remove classes
    fn remove_classes(&mut self, key: SurfaceKey, classes: &[&str]) {
        if let Some(s) = self.surface_mut(key) {
            for class in classes {
                s.remove_class(class);
            }
        }
    }

    /// Set transform
    fn set_transform(&mut self, key: SurfaceKey, transform: Transform, transition: Option<Transition>) {
        if let Some(s) = self.surface_mut(key) {
            s.set_transform(transform, transition);
        }
    }

    /// Replace controls
    fn set_controls(&mut self, key: SurfaceKey, controls: &[Followup]) {
        if let Some(s) = self.surface_mut(key) {
            s.set_controls(controls);
        }
    }

    /// Arm a once-only animation-end notification
    fn arm_animation_end(&mut self, key: SurfaceKey) {
        if let Some(s) = self.surface_mut(key) {
            s.arm_animation_end();
        }
    }
}

/// Content of a [`MemorySurface`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SurfaceContent {
    /// Plain text
    #[default]
    Empty,
    /// Plain text
    Text(String),
    /// Markup (rendered rich)
    Markup(String),
}

/// In-memory surface recording everything the core asks for
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemorySurface {
    content: SurfaceContent,
    /// Inline opacity; `None` means the stylesheet default (opaque)
    opacity: Option<f32>,
    classes: BTreeSet<String>,
    transform: Option<Transform>,
    transition: Option<Transition>,
    controls: Vec<Followup>,
    animation_end_armed: bool,
    /// Number of content writes (one per typewriter step)
    writes: usize,
}

impl MemorySurface {
    /// Create an empty surface
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content
    #[must_use]
    pub fn content(&self) -> &SurfaceContent {
        &self.content
    }

    /// Markup, if the content is markup
    #[must_use]
    pub fn markup(&self) -> Option<&str> {
        match &self.content {
            SurfaceContent::Markup(m) => Some(m),
            _ => None,
        }
    }

    /// Effective opacity
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity.unwrap_or(1.0)
    }

    /// Whether a class is set
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// All classes, sorted
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Current transform
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform.unwrap_or_default()
    }

    /// Transition used by the last transform change
    #[must_use]
    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    /// Activation targets
    #[must_use]
    pub fn controls(&self) -> &[Followup] {
        &self.controls
    }

    /// Whether an animation-end notification is armed
    #[must_use]
    pub fn is_animation_end_armed(&self) -> bool {
        self.animation_end_armed
    }

    /// Consume the armed notification
    ///
    /// Returns `true` once per arming.
    pub fn take_animation_end(&mut self) -> bool {
        std::mem::take(&mut self.animation_end_armed)
    }

    /// Number of content writes so far
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Whether the element would be seen at all
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity() > 0.0
            && !self.has_class(classes::HIDDEN)
            && !self.has_class(classes::OPACITY_0)
            && !self.has_class(classes::SCALE_0)
            && self.transform().scale > 0.0
    }
}

impl RenderSurface for MemorySurface {
    fn text(&self) -> String {
        match &self.content {
            SurfaceContent::Empty => String::new(),
            SurfaceContent::Text(t) => t.clone(),
            SurfaceContent::Markup(m) => markup::plain_text(m),
        }
    }

    fn set_text(&mut self, text: &str) {
        self.writes += 1;
        self.content = if text.is_empty() {
            SurfaceContent::Empty
        } else {
            SurfaceContent::Text(text.to_string())
        };
    }

    fn set_markup(&mut self, markup: &str) {
        self.writes += 1;
        self.content = if markup.is_empty() {
            SurfaceContent::Empty
        } else {
            SurfaceContent::Markup(markup.to_string())
        };
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = Some(opacity.clamp(0.0, 1.0));
    }

    fn add_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    fn set_transform(&mut self, transform: Transform, transition: Option<Transition>) {
        self.transform = Some(transform);
        self.transition = transition;
    }

    fn set_controls(&mut self, controls: &[Followup]) {
        self.controls = controls.to_vec();
    }

    fn arm_animation_end(&mut self) {
        self.animation_end_armed = true;
    }
}

/// In-memory [`Surfaces`] implementation
#[derive(Clone, Debug, Default)]
pub struct SurfaceMap {
    surfaces: HashMap<SurfaceKey, MemorySurface>,
}

impl SurfaceMap {
    /// A map with no surfaces (every operation is a no-op)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A map with a surface behind every key
    #[must_use]
    pub fn full() -> Self {
        Self::with_keys(SurfaceKey::ALL)
    }

    /// A map with surfaces behind the given keys only
    pub fn with_keys(keys: impl IntoIterator<Item = SurfaceKey>) -> Self {
        Self {
            surfaces: keys.into_iter().map(|k| (k, MemorySurface::new())).collect(),
        }
    }

    /// Look up a surface
    #[must_use]
    pub fn get(&self, key: SurfaceKey) -> Option<&MemorySurface> {
        self.surfaces.get(&key)
    }

    /// Look up a surface mutably
    pub fn get_mut(&mut self, key: SurfaceKey) -> Option<&mut MemorySurface> {
        self.surfaces.get_mut(&key)
    }

    /// Keys whose animation-end notification is armed
    #[must_use]
    pub fn armed(&self) -> Vec<SurfaceKey> {
        let mut keys: Vec<SurfaceKey> = self
            .surfaces
            .iter()
            .filter(|(_, s)| s.is_animation_end_armed())
            .map(|(k, _)| *k)
            .collect();
        keys.sort();
        keys
    }
}

impl Surfaces for SurfaceMap {
    fn surface_mut(&mut self, key: SurfaceKey) -> Option<&mut dyn RenderSurface> {
        self.surfaces
            .get_mut(&key)
            .map(|s| s as &mut dyn RenderSurface)
    }

    fn surface(&self, key: SurfaceKey) -> Option<&dyn RenderSurface> {
        self.surfaces.get(&key).map(|s| s as &dyn RenderSurface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_surface_is_noop() {
        let mut map = SurfaceMap::empty();
        map.set_text(SurfaceKey::IntroText, "hello");
        map.add_classes(SurfaceKey::IntroCursor, &[classes::CURSOR_BLINK]);
        assert_eq!(map.text(SurfaceKey::IntroText), "");
    }

    #[test]
    fn test_markup_text_is_plain_projection() {
        let mut map = SurfaceMap::full();
        map.set_markup(SurfaceKey::IntroText, "a <b>b</b>");
        assert_eq!(map.text(SurfaceKey::IntroText), "a b");
        assert_eq!(
            map.get(SurfaceKey::IntroText).unwrap().markup(),
            Some("a <b>b</b>")
        );
    }

    #[test]
    fn test_visibility_rules() {
        let mut surface = MemorySurface::new();
        assert!(surface.is_visible());

        surface.add_class(classes::SCALE_0);
        assert!(!surface.is_visible());
        surface.remove_class(classes::SCALE_0);

        surface.set_opacity(0.0);
        assert!(!surface.is_visible());
        surface.set_opacity(2.0);
        assert!((surface.opacity() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_animation_end_fires_once() {
        let mut map = SurfaceMap::full();
        map.arm_animation_end(SurfaceKey::IntroChatBox);
        assert_eq!(map.armed(), vec![SurfaceKey::IntroChatBox]);

        let surface = map.get_mut(SurfaceKey::IntroChatBox).unwrap();
        assert!(surface.take_animation_end());
        assert!(!surface.take_animation_end());
    }

    #[test]
    fn test_key_ids_round_trip() {
        for key in SurfaceKey::ALL {
            assert_eq!(SurfaceKey::from_id(key.id()), Some(key));
        }
    }
}
