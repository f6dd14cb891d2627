//! Animation Primitives
//!
//! Surface-agnostic descriptions of the visual changes the core asks for.
//! The core says WHAT a surface should look like and how long the change
//! should take; each host decides how to draw the in-between frames.

use serde::{Deserialize, Serialize};

/// Easing functions for transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EasingFunction {
    /// No easing (constant speed)
    #[default]
    Linear,

    /// Slow start, fast end
    EaseIn,

    /// Fast start, slow end
    EaseOut,

    /// Slow start and end
    EaseInOut,

    /// Overshoot then settle (the bubble pop)
    EaseOutBack,
}

impl EasingFunction {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(2),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseOutBack => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                let t_minus_1 = t - 1.0;
                1.0 + c3 * t_minus_1.powi(3) + c1 * t_minus_1.powi(2)
            }
        }
    }
}

/// Scale and vertical offset of a surface
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Uniform scale (0.0 = collapsed, 1.0 = natural size)
    pub scale: f32,

    /// Vertical offset, negative is up
    pub translate_y: f32,
}

impl Transform {
    /// Natural size, no offset
    pub const IDENTITY: Self = Self::new(1.0, 0.0);

    /// Collapsed to nothing
    pub const COLLAPSED: Self = Self::new(0.0, 0.0);

    /// Create a transform
    #[must_use]
    pub const fn new(scale: f32, translate_y: f32) -> Self {
        Self { scale, translate_y }
    }

    /// Interpolate between two transforms
    #[must_use]
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            scale: self.scale + (to.scale - self.scale) * t,
            translate_y: self.translate_y + (to.translate_y - self.translate_y) * t,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Which properties a transition animates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransitionProperty {
    /// Every animatable property (opacity and transform)
    #[default]
    All,
    /// Only the transform
    Transform,
}

/// How a surface moves from its old look to its new one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Animated properties
    pub property: TransitionProperty,

    /// Duration in milliseconds
    pub duration_ms: u64,

    /// Easing curve
    pub easing: EasingFunction,
}

impl Transition {
    /// Create a transition
    #[must_use]
    pub const fn new(property: TransitionProperty, duration_ms: u64, easing: EasingFunction) -> Self {
        Self {
            property,
            duration_ms,
            easing,
        }
    }

    /// Eased progress after `elapsed_ms`
    #[must_use]
    pub fn progress(&self, elapsed_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let t = elapsed_ms as f32 / self.duration_ms as f32;
        self.easing.apply(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::EaseIn,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
            EasingFunction::EaseOutBack,
        ] {
            assert!(easing.apply(0.0).abs() < 0.001, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_ease_out_back_overshoots() {
        let peak = (1..100)
            .map(|i| EasingFunction::EaseOutBack.apply(i as f32 / 100.0))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_transition_progress() {
        let transition = Transition::new(TransitionProperty::All, 400, EasingFunction::Linear);
        assert!((transition.progress(200) - 0.5).abs() < 0.001);
        assert!((transition.progress(800) - 1.0).abs() < 0.001);

        let instant = Transition::new(TransitionProperty::All, 0, EasingFunction::EaseIn);
        assert!((instant.progress(0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_transform_lerp() {
        let mid = Transform::COLLAPSED.lerp(Transform::new(1.0, -8.0), 0.5);
        assert!((mid.scale - 0.5).abs() < 0.001);
        assert!((mid.translate_y + 4.0).abs() < 0.001);
    }
}
