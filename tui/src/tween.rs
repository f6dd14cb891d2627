//! Transform Tweening
//!
//! The core only records where a surface should end up and how it should get
//! there. This module plays that transition out frame by frame.

use std::collections::HashMap;
use std::time::Duration;

use folio_core::{SurfaceKey, SurfaceMap, Transform, Transition};

#[derive(Clone, Copy, Debug)]
struct Tween {
    from: Transform,
    to: Transform,
    started: Duration,
    transition: Option<Transition>,
}

impl Tween {
    fn at(&self, now: Duration) -> Transform {
        let Some(transition) = self.transition else {
            return self.to;
        };
        let elapsed = now.saturating_sub(self.started).as_millis();
        let t = transition.progress(u64::try_from(elapsed).unwrap_or(u64::MAX));
        self.from.lerp(self.to, t)
    }
}

/// Displayed transforms for a set of surfaces
#[derive(Debug, Default)]
pub struct Tweens {
    tweens: HashMap<SurfaceKey, Tween>,
}

impl Tweens {
    /// Create an empty tween set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up new targets from `surfaces`
    ///
    /// A changed target starts a tween from whatever is displayed right now.
    pub fn sync(&mut self, keys: &[SurfaceKey], surfaces: &SurfaceMap, now: Duration) {
        for key in keys {
            let Some(surface) = surfaces.get(*key) else {
                continue;
            };
            let target = surface.transform();
            match self.tweens.get_mut(key) {
                Some(tween) if tween.to == target => {}
                Some(tween) => {
                    *tween = Tween {
                        from: tween.at(now),
                        to: target,
                        started: now,
                        transition: surface.transition(),
                    };
                }
                None => {
                    self.tweens.insert(
                        *key,
                        Tween {
                            from: target,
                            to: target,
                            started: now,
                            transition: None,
                        },
                    );
                }
            }
        }
    }

    /// Transform to draw `key` with at `now`
    #[must_use]
    pub fn current(&self, key: SurfaceKey, now: Duration) -> Transform {
        self.tweens
            .get(&key)
            .map_or(Transform::IDENTITY, |tween| tween.at(now))
    }
}
