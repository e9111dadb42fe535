//! Walking heading estimation.
//!
//! The raw target comes from one of three sources, picked by
//! [`HeadingMode`]:
//!
//! - **View direction** – a forward-facing camera, flattened onto the
//!   horizontal plane.
//! - **Shoulders** – the line from the left to the right shoulder turned 90°
//!   about the vertical (`across × up`), optionally inverted.  Shoulder
//!   positions must already be in a left-handed, Y-up frame.
//! - **Body forward** – the character's own forward axis.
//!
//! Any source that cannot produce a horizontal direction falls back to the
//! body forward.  The target is then smoothed with a slerp at
//! `turn_smooth · dt` per frame.
//!
//! # Example
//!
//! ```rust
//! use kinclimb_perception::heading::{HeadingInputs, HeadingTracker};
//! use kinclimb_types::{GaitConfig, Vec3};
//!
//! let mut tracker = HeadingTracker::new(&GaitConfig::default());
//! let inputs = HeadingInputs {
//!     view: None,
//!     shoulders: Some((Vec3::new(-0.2, 1.4, 0.0), Vec3::new(0.2, 1.4, 0.0))),
//!     body_forward: Vec3::RIGHT,
//! };
//! let h = tracker.update(0.016, &inputs);
//! assert!((h.z - 1.0).abs() < 1e-5);
//! ```

use kinclimb_types::{GaitConfig, HeadingMode, Quaternion, Vec3};

/// Per-frame heading sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingInputs {
    /// Look direction of the forward-facing view, if any.
    pub view: Option<Vec3>,
    /// `(left, right)` shoulder positions, if both are tracked.
    pub shoulders: Option<(Vec3, Vec3)>,
    /// Current forward axis of the character body.
    pub body_forward: Vec3,
}

#[derive(Debug, Clone)]
pub struct HeadingTracker {
    mode: HeadingMode,
    invert: bool,
    turn_smooth: f32,
    rotate_body: bool,
    smoothed: Option<Vec3>,
}

impl HeadingTracker {
    pub fn new(cfg: &GaitConfig) -> Self {
        Self {
            mode: cfg.heading_mode,
            invert: cfg.invert_forward,
            turn_smooth: cfg.turn_smooth.max(0.0),
            rotate_body: cfg.rotate_body,
            smoothed: None,
        }
    }

    pub fn mode(&self) -> HeadingMode {
        self.mode
    }

    /// The smoothed heading, once at least one frame has been seen.
    pub fn heading(&self) -> Option<Vec3> {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = None;
    }

    /// Instantaneous horizontal unit heading for this frame's inputs.
    pub fn target(&self, inputs: &HeadingInputs) -> Vec3 {
        let from_source = match self.mode {
            HeadingMode::ViewDirection => inputs.view.and_then(|v| v.horizontal().try_normalize()),
            HeadingMode::Shoulders => inputs.shoulders.and_then(|(left, right)| {
                let forward = (right - left).cross(Vec3::UP).horizontal().try_normalize()?;
                Some(if self.invert { -forward } else { forward })
            }),
            HeadingMode::BodyForward => None,
        };
        from_source
            .or_else(|| inputs.body_forward.horizontal().try_normalize())
            .unwrap_or(Vec3::FORWARD)
    }

    /// Advance the smoothed heading by one frame and return it.  The first
    /// frame after a reset snaps straight to the target.
    pub fn update(&mut self, dt: f32, inputs: &HeadingInputs) -> Vec3 {
        let target = self.target(inputs);
        let next = match self.smoothed {
            None => target,
            Some(current) => current
                .slerp(target, self.turn_factor(dt))
                .horizontal()
                .try_normalize()
                .unwrap_or(target),
        };
        self.smoothed = Some(next);
        next
    }

    /// Body orientation one smoothing step from `current` toward the
    /// heading, or `None` when body rotation is off or no heading exists.
    pub fn body_rotation(&self, current: Quaternion, dt: f32) -> Option<Quaternion> {
        if !self.rotate_body {
            return None;
        }
        let goal = Quaternion::look_rotation(self.smoothed?)?;
        Some(current.slerp(goal, self.turn_factor(dt)))
    }

    fn turn_factor(&self, dt: f32) -> f32 {
        (self.turn_smooth * dt.max(0.0)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(mode: HeadingMode) -> GaitConfig {
        GaitConfig {
            heading_mode: mode,
            ..GaitConfig::default()
        }
    }

    fn inputs() -> HeadingInputs {
        HeadingInputs {
            view: Some(Vec3::new(1.0, 0.5, 0.0)),
            shoulders: Some((Vec3::new(-0.2, 1.4, 0.0), Vec3::new(0.2, 1.4, 0.0))),
            body_forward: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn view_direction_is_flattened() {
        let t = HeadingTracker::new(&cfg(HeadingMode::ViewDirection));
        assert!(close(t.target(&inputs()), Vec3::RIGHT));
    }

    #[test]
    fn vertical_view_falls_back_to_body() {
        let t = HeadingTracker::new(&cfg(HeadingMode::ViewDirection));
        let i = HeadingInputs {
            view: Some(Vec3::UP),
            ..inputs()
        };
        assert!(close(t.target(&i), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn shoulders_give_perpendicular_forward() {
        let t = HeadingTracker::new(&cfg(HeadingMode::Shoulders));
        assert!(close(t.target(&inputs()), Vec3::FORWARD));

        let inverted = HeadingTracker::new(&GaitConfig {
            invert_forward: true,
            ..GaitConfig::default()
        });
        assert!(close(inverted.target(&inputs()), -Vec3::FORWARD));
    }

    #[test]
    fn turned_shoulders_turn_heading() {
        let t = HeadingTracker::new(&cfg(HeadingMode::Shoulders));
        // Left shoulder in front, right shoulder behind: facing +X.
        let i = HeadingInputs {
            shoulders: Some((Vec3::new(0.0, 1.4, 0.2), Vec3::new(0.0, 1.4, -0.2))),
            ..inputs()
        };
        assert!(close(t.target(&i), Vec3::RIGHT));
    }

    #[test]
    fn missing_shoulders_fall_back_to_body() {
        let t = HeadingTracker::new(&cfg(HeadingMode::Shoulders));
        let i = HeadingInputs {
            shoulders: None,
            ..inputs()
        };
        assert!(close(t.target(&i), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn body_forward_mode_ignores_other_sources() {
        let t = HeadingTracker::new(&cfg(HeadingMode::BodyForward));
        assert!(close(t.target(&inputs()), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn smoothing_moves_part_way() {
        let mut t = HeadingTracker::new(&GaitConfig {
            heading_mode: HeadingMode::ViewDirection,
            turn_smooth: 5.0,
            ..GaitConfig::default()
        });
        let mut i = inputs();
        i.view = Some(Vec3::FORWARD);
        assert!(close(t.update(0.1, &i), Vec3::FORWARD));

        i.view = Some(Vec3::RIGHT);
        let h = t.update(0.1, &i);
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!(close(h, Vec3::new(half, 0.0, half)));
        assert!(close(t.heading().unwrap(), h));
    }

    #[test]
    fn body_rotation_follows_heading() {
        let mut t = HeadingTracker::new(&cfg(HeadingMode::ViewDirection));
        assert!(t.body_rotation(Quaternion::identity(), 0.1).is_none());
        let mut i = inputs();
        i.view = Some(Vec3::RIGHT);
        t.update(0.1, &i);
        // turn_smooth 10 · dt 0.1 = one full step.
        let q = t.body_rotation(Quaternion::identity(), 0.1).unwrap();
        assert!(close(q.forward(), Vec3::RIGHT));
    }

    #[test]
    fn body_rotation_disabled() {
        let mut t = HeadingTracker::new(&GaitConfig {
            rotate_body: false,
            ..GaitConfig::default()
        });
        t.update(0.1, &inputs());
        assert!(t.body_rotation(Quaternion::identity(), 0.1).is_none());
        t.reset();
        assert!(t.heading().is_none());
    }
}
