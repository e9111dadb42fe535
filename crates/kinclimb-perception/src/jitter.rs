//! Anti-jitter stage for the climbing displacement.
//!
//! ```text
//! |v| < deadzone            → 0
//! otherwise  out = lerp(last, v, damping), clamped to max_step
//! ```
//!
//! # Example
//!
//! ```rust
//! use kinclimb_perception::jitter::JitterFilter;
//! use kinclimb_types::Vec3;
//!
//! let mut f = JitterFilter::new(0.001, 0.5, 0.05);
//! let out = f.apply(Vec3::new(0.0, 0.02, 0.0));
//! assert!((out.y - 0.01).abs() < 1e-6);
//! assert_eq!(f.apply(Vec3::new(0.0, 0.0001, 0.0)), Vec3::zero());
//! ```

use kinclimb_types::{ClimbConfig, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct JitterFilter {
    deadzone: f32,
    /// Weight of the new sample, `0` keeps the old output, `1` takes the new.
    damping: f32,
    max_step: f32,
    last: Vec3,
}

impl JitterFilter {
    pub fn new(deadzone: f32, damping: f32, max_step: f32) -> Self {
        Self {
            deadzone: deadzone.max(0.0),
            damping: damping.clamp(0.0, 1.0),
            max_step: max_step.max(0.0),
            last: Vec3::zero(),
        }
    }

    pub fn from_config(cfg: &ClimbConfig) -> Self {
        Self::new(cfg.deadzone, cfg.damping, cfg.max_snap_per_frame)
    }

    /// Filter one frame's combined displacement and remember the result.
    pub fn apply(&mut self, raw: Vec3) -> Vec3 {
        let out = if raw.length() < self.deadzone {
            Vec3::zero()
        } else {
            self.last.lerp(raw, self.damping).clamp_length(self.max_step)
        };
        self.last = out;
        out
    }

    /// The previous output.
    pub fn last(&self) -> Vec3 {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = Vec3::zero();
    }
}
