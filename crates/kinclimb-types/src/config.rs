//! Tuning tables for the climbing engine, the gait engine and the sensor
//! mount.
//!
//! Every field has a default, so a TOML file only needs the values that
//! differ:
//!
//! ```rust
//! use kinclimb_types::config::RigConfig;
//!
//! let cfg: RigConfig = serde_json::from_str(r#"{ "climb": { "required_hold_time": 0.3 } }"#)
//!     .unwrap();
//! assert!((cfg.climb.required_hold_time - 0.3).abs() < 1e-6);
//! assert!((cfg.gait.impulse_distance - 0.28).abs() < 1e-6);
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::math::Vec3;
use crate::{KinError, LayerMask, SurfaceClassifier};

// ────────────────────────────────────────────────────────────────────────────
// Climbing
// ────────────────────────────────────────────────────────────────────────────

/// Parameters of the limb-anchored climbing engine.
///
/// Distances are in world units (metres at the default scale), times in
/// seconds, gains are dimensionless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClimbConfig {
    /// Layers that count as climbable.  When empty, `surface_tag` is used.
    pub surface_layers: LayerMask,
    /// Tag that marks climbable surfaces when no layer mask is set.
    pub surface_tag: String,

    pub use_hands: bool,
    pub use_feet: bool,
    pub hand_probe_radius: f32,
    pub foot_probe_radius: f32,

    /// Continuous contact with one surface needed before a grip commits.
    pub required_hold_time: f32,
    /// A non-latched grip drops once its limb strays this far from the anchor.
    pub release_distance: f32,
    /// Limbs further than this from the hip are ignored as implausible.
    pub max_reach_from_hip: f32,
    /// A non-latched grip drops after this long without contact.
    pub notouch_release_time: f32,

    /// Overall gain on the anchor pull, clamped to `[0.05, 2]` when applied.
    pub pull_gain: f32,
    /// Extra weight on the vertical pull component (`y *= 1 + bonus`).
    pub climb_up_bonus: f32,
    /// Weight of the latched limb in the anchor mean (others weigh 1).
    pub primary_anchor_weight: f32,

    pub step_up_gain: f32,
    pub min_up_delta: f32,
    /// Step-up multiplier for the latched limb.  Gestures only come from
    /// free limbs and the latched limb is always gripped, so this currently
    /// has no effect.
    pub primary_step_up_mul: f32,

    pub lateral_gain: f32,
    pub min_side_delta: f32,
    /// Lateral multiplier for the latched limb.  No effect, for the same
    /// reason as `primary_step_up_mul`.
    pub primary_lateral_mul: f32,
    pub lateral_max_per_frame: f32,
    pub hip_lateral_gain: f32,

    /// Combined motion shorter than this is dropped as sensor noise.
    pub deadzone: f32,
    /// Blend factor toward the new motion: 0 keeps the old, 1 takes the new.
    pub damping: f32,
    pub max_snap_per_frame: f32,
    /// Constant push along the body's forward axis while gripping.
    pub wall_snap: f32,

    pub gravity_when_free: f32,

    /// Gestures only move the body once this many limbs are gripped.
    pub min_grips_to_climb: u32,
    /// Move the body onto the anchor on the frame a grip commits.
    pub snap_on_grip: bool,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            surface_layers: LayerMask::NONE,
            surface_tag: "Scalable".to_string(),
            use_hands: true,
            use_feet: true,
            hand_probe_radius: 0.04,
            foot_probe_radius: 0.04,
            required_hold_time: 0.20,
            release_distance: 0.04,
            max_reach_from_hip: 0.40,
            notouch_release_time: 0.35,
            pull_gain: 1.0,
            climb_up_bonus: 0.9,
            primary_anchor_weight: 2.0,
            step_up_gain: 0.5,
            min_up_delta: 0.002,
            primary_step_up_mul: 1.5,
            lateral_gain: 0.5,
            min_side_delta: 0.002,
            primary_lateral_mul: 1.5,
            lateral_max_per_frame: 0.03,
            hip_lateral_gain: 0.5,
            deadzone: 0.0005,
            damping: 0.5,
            max_snap_per_frame: 0.05,
            wall_snap: 0.02,
            gravity_when_free: 9.81,
            min_grips_to_climb: 1,
            snap_on_grip: false,
        }
    }
}

impl ClimbConfig {
    /// The classifier implied by `surface_layers` / `surface_tag`.
    pub fn classifier(&self) -> SurfaceClassifier {
        SurfaceClassifier::resolve(self.surface_layers, &self.surface_tag)
    }

    /// Check ranges.  Returns the first offending field.
    pub fn validate(&self) -> Result<(), KinError> {
        non_negative("climb.hand_probe_radius", self.hand_probe_radius)?;
        non_negative("climb.foot_probe_radius", self.foot_probe_radius)?;
        non_negative("climb.required_hold_time", self.required_hold_time)?;
        non_negative("climb.release_distance", self.release_distance)?;
        positive("climb.max_reach_from_hip", self.max_reach_from_hip)?;
        non_negative("climb.notouch_release_time", self.notouch_release_time)?;
        positive("climb.pull_gain", self.pull_gain)?;
        non_negative("climb.deadzone", self.deadzone)?;
        non_negative("climb.max_snap_per_frame", self.max_snap_per_frame)?;
        non_negative("climb.lateral_max_per_frame", self.lateral_max_per_frame)?;
        unit_interval("climb.damping", self.damping)?;
        if self.primary_anchor_weight < 1.0 || !self.primary_anchor_weight.is_finite() {
            return Err(KinError::invalid(
                "climb.primary_anchor_weight",
                format!("must be >= 1, got {}", self.primary_anchor_weight),
            ));
        }
        if self.surface_layers.is_empty() && self.surface_tag.trim().is_empty() {
            return Err(KinError::invalid(
                "climb.surface_tag",
                "either surface_layers or surface_tag must be set",
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gait
// ────────────────────────────────────────────────────────────────────────────

/// Where the gait engine takes its forward direction from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HeadingMode {
    /// Forward-facing camera / headset view direction.
    ViewDirection,
    /// Perpendicular to the line across the shoulders.
    #[default]
    Shoulders,
    /// The body's own forward axis.
    BodyForward,
}

/// Parameters of the gait-impulse engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GaitConfig {
    pub heading_mode: HeadingMode,
    /// Flip the computed forward direction.
    pub invert_forward: bool,
    /// Heading slerp rate (fraction per second, `rate * dt` clamped to 1).
    pub turn_smooth: f32,
    /// Re-orient the body toward the smoothed heading.
    pub rotate_body: bool,

    /// Hip-to-knee vertical distance below which a leg counts as lifted.
    pub knee_lift_threshold: f32,
    /// Extra distance needed before a lifted leg counts as lowered again.
    pub hysteresis: f32,
    pub min_step_interval: f32,
    pub max_step_interval: f32,
    pub require_alternation: bool,

    /// Length of the warm-up window during which the standing baseline is
    /// averaged and no steps are detected.
    pub calibration_time: f32,
    /// EMA factor per frame for the standing baseline.
    pub calibration_smoothing: f32,

    /// Forward distance owed per accepted step.
    pub impulse_distance: f32,
    /// Time over which one step's distance is paid out.
    pub impulse_duration: f32,
    /// Upper bound of the pending-distance budget.
    pub max_stacked_distance: f32,

    /// Downward displacement rate applied every frame.
    pub gravity: f32,

    /// External displacement beyond this snaps the body back.
    pub snap_back_threshold: f32,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            heading_mode: HeadingMode::Shoulders,
            invert_forward: false,
            turn_smooth: 10.0,
            rotate_body: true,
            knee_lift_threshold: 0.12,
            hysteresis: 0.02,
            min_step_interval: 0.30,
            max_step_interval: 1.4,
            require_alternation: true,
            calibration_time: 0.8,
            calibration_smoothing: 0.2,
            impulse_distance: 0.28,
            impulse_duration: 0.18,
            max_stacked_distance: 0.6,
            gravity: 9.81,
            snap_back_threshold: 0.20,
        }
    }
}

impl GaitConfig {
    pub fn validate(&self) -> Result<(), KinError> {
        non_negative("gait.turn_smooth", self.turn_smooth)?;
        non_negative("gait.knee_lift_threshold", self.knee_lift_threshold)?;
        non_negative("gait.hysteresis", self.hysteresis)?;
        non_negative("gait.min_step_interval", self.min_step_interval)?;
        if self.max_step_interval < self.min_step_interval {
            return Err(KinError::invalid(
                "gait.max_step_interval",
                format!(
                    "must be >= min_step_interval ({}), got {}",
                    self.min_step_interval, self.max_step_interval
                ),
            ));
        }
        non_negative("gait.calibration_time", self.calibration_time)?;
        unit_interval("gait.calibration_smoothing", self.calibration_smoothing)?;
        non_negative("gait.impulse_distance", self.impulse_distance)?;
        non_negative("gait.impulse_duration", self.impulse_duration)?;
        non_negative("gait.max_stacked_distance", self.max_stacked_distance)?;
        non_negative("gait.snap_back_threshold", self.snap_back_threshold)?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sensor mount
// ────────────────────────────────────────────────────────────────────────────

/// How raw sensor coordinates are turned into world positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SensorMount {
    /// Negate Z to go from the sensor's right-handed frame to the world's.
    pub flip_z: bool,
    /// Offset of the sensor origin from the body origin (or world origin).
    pub offset: Vec3,
    /// Carry the skeleton along with the body pose.  Turn off when the
    /// provider already reports world positions.
    pub follow_body: bool,
}

impl Default for SensorMount {
    fn default() -> Self {
        Self {
            flip_z: true,
            offset: Vec3::zero(),
            follow_body: true,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rig
// ────────────────────────────────────────────────────────────────────────────

/// Complete configuration of a locomotion rig.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RigConfig {
    pub climb: ClimbConfig,
    pub gait: GaitConfig,
    pub mount: SensorMount,
}

impl RigConfig {
    pub fn validate(&self) -> Result<(), KinError> {
        self.climb.validate()?;
        self.gait.validate()?;
        if !self.mount.offset.is_finite() {
            return Err(KinError::invalid("mount.offset", "must be finite"));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn non_negative(field: &str, value: f32) -> Result<(), KinError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(KinError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

fn positive(field: &str, value: f32) -> Result<(), KinError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(KinError::invalid(field, format!("must be > 0, got {value}")))
    }
}

fn unit_interval(field: &str, value: f32) -> Result<(), KinError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(KinError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        RigConfig::default().validate().expect("defaults must validate");
    }

    #[test]
    fn damping_outside_unit_interval_is_rejected() {
        let mut cfg = RigConfig::default();
        cfg.climb.damping = 1.5;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, KinError::InvalidConfig { ref field, .. } if field == "climb.damping"));
    }

    #[test]
    fn inverted_step_interval_is_rejected() {
        let mut cfg = GaitConfig::default();
        cfg.min_step_interval = 1.0;
        cfg.max_step_interval = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn primary_weight_below_one_is_rejected() {
        let cfg = ClimbConfig {
            primary_anchor_weight: 0.5,
            ..ClimbConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_classifier_is_rejected() {
        let cfg = ClimbConfig {
            surface_tag: "  ".into(),
            ..ClimbConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn classifier_uses_layers_when_set() {
        let cfg = ClimbConfig {
            surface_layers: LayerMask::from_layer(9),
            ..ClimbConfig::default()
        };
        assert_eq!(
            cfg.classifier(),
            SurfaceClassifier::Layers(LayerMask::from_layer(9))
        );
        assert_eq!(
            ClimbConfig::default().classifier(),
            SurfaceClassifier::Tagged("Scalable".into())
        );
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: RigConfig = serde_json::from_str(
            r#"{ "gait": { "heading_mode": "view_direction" }, "mount": { "flip_z": false } }"#,
        )
        .unwrap();
        assert_eq!(cfg.gait.heading_mode, HeadingMode::ViewDirection);
        assert!(!cfg.mount.flip_z);
        assert!(cfg.mount.follow_body);
        assert_eq!(cfg.climb, ClimbConfig::default());
    }
}
