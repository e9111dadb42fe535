//! `kinclimb-types` – shared vocabulary for the kinclimb stack.
//!
//! # Modules
//!
//! - [`math`] – [`Vec3`], [`Quaternion`] and [`Transform3D`].
//! - [`config`] – serde tuning tables for the climbing engine, the gait
//!   engine and the sensor mount, with defaults and validation.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod math;

pub use config::{ClimbConfig, GaitConfig, HeadingMode, RigConfig, SensorMount};
pub use math::{Quaternion, Transform3D, Vec3};

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Identifier of a tracked person as reported by the skeletal provider.
///
/// Providers use `0` for "no user", so a [`UserId`] is never zero when it
/// comes out of [`UserId::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(u32);

impl UserId {
    /// Wrap a raw provider id; `0` means "no user" and yields `None`.
    pub fn new(raw: u32) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

/// Skeleton joints in sensor order (20-joint body model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    HipCenter,
    Spine,
    ShoulderCenter,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
}

impl Joint {
    pub const COUNT: usize = 20;

    /// Position of the joint in the provider's joint array.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One of the four limb endpoints used for climbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
}

impl Limb {
    pub const ALL: [Limb; 4] = [
        Limb::LeftHand,
        Limb::RightHand,
        Limb::LeftFoot,
        Limb::RightFoot,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The skeleton joint this limb is read from.
    pub fn joint(self) -> Joint {
        match self {
            Limb::LeftHand => Joint::HandLeft,
            Limb::RightHand => Joint::HandRight,
            Limb::LeftFoot => Joint::FootLeft,
            Limb::RightFoot => Joint::FootRight,
        }
    }

    pub fn is_hand(self) -> bool {
        matches!(self, Limb::LeftHand | Limb::RightHand)
    }
}

impl fmt::Display for Limb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Limb::LeftHand => "left_hand",
            Limb::RightHand => "right_hand",
            Limb::LeftFoot => "left_foot",
            Limb::RightFoot => "right_foot",
        };
        f.write_str(name)
    }
}

/// Body side, used for legs by the gait engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn knee(self) -> Joint {
        match self {
            Side::Left => Joint::KneeLeft,
            Side::Right => Joint::KneeRight,
        }
    }
}

/// Opaque handle of a climbable surface owned by the spatial backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Surface classification
// ────────────────────────────────────────────────────────────────────────────

/// Bit set of collision layers (bit `n` = layer `n`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);

    pub fn from_layer(layer: u8) -> Self {
        Self(1u32.checked_shl(u32::from(layer)).unwrap_or(0))
    }

    pub fn contains(self, layer: u8) -> bool {
        self.0 & Self::from_layer(layer).0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Decides which surfaces count as climbable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceClassifier {
    /// Set membership: the surface's layer must be in the mask.
    Layers(LayerMask),
    /// Predicate: the surface must carry this tag.
    Tagged(String),
}

impl SurfaceClassifier {
    /// Pick the classifier for a configured mask/tag pair.  A non-empty mask
    /// always wins; the tag is only the fallback.
    pub fn resolve(mask: LayerMask, tag: &str) -> Self {
        if mask.is_empty() {
            Self::Tagged(tag.to_string())
        } else {
            Self::Layers(mask)
        }
    }

    /// Whether a surface on `layer` is accepted; `has_tag` answers tag
    /// membership for the same surface.
    pub fn accepts(&self, layer: u8, has_tag: impl Fn(&str) -> bool) -> bool {
        match self {
            Self::Layers(mask) => mask.contains(layer),
            Self::Tagged(tag) => has_tag(tag),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Movement commit result
// ────────────────────────────────────────────────────────────────────────────

/// Which sides of the body collided during a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionFlags {
    /// Contact underneath the body (landed / standing).
    pub below: bool,
    /// Contact on the body's sides.
    pub sides: bool,
    /// Contact above the body.
    pub above: bool,
}

impl CollisionFlags {
    pub const NONE: Self = Self {
        below: false,
        sides: false,
        above: false,
    };

    pub fn grounded(self) -> bool {
        self.below
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type for the fallible edges of the stack: configuration, file I/O
/// and recorded sessions.  The per-frame engines never fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinError {
    #[error("Invalid configuration for {field}: {details}")]
    InvalidConfig { field: String, details: String },

    #[error("Recording Error: {0}")]
    Recording(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("I/O Error: {0}")]
    Io(String),
}

impl KinError {
    pub fn invalid(field: &str, details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_user_id_is_no_user() {
        assert!(UserId::new(0).is_none());
        assert_eq!(UserId::new(7).map(UserId::get), Some(7));
    }

    #[test]
    fn limb_joint_mapping() {
        assert_eq!(Limb::LeftHand.joint(), Joint::HandLeft);
        assert_eq!(Limb::RightFoot.joint(), Joint::FootRight);
        assert!(Limb::RightHand.is_hand());
        assert!(!Limb::LeftFoot.is_hand());
        assert_eq!(Joint::FootRight.index(), Joint::COUNT - 1);
    }

    #[test]
    fn layer_mask_membership() {
        let mask = LayerMask(LayerMask::from_layer(3).0 | LayerMask::from_layer(8).0);
        assert!(mask.contains(3));
        assert!(mask.contains(8));
        assert!(!mask.contains(4));
        assert!(!LayerMask::from_layer(40).contains(40));
    }

    #[test]
    fn classifier_prefers_mask_over_tag() {
        let c = SurfaceClassifier::resolve(LayerMask::from_layer(2), "Scalable");
        assert_eq!(c, SurfaceClassifier::Layers(LayerMask::from_layer(2)));
        assert!(c.accepts(2, |_| false));
        assert!(!c.accepts(1, |t| t == "Scalable"));
    }

    #[test]
    fn classifier_falls_back_to_tag() {
        let c = SurfaceClassifier::resolve(LayerMask::NONE, "Scalable");
        let tags = ["Wall", "Scalable"];
        assert!(c.accepts(0, |t| tags.contains(&t)));
        assert!(!c.accepts(0, |t| t == "Wall"));
    }

    #[test]
    fn kin_error_display() {
        let err = KinError::invalid("damping", "must be within [0, 1]");
        assert!(err.to_string().contains("damping"));
        assert!(KinError::Recording("bad frame".into()).to_string().contains("bad frame"));
    }

    #[test]
    fn limb_serializes_snake_case() {
        let json = serde_json::to_string(&Limb::LeftFoot).unwrap();
        assert_eq!(json, "\"left_foot\"");
        let back: Joint = serde_json::from_str("\"knee_right\"").unwrap();
        assert_eq!(back, Joint::KneeRight);
    }
}
