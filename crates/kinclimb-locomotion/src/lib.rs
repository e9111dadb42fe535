//! `kinclimb-locomotion` – skeleton-driven character locomotion.
//!
//! Two engines share one body and never drive it at the same time:
//!
//! - [`climber`] – [`Climber`][climber::Climber]: limbs grip climbable
//!   surfaces after a dwell time and the body is pulled toward the anchors,
//!   steered by the free limbs' gestures.  Falls under gravity when nothing
//!   is gripped.
//! - [`gait`] – [`GaitEngine`][gait::GaitEngine]: walking in place (knee
//!   lifts) becomes forward impulses along a smoothed heading.
//!
//! [`rig`] – [`LocomotionRig`][rig::LocomotionRig] runs both each frame and
//! switches the gait off while any limb grips.  [`effector`] holds the
//! per-limb state.

pub mod climber;
pub mod effector;
pub mod gait;
pub mod rig;

pub use climber::{ClimbReport, Climber};
pub use effector::{Effector, Grip};
pub use gait::{GaitEngine, GaitReport, RecenterGuard};
pub use rig::{FrameReport, LocomotionRig, RigContext};
