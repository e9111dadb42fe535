//! Frame driver that runs both engines in a fixed order.
//!
//! ```text
//! tick(dt):   find user ─► Climber::tick ─► gait enabled = !any grip ─► GaitEngine::tick
//! late_tick:  anti-recentering (gait only)
//! ```
//!
//! Collaborators are handed in per call through a [`RigContext`]; the rig
//! keeps no references between frames.
//!
//! # Example
//!
//! ```rust
//! use kinclimb_hal::sim::{SimBody, SimSkeleton, SimSurfaces};
//! use kinclimb_locomotion::{LocomotionRig, RigContext};
//! use kinclimb_types::{RigConfig, Vec3};
//!
//! let mut rig = LocomotionRig::new(RigConfig::default()).unwrap();
//! let skeleton = SimSkeleton::new(0);
//! let mut surfaces = SimSurfaces::new();
//! let mut body = SimBody::new(Vec3::new(0.0, 1.0, 0.0)).with_floor(0.0);
//!
//! let mut ctx = RigContext {
//!     skeleton: &skeleton,
//!     surfaces: &mut surfaces,
//!     body: &mut body,
//!     view: None,
//! };
//! let report = rig.tick(0.05, &mut ctx);
//! assert!(report.user.is_none());
//! assert!(report.displacement.y < 0.0);
//! ```

use kinclimb_hal::{
    CharacterBody, SkeletonReader, SkeletonSource, Surfaces, ViewSource, first_tracked_user,
};
use kinclimb_perception::StepOutcome;
use kinclimb_types::{KinError, RigConfig, SensorMount, UserId, Vec3};
use tracing::{info, warn};

use crate::climber::Climber;
use crate::gait::GaitEngine;

/// Collaborators for one frame.
pub struct RigContext<'a> {
    pub skeleton: &'a dyn SkeletonSource,
    pub surfaces: &'a mut dyn Surfaces,
    pub body: &'a mut dyn CharacterBody,
    pub view: Option<&'a dyn ViewSource>,
}

/// What happened during one [`LocomotionRig::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub user: Option<UserId>,
    pub grips: usize,
    /// The climbing engine held at least one grip, so the gait was off.
    pub climbing: bool,
    /// Total displacement requested from the body by both engines.
    pub displacement: Vec3,
    pub step: Option<StepOutcome>,
    pub grounded: bool,
}

impl FrameReport {
    fn inactive() -> Self {
        Self {
            user: None,
            grips: 0,
            climbing: false,
            displacement: Vec3::zero(),
            step: None,
            grounded: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocomotionRig {
    climber: Climber,
    gait: GaitEngine,
    mount: SensorMount,
    active: bool,
    user: Option<UserId>,
}

impl LocomotionRig {
    /// Build an active rig after validating `cfg`.
    pub fn new(cfg: RigConfig) -> Result<Self, KinError> {
        cfg.validate()?;
        let RigConfig { climb, gait, mount } = cfg;
        Ok(Self {
            climber: Climber::new(climb),
            gait: GaitEngine::new(gait),
            mount,
            active: true,
            user: None,
        })
    }

    pub fn climber(&self) -> &Climber {
        &self.climber
    }

    pub fn gait(&self) -> &GaitEngine {
        &self.gait
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    /// Resume ticking.  Both engines start from empty state.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.gait.reset();
        info!("Locomotion rig activated");
    }

    /// Stop ticking, force-releasing every grip and touch.
    pub fn deactivate(&mut self, surfaces: &mut dyn Surfaces) {
        if !self.active {
            return;
        }
        self.climber.release_all(surfaces);
        self.gait.reset();
        self.active = false;
        self.user = None;
        info!("Locomotion rig deactivated");
    }

    pub fn tick(&mut self, dt: f32, ctx: &mut RigContext<'_>) -> FrameReport {
        if !self.active {
            return FrameReport::inactive();
        }

        let user = first_tracked_user(ctx.skeleton);
        if user != self.user {
            match user {
                Some(id) => info!(user = %id, "Tracking user"),
                None => warn!("No tracked user"),
            }
            self.user = user;
        }

        let pose = ctx.body.pose();
        let reader = user.map(|id| SkeletonReader::new(ctx.skeleton, id, &self.mount, pose));

        let climb = self
            .climber
            .tick(dt, reader.as_ref(), &mut *ctx.surfaces, &mut *ctx.body);

        self.gait.set_enabled(!self.climber.any_grip());
        let gait = self.gait.tick(dt, reader.as_ref(), ctx.view, &mut *ctx.body);

        FrameReport {
            user,
            grips: climb.grips,
            climbing: climb.grips > 0,
            displacement: climb.displacement + gait.displacement,
            step: gait.step,
            grounded: climb.grounded || gait.grounded,
        }
    }

    /// End-of-frame phase, after other systems had their turn.  Returns
    /// `true` when the body was snapped back.
    pub fn late_tick(&mut self, body: &mut dyn CharacterBody) -> bool {
        self.active && self.gait.late_tick(body)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use kinclimb_hal::sim::{SimBody, SimSkeleton, SimSurfaces};
    use kinclimb_types::{Joint, Limb, SurfaceId};

    const DT: f32 = 0.05;
    const HAND: Vec3 = Vec3::new(-0.2, 1.2, 0.1);

    fn config() -> RigConfig {
        RigConfig {
            mount: SensorMount {
                flip_z: false,
                offset: Vec3::zero(),
                follow_body: false,
            },
            ..RigConfig::default()
        }
    }

    struct Scene {
        skeleton: SimSkeleton,
        surfaces: SimSurfaces,
        body: SimBody,
        hold: SurfaceId,
    }

    impl Scene {
        fn new() -> Self {
            let skeleton = SimSkeleton::new(1)
                .with_joint(Joint::HipCenter, Vec3::new(0.0, 1.0, 0.0))
                .with_joint(Joint::KneeLeft, Vec3::new(-0.1, 0.5, 0.0))
                .with_joint(Joint::KneeRight, Vec3::new(0.1, 0.5, 0.0));
            let mut surfaces = SimSurfaces::new();
            let hold = surfaces.add_hold(HAND + Vec3::new(0.0, 0.0, 0.02), 0.05);
            Self {
                skeleton,
                surfaces,
                body: SimBody::new(Vec3::zero()).with_floor(0.0),
                hold,
            }
        }

        fn tick(&mut self, rig: &mut LocomotionRig) -> FrameReport {
            let mut ctx = RigContext {
                skeleton: &self.skeleton,
                surfaces: &mut self.surfaces,
                body: &mut self.body,
                view: None,
            };
            rig.tick(DT, &mut ctx)
        }

        fn run(&mut self, rig: &mut LocomotionRig, frames: usize) -> FrameReport {
            let mut last = self.tick(rig);
            for _ in 1..frames {
                last = self.tick(rig);
            }
            last
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = config();
        cfg.climb.damping = 2.0;
        assert!(matches!(
            LocomotionRig::new(cfg),
            Err(KinError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn grip_switches_gait_off_and_release_back_on() {
        let mut scene = Scene::new();
        let mut rig = LocomotionRig::new(config()).unwrap();

        let report = scene.run(&mut rig, 20);
        assert_eq!(report.user.map(UserId::get), Some(1));
        assert!(!report.climbing);
        assert!(rig.gait().is_enabled());
        assert!(rig.gait().step_detector().is_calibrated());

        scene.skeleton.set_joint(Limb::LeftHand.joint(), HAND);
        let report = scene.run(&mut rig, 6);
        assert!(report.climbing);
        assert_eq!(report.step, None);
        assert!(!rig.gait().is_enabled());

        rig.deactivate(&mut scene.surfaces);
        assert_eq!(scene.surfaces.feedback(scene.hold).unwrap().grips_ended(), 1);
        rig.activate();
        scene.skeleton.clear_joint(Limb::LeftHand.joint());
        let report = scene.tick(&mut rig);
        assert!(!report.climbing);
        assert!(rig.gait().is_enabled());
        assert_eq!(report.step, Some(StepOutcome::Calibrating));
    }

    #[test]
    fn inactive_rig_does_nothing() {
        let mut scene = Scene::new();
        let mut rig = LocomotionRig::new(config()).unwrap();
        rig.deactivate(&mut scene.surfaces);
        assert!(!rig.is_active());

        let report = scene.run(&mut rig, 5);
        assert_eq!(report, FrameReport::inactive());
        assert!(scene.body.moves().is_empty());
        assert!(!rig.late_tick(&mut scene.body));
    }

    #[test]
    fn lost_user_falls_under_gravity() {
        let mut scene = Scene::new();
        scene.body = SimBody::new(Vec3::new(0.0, 2.0, 0.0));
        scene.skeleton.set_user(0);
        let mut rig = LocomotionRig::new(config()).unwrap();

        let report = scene.tick(&mut rig);
        assert!(report.user.is_none());
        assert_eq!(report.step, None);
        assert!(report.displacement.y < 0.0);
        assert!(scene.body.position().y < 2.0);
    }

    #[test]
    fn late_tick_restores_walking_position() {
        let mut scene = Scene::new();
        let mut rig = LocomotionRig::new(config()).unwrap();
        scene.run(&mut rig, 3);

        scene.body.set_position(Vec3::new(5.0, 0.0, 5.0));
        assert!(rig.late_tick(&mut scene.body));
        assert_eq!(scene.body.position(), Vec3::zero());
        assert!(!rig.late_tick(&mut scene.body));
    }

    #[test]
    fn late_tick_ignored_while_climbing() {
        let mut scene = Scene::new();
        let mut rig = LocomotionRig::new(config()).unwrap();
        scene.skeleton.set_joint(Limb::LeftHand.joint(), HAND);
        let report = scene.run(&mut rig, 8);
        assert!(report.climbing);

        scene.body.set_position(Vec3::new(5.0, 0.0, 5.0));
        assert!(!rig.late_tick(&mut scene.body));
        assert_eq!(scene.body.position(), Vec3::new(5.0, 0.0, 5.0));
    }
}
