//! Gait-impulse locomotion engine.
//!
//! Knee lifts become steps ([`StepDetector`]), accepted steps add
//! `impulse_distance` to a capped budget, and the budget is paid out along
//! the smoothed heading at `impulse_distance / impulse_duration` metres per
//! second.  A constant `gravity · dt` drop is added to every move.
//!
//! The engine needs the hip and both knees.  If any of them (or the user)
//! is missing, all state is dropped and the next frames calibrate again.

use kinclimb_hal::{CharacterBody, SkeletonReader, ViewSource};
use kinclimb_perception::{HeadingInputs, HeadingTracker, StepDetector, StepOutcome};
use kinclimb_types::{GaitConfig, Joint, Side, Vec3};
use tracing::{debug, warn};

// ────────────────────────────────────────────────────────────────────────────
// RecenterGuard
// ────────────────────────────────────────────────────────────────────────────

/// Keeps the body where locomotion last put it.
///
/// Other systems (e.g. a headset rig recentering itself) may teleport the
/// body between frames.  The guard remembers the position after the last
/// locomotion move and restores it when the body ends the frame further
/// away than `threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecenterGuard {
    threshold: f32,
    desired: Option<Vec3>,
}

impl RecenterGuard {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
            desired: None,
        }
    }

    pub fn record(&mut self, position: Vec3) {
        self.desired = Some(position);
    }

    pub fn desired(&self) -> Option<Vec3> {
        self.desired
    }

    pub fn reset(&mut self) {
        self.desired = None;
    }

    /// End-of-frame check.  Returns `true` when the body was snapped back.
    /// Without a recorded position the current one is adopted.
    pub fn enforce(&mut self, body: &mut dyn CharacterBody) -> bool {
        let current = body.position();
        let Some(desired) = self.desired else {
            self.desired = Some(current);
            return false;
        };
        let drift = current.distance(desired);
        if drift > self.threshold {
            debug!(drift, "Body displaced externally; restoring position");
            body.set_position(desired);
            return true;
        }
        false
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GaitEngine
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of one [`GaitEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitReport {
    /// `None` when the engine did not run (disabled or untracked).
    pub step: Option<StepOutcome>,
    pub displacement: Vec3,
    pub grounded: bool,
    pub heading: Option<Vec3>,
}

impl GaitReport {
    fn idle() -> Self {
        Self {
            step: None,
            displacement: Vec3::zero(),
            grounded: false,
            heading: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaitEngine {
    cfg: GaitConfig,
    enabled: bool,
    heading: HeadingTracker,
    steps: StepDetector,
    pending: f32,
    guard: RecenterGuard,
    tracking: bool,
}

impl GaitEngine {
    pub fn new(cfg: GaitConfig) -> Self {
        Self {
            heading: HeadingTracker::new(&cfg),
            steps: StepDetector::new(&cfg),
            guard: RecenterGuard::new(cfg.snap_back_threshold),
            cfg,
            enabled: true,
            pending: 0.0,
            tracking: false,
        }
    }

    pub fn config(&self) -> &GaitConfig {
        &self.cfg
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable impulses.  Re-enabling starts from a clean state,
    /// including a fresh calibration.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        self.reset();
        debug!(enabled, "Gait engine toggled");
    }

    /// Distance still owed to the body.
    pub fn pending_distance(&self) -> f32 {
        self.pending
    }

    pub fn step_detector(&self) -> &StepDetector {
        &self.steps
    }

    pub fn heading(&self) -> Option<Vec3> {
        self.heading.heading()
    }

    pub fn guard(&self) -> &RecenterGuard {
        &self.guard
    }

    pub fn reset(&mut self) {
        self.steps.reset();
        self.heading.reset();
        self.guard.reset();
        self.pending = 0.0;
    }

    /// Run one frame.  `frame` is `None` when no user is tracked.
    pub fn tick(
        &mut self,
        dt: f32,
        frame: Option<&SkeletonReader<'_>>,
        view: Option<&dyn ViewSource>,
        body: &mut dyn CharacterBody,
    ) -> GaitReport {
        if !self.enabled {
            return GaitReport::idle();
        }
        let dt = dt.max(0.0);

        let legs = frame.and_then(|f| {
            Some((
                f.local(Joint::HipCenter)?,
                f.local(Side::Left.knee())?,
                f.local(Side::Right.knee())?,
            ))
        });
        let (Some(frame), Some((hip, knee_left, knee_right))) = (frame, legs) else {
            if self.tracking {
                warn!("Gait lost hip or knee tracking; recalibrating");
            }
            self.tracking = false;
            self.reset();
            return GaitReport::idle();
        };
        self.tracking = true;

        let inputs = HeadingInputs {
            view: view.and_then(|v| v.view_forward()),
            shoulders: frame
                .local(Joint::ShoulderLeft)
                .zip(frame.local(Joint::ShoulderRight)),
            body_forward: body.forward(),
        };
        let heading = self.heading.update(dt, &inputs);
        if let Some(rotation) = self.heading.body_rotation(body.rotation(), dt) {
            body.set_rotation(rotation);
        }

        let step = self.steps.update(dt, hip.y, [knee_left.y, knee_right.y]);
        if step.accepted().is_some() {
            self.pending = (self.pending + self.cfg.impulse_distance).min(self.cfg.max_stacked_distance);
        }

        let mut displacement = Vec3::zero();
        if self.pending > 0.0 && self.cfg.impulse_duration > 0.0 {
            let rate = self.cfg.impulse_distance / self.cfg.impulse_duration;
            let paid = self.pending.min(rate * dt);
            self.pending -= paid;
            displacement += heading * paid;
        }
        displacement.y -= self.cfg.gravity * dt;

        let flags = body.move_by(displacement);
        self.guard.record(body.position());

        GaitReport {
            step: Some(step),
            displacement,
            grounded: flags.grounded(),
            heading: Some(heading),
        }
    }

    /// End-of-frame anti-recentering.  Does nothing while disabled.
    pub fn late_tick(&mut self, body: &mut dyn CharacterBody) -> bool {
        self.enabled && self.guard.enforce(body)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
