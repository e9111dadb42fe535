//! Limb-anchored climbing engine.
//!
//! Every frame, per enabled limb:
//!
//! ```text
//! untracked / out of reach ──► not touching (grip dropped unless latched)
//! probe hit, same surface  ──► dwell += dt ── dwell ≥ hold ──► GRIP (latch)
//! probe hit, new surface   ──► dwell = 0
//! no hit                   ──► dwell = 0, no_touch += dt ── ≥ timeout ──► release
//! ```
//!
//! Then the body moves.  With at least one grip: the weighted mean pull
//! toward the anchors plus step-up and lateral gestures of the free limbs,
//! passed through the [`JitterFilter`], plus a small push toward the wall.
//! Without grips: gravity only.  Finally, non-latched grips whose limb
//! strayed further than `release_distance` from the anchor are dropped.
//!
//! The latch is the most recently gripped limb.  No automatic rule releases
//! it; only [`Climber::force_release`] and [`Climber::release_all`] do.

use kinclimb_hal::{
    CharacterBody, JointSample, SkeletonReader, SurfaceEvent, Surfaces, notify,
};
use kinclimb_perception::JitterFilter;
use kinclimb_types::{
    ClimbConfig, CollisionFlags, Joint, Limb, SurfaceClassifier, Vec3,
};
use tracing::{debug, info, warn};

use crate::effector::{Effector, Grip};

/// Bounds applied to `pull_gain` before use.
const PULL_GAIN_RANGE: (f32, f32) = (0.05, 2.0);

/// Outcome of one [`Climber::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbReport {
    /// A user and frame were available.
    pub tracking: bool,
    /// Limbs gripping after the frame.
    pub grips: usize,
    /// Sum of every displacement committed this frame.
    pub displacement: Vec3,
    pub grounded: bool,
}

#[derive(Debug, Clone)]
pub struct Climber {
    cfg: ClimbConfig,
    classifier: SurfaceClassifier,
    effectors: [Effector; 4],
    latched: Option<Limb>,
    jitter: JitterFilter,
    vertical_velocity: f32,
    hip_local: Option<Vec3>,
    tracking: bool,
}

impl Climber {
    pub fn new(cfg: ClimbConfig) -> Self {
        let effectors = Limb::ALL.map(|limb| {
            let (enabled, radius) = if limb.is_hand() {
                (cfg.use_hands, cfg.hand_probe_radius)
            } else {
                (cfg.use_feet, cfg.foot_probe_radius)
            };
            Effector::new(limb, enabled, radius)
        });
        Self {
            classifier: cfg.classifier(),
            jitter: JitterFilter::from_config(&cfg),
            cfg,
            effectors,
            latched: None,
            vertical_velocity: 0.0,
            hip_local: None,
            tracking: false,
        }
    }

    pub fn config(&self) -> &ClimbConfig {
        &self.cfg
    }

    pub fn effector(&self, limb: Limb) -> &Effector {
        &self.effectors[limb.index()]
    }

    pub fn effectors(&self) -> &[Effector] {
        &self.effectors
    }

    /// The limb no automatic rule may release.
    pub fn latched(&self) -> Option<Limb> {
        self.latched
    }

    pub fn grip_count(&self) -> usize {
        self.effectors.iter().filter(|e| e.is_gripped()).count()
    }

    pub fn any_grip(&self) -> bool {
        self.effectors.iter().any(Effector::is_gripped)
    }

    /// Free-fall speed (m/s, negative downward).
    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Last filtered climbing displacement, without the wall push.
    pub fn last_applied_delta(&self) -> Vec3 {
        self.jitter.last()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Frame
    // ────────────────────────────────────────────────────────────────────────

    /// Run one frame.  `frame` is `None` when no user is tracked.
    pub fn tick(
        &mut self,
        dt: f32,
        frame: Option<&SkeletonReader<'_>>,
        surfaces: &mut dyn Surfaces,
        body: &mut dyn CharacterBody,
    ) -> ClimbReport {
        let dt = dt.max(0.0);

        let Some(frame) = frame else {
            if self.tracking {
                warn!("Climber lost tracking; releasing every grip");
            }
            self.tracking = false;
            self.release_all(surfaces);
            let (moved, flags) = self.free_fall(dt, body);
            return ClimbReport {
                tracking: false,
                grips: 0,
                displacement: moved,
                grounded: flags.grounded(),
            };
        };
        self.tracking = true;

        let hip = frame.sample(Joint::HipCenter);
        for limb in Limb::ALL {
            if self.effectors[limb.index()].is_enabled() {
                let sample = frame.sample(limb.joint());
                self.update_effector(limb, sample, hip.map(|h| h.world), dt, surfaces);
            }
        }

        let hip_delta = match (hip, self.hip_local) {
            (Some(now), Some(before)) => Some(frame.direction_to_world(now.local - before)),
            _ => None,
        };
        self.hip_local = hip.map(|h| h.local);

        let grips = self.grip_count();
        let mut displacement = Vec3::zero();
        let flags = if grips > 0 {
            if let Some(snap) = self.snap_delta().filter(|_| self.cfg.snap_on_grip) {
                body.move_by(snap);
                displacement += snap;
            }

            let right = body.right();
            let raw = self.anchor_pull() + self.gesture_motion(grips, frame, hip_delta, right);
            let filtered = self.jitter.apply(raw);
            let delta = filtered + body.forward() * self.cfg.wall_snap;
            self.vertical_velocity = 0.0;
            displacement += delta;
            body.move_by(delta)
        } else {
            self.jitter.reset();
            let (moved, flags) = self.free_fall(dt, body);
            displacement += moved;
            flags
        };

        self.release_strayed(surfaces);
        for e in &mut self.effectors {
            e.just_gripped = false;
        }

        ClimbReport {
            tracking: true,
            grips: self.grip_count(),
            displacement,
            grounded: flags.grounded(),
        }
    }

    /// Contact, dwell and grip transitions of one limb.
    ///
    /// `sample` is `None` when the joint is untracked; `hip` is the hip's
    /// world position, and the reach check is skipped without it.
    pub fn update_effector(
        &mut self,
        limb: Limb,
        sample: Option<JointSample>,
        hip: Option<Vec3>,
        dt: f32,
        surfaces: &mut dyn Surfaces,
    ) {
        let max_reach = self.cfg.max_reach_from_hip;
        let reachable =
            sample.filter(|s| hip.is_none_or(|h| s.world.distance(h) <= max_reach));

        let e = &mut self.effectors[limb.index()];
        e.advance(reachable);

        let candidate = reachable
            .and_then(|s| surfaces.first_match(s.world, e.probe_radius(), &self.classifier));

        let previous = e.touched;
        if candidate != previous {
            if let Some(old) = previous {
                notify(surfaces, old, SurfaceEvent::Untouched);
            }
            if let Some(new) = candidate {
                notify(surfaces, new, SurfaceEvent::Touched);
            }
            debug!(%limb, from = ?previous, to = ?candidate, "Touch changed");
            e.touched = candidate;
        }

        let latched = self.latched == Some(limb);
        match (candidate, reachable) {
            (Some(surface), Some(at)) => {
                e.no_touch = 0.0;
                e.dwell = if previous == Some(surface) { e.dwell + dt } else { 0.0 };

                if e.grip.is_none() && e.dwell >= self.cfg.required_hold_time {
                    let anchor = surfaces.closest_point(surface, at.world);
                    e.grip = Some(Grip { surface, anchor });
                    e.just_gripped = true;
                    notify(surfaces, surface, SurfaceEvent::GripStarted);
                    info!(%limb, %surface, dwell = e.dwell, "Grip started");
                    match self.latched.replace(limb) {
                        Some(old) if old != limb => {
                            debug!(from = %old, to = %limb, "Latch moved");
                        }
                        _ => {}
                    }
                }
            }
            _ => {
                e.dwell = 0.0;
                e.no_touch += dt;
                if e.grip.is_some() && !latched {
                    if reachable.is_none() {
                        self.release(limb, surfaces, "out of reach");
                    } else if e.no_touch >= self.cfg.notouch_release_time {
                        self.release(limb, surfaces, "no touch");
                    }
                }
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Releases
    // ────────────────────────────────────────────────────────────────────────

    /// Release `limb` regardless of the latch, clearing the latch if it was
    /// held by this limb.
    pub fn force_release(&mut self, limb: Limb, surfaces: &mut dyn Surfaces) {
        self.release(limb, surfaces, "forced");
    }

    /// Drop every grip and touch, clear the latch and the smoothing state.
    /// Used on tracking loss and deactivation.
    pub fn release_all(&mut self, surfaces: &mut dyn Surfaces) {
        for limb in Limb::ALL {
            self.force_release(limb, surfaces);
            let e = &mut self.effectors[limb.index()];
            if let Some(surface) = e.touched {
                notify(surfaces, surface, SurfaceEvent::Untouched);
            }
            e.reset();
        }
        self.latched = None;
        self.jitter.reset();
        self.hip_local = None;
    }

    fn release(&mut self, limb: Limb, surfaces: &mut dyn Surfaces, reason: &str) {
        if let Some(grip) = self.effectors[limb.index()].clear_grip() {
            notify(surfaces, grip.surface, SurfaceEvent::GripEnded);
            info!(%limb, surface = %grip.surface, reason, "Grip released");
        }
        if self.latched == Some(limb) {
            self.latched = None;
        }
    }

    /// Distance release, run after the frame's move.  Skips the latched limb
    /// and limbs that gripped this frame.
    fn release_strayed(&mut self, surfaces: &mut dyn Surfaces) {
        let limit = self.cfg.release_distance;
        let strayed: Vec<Limb> = self
            .effectors
            .iter()
            .filter(|e| self.latched != Some(e.limb()) && !e.just_gripped)
            .filter(|e| match (e.grip, e.current) {
                (Some(grip), Some(at)) => at.world.distance(grip.anchor) > limit,
                _ => false,
            })
            .map(Effector::limb)
            .collect();
        for limb in strayed {
            self.release(limb, surfaces, "anchor distance");
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Motion terms
    // ────────────────────────────────────────────────────────────────────────

    fn weight(&self, limb: Limb) -> f32 {
        if self.latched == Some(limb) {
            self.cfg.primary_anchor_weight
        } else {
            1.0
        }
    }

    /// Weighted mean of `anchor − position` over gripped limbs, with the
    /// upward bonus and the pull gain applied.
    fn anchor_pull(&self) -> Vec3 {
        let mut sum = Vec3::zero();
        let mut total = 0.0;
        for e in &self.effectors {
            if let (Some(grip), Some(at)) = (e.grip, e.current) {
                let w = self.weight(e.limb());
                sum += (grip.anchor - at.world) * w;
                total += w;
            }
        }
        if total <= 0.0 {
            return Vec3::zero();
        }
        let mut pull = sum / total;
        pull.y *= 1.0 + self.cfg.climb_up_bonus;
        pull * self.cfg.pull_gain.clamp(PULL_GAIN_RANGE.0, PULL_GAIN_RANGE.1)
    }

    /// Step-up and lateral gestures of the free limbs, plus hip sway.
    fn gesture_motion(
        &self,
        grips: usize,
        frame: &SkeletonReader<'_>,
        hip_delta: Option<Vec3>,
        right: Vec3,
    ) -> Vec3 {
        let needed = self.cfg.min_grips_to_climb.max(1) as usize;
        if grips < needed {
            return Vec3::zero();
        }
        let cfg = &self.cfg;
        let max_side = cfg.lateral_max_per_frame;

        let mut up = 0.0;
        let mut side = 0.0;
        for e in self.effectors.iter().filter(|e| e.is_enabled() && !e.is_gripped()) {
            let Some(delta) = e.gesture_delta() else {
                continue;
            };
            let primary = self.latched == Some(e.limb());
            let (up_mul, side_mul) = if primary {
                (cfg.primary_step_up_mul, cfg.primary_lateral_mul)
            } else {
                (1.0, 1.0)
            };

            up += (delta.y - cfg.min_up_delta).max(0.0) * cfg.step_up_gain * up_mul;

            let along = frame.direction_to_world(delta).dot(right);
            if along.abs() > cfg.min_side_delta {
                side += (along * cfg.lateral_gain * side_mul).clamp(-max_side, max_side);
            }
        }
        if let Some(hip) = hip_delta {
            side += (hip.dot(right) * cfg.hip_lateral_gain).clamp(-max_side, max_side);
        }

        Vec3::UP * up + right * side
    }

    /// Mean `anchor − position` over limbs that gripped this frame.
    fn snap_delta(&self) -> Option<Vec3> {
        let offsets: Vec<Vec3> = self
            .effectors
            .iter()
            .filter(|e| e.just_gripped)
            .filter_map(|e| Some(e.anchor()? - e.current?.world))
            .collect();
        if offsets.is_empty() {
            return None;
        }
        let sum = offsets.iter().fold(Vec3::zero(), |acc, &v| acc + v);
        Some(sum / offsets.len() as f32)
    }

    fn free_fall(&mut self, dt: f32, body: &mut dyn CharacterBody) -> (Vec3, CollisionFlags) {
        self.vertical_velocity -= self.cfg.gravity_when_free.abs() * dt;
        let step = Vec3::new(0.0, self.vertical_velocity * dt, 0.0);
        let flags = body.move_by(step);
        if flags.below {
            self.vertical_velocity = 0.0;
        }
        (step, flags)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
