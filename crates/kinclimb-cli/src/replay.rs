//! Headless session replay.
//!
//! A session file is JSON: the frame step, the simulated wall (spherical
//! holds and box panels), where the body starts, and one joint map per
//! frame.  Joint names are snake_case (`hip_center`, `hand_left`, ...).
//!
//! ```json
//! {
//!   "dt": 0.033,
//!   "body": { "position": { "x": 0.0, "y": 0.0, "z": 0.0 }, "floor": 0.0 },
//!   "holds": [ { "center": { "x": -0.2, "y": 1.2, "z": 0.12 }, "radius": 0.05 } ],
//!   "frames": [
//!     { "joints": { "hip_center": { "x": 0.0, "y": 1.0, "z": 0.0 } } },
//!     { "user": 0, "joints": {} }
//!   ]
//! }
//! ```
//!
//! A per-frame `user` overrides the session user; `0` simulates tracking
//! loss for that frame.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;
use kinclimb_hal::sim::{SimBody, SimSkeleton, SimSurfaces, SimView};
use kinclimb_hal::{CharacterBody, ViewSource};
use kinclimb_locomotion::{FrameReport, LocomotionRig, RigContext};
use kinclimb_perception::StepOutcome;
use kinclimb_types::{Joint, KinError, Quaternion, RigConfig, SurfaceId, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Session file
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default = "default_user")]
    pub user: u32,
    #[serde(default)]
    pub body: BodyStart,
    #[serde(default)]
    pub holds: Vec<HoldSpec>,
    #[serde(default)]
    pub panels: Vec<PanelSpec>,
    /// Camera look direction, for the `view_direction` heading mode.
    #[serde(default)]
    pub view_forward: Option<Vec3>,
    pub frames: Vec<SessionFrame>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BodyStart {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub yaw_degrees: f32,
    /// Height of an infinite floor plane, if any.
    #[serde(default)]
    pub floor: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoldSpec {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelSpec {
    pub min: Vec3,
    pub max: Vec3,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFrame {
    #[serde(default)]
    pub user: Option<u32>,
    #[serde(default)]
    pub joints: HashMap<Joint, Vec3>,
}

fn default_dt() -> f32 {
    1.0 / 30.0
}

fn default_user() -> u32 {
    1
}

impl Session {
    pub fn from_json(raw: &str) -> Result<Self, KinError> {
        let session: Session = serde_json::from_str(raw)
            .map_err(|e| KinError::Serialization(format!("Failed to parse session: {}", e)))?;
        session.validate()?;
        Ok(session)
    }

    pub fn load(path: &Path) -> Result<Self, KinError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            KinError::Io(format!("Failed to read session at {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), KinError> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(KinError::Recording(format!("dt must be > 0, got {}", self.dt)));
        }
        if self.frames.is_empty() {
            return Err(KinError::Recording("session has no frames".into()));
        }
        if let Some(hold) = self.holds.iter().find(|h| !(h.radius >= 0.0)) {
            return Err(KinError::Recording(format!(
                "hold radius must be >= 0, got {}",
                hold.radius
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

/// Aggregate outcome of one replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub frames: usize,
    pub duration: f32,
    pub tracked_frames: usize,
    pub climbing_frames: usize,
    pub max_grips: usize,
    pub grips_started: u32,
    pub steps_accepted: usize,
    pub steps_rejected: usize,
    pub snap_backs: usize,
    pub start: Vec3,
    pub end: Vec3,
}

impl ReplaySummary {
    fn new(start: Vec3) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            frames: 0,
            duration: 0.0,
            tracked_frames: 0,
            climbing_frames: 0,
            max_grips: 0,
            grips_started: 0,
            steps_accepted: 0,
            steps_rejected: 0,
            snap_backs: 0,
            start,
            end: start,
        }
    }

    fn record(&mut self, dt: f32, report: &FrameReport) {
        self.frames += 1;
        self.duration += dt;
        if report.user.is_some() {
            self.tracked_frames += 1;
        }
        if report.climbing {
            self.climbing_frames += 1;
        }
        self.max_grips = self.max_grips.max(report.grips);
        match report.step {
            Some(StepOutcome::Accepted(_)) => self.steps_accepted += 1,
            Some(StepOutcome::Rejected(..)) => self.steps_rejected += 1,
            _ => {}
        }
    }

    pub fn travelled(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn print(&self) {
        println!();
        println!("  {} {}", "Session".bold(), self.session_id.to_string().dimmed());
        println!("  Started   {}", self.started_at.to_rfc3339().dimmed());
        println!(
            "  Frames    {} ({:.2} s, {} tracked)",
            self.frames.to_string().bold(),
            self.duration,
            self.tracked_frames
        );
        println!(
            "  Climbing  {} frame(s), {} grip(s) started, up to {} limb(s) at once",
            self.climbing_frames.to_string().bold(),
            self.grips_started,
            self.max_grips
        );
        println!(
            "  Steps     {} accepted, {} rejected",
            self.steps_accepted.to_string().green().bold(),
            self.steps_rejected.to_string().yellow()
        );
        if self.snap_backs > 0 {
            println!("  Snap-backs {}", self.snap_backs.to_string().yellow());
        }
        let d = self.travelled();
        println!(
            "  Body      ({:.3}, {:.3}, {:.3}) -> ({:.3}, {:.3}, {:.3})  [{} {:.3}]",
            self.start.x,
            self.start.y,
            self.start.z,
            self.end.x,
            self.end.y,
            self.end.z,
            "moved".dimmed(),
            d.length()
        );
        println!();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Replay
// ────────────────────────────────────────────────────────────────────────────

/// Drive a fresh rig over every frame of `session`.
pub fn replay(session: &Session, cfg: RigConfig) -> Result<ReplaySummary, KinError> {
    let mut rig = LocomotionRig::new(cfg)?;

    let mut skeleton = SimSkeleton::new(session.user);
    let mut surfaces = SimSurfaces::new();
    for hold in &session.holds {
        surfaces.add_hold(hold.center, hold.radius);
    }
    for panel in &session.panels {
        surfaces.add_panel(panel.min, panel.max);
    }

    let yaw = Quaternion::from_axis_angle(Vec3::UP, session.body.yaw_degrees.to_radians());
    let mut body = SimBody::new(session.body.position).with_rotation(yaw);
    if let Some(y) = session.body.floor {
        body = body.with_floor(y);
    }
    let view = session.view_forward.map(|forward| SimView {
        forward: Some(forward),
    });

    let mut summary = ReplaySummary::new(body.position());
    info!(
        session = %summary.session_id,
        frames = session.frames.len(),
        holds = session.holds.len(),
        panels = session.panels.len(),
        "Replay started"
    );

    for (index, frame) in session.frames.iter().enumerate() {
        skeleton.clear_all();
        skeleton.set_user(frame.user.unwrap_or(session.user));
        for (&joint, &position) in &frame.joints {
            skeleton.set_joint(joint, position);
        }

        let report = {
            let mut ctx = RigContext {
                skeleton: &skeleton,
                surfaces: &mut surfaces,
                body: &mut body,
                view: view.as_ref().map(|v| v as &dyn ViewSource),
            };
            rig.tick(session.dt, &mut ctx)
        };
        if rig.late_tick(&mut body) {
            summary.snap_backs += 1;
        }
        debug!(frame = index, grips = report.grips, step = ?report.step, "Frame replayed");
        summary.record(session.dt, &report);
    }

    rig.deactivate(&mut surfaces);
    summary.grips_started = (1..=surfaces.len() as u64)
        .filter_map(|id| surfaces.feedback(SurfaceId(id)))
        .map(|f| f.grips_started())
        .sum();
    summary.end = body.position();
    info!(
        session = %summary.session_id,
        steps = summary.steps_accepted,
        grips = summary.grips_started,
        "Replay finished"
    );
    Ok(summary)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
