//! Knee-lift step detection.
//!
//! Per leg the detector watches `d = max(0, hip_y − knee_y)`, the vertical
//! distance from the hip down to the knee.  A raised knee shrinks `d`.
//!
//! 1. **Warm-up.**  For `calibration_time` seconds the standing distance is
//!    averaged per leg (EMA, seeded by the first sample) and nothing else
//!    happens.
//! 2. **Lift state.**  A leg becomes lifted when `d < threshold` and is
//!    lowered again only once `d ≥ threshold + hysteresis`.  Thresholds are
//!    absolute; the baseline is kept for diagnostics only.
//! 3. **Step.**  Fires when exactly one leg goes from lowered to lifted
//!    while the other is lowered.
//! 4. **Acceptance.**  The time since the previous step event must lie in
//!    `[min_interval, max_interval]`, and with alternation on the side must
//!    differ from the last *accepted* side.  Every step event, accepted or
//!    not, becomes the reference for the next interval.  The first event
//!    after warm-up has no reference and only has to alternate.

use kinclimb_types::{GaitConfig, Side};
use tracing::{debug, info, warn};

/// Why a detected step was not turned into an impulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Closer to the previous step event than `min_step_interval`.
    TooSoon,
    /// Further from the previous step event than `max_step_interval`.
    TooLate,
    /// Same side as the last accepted step while alternation is required.
    SameSide,
}

/// Result of one [`StepDetector::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still inside the warm-up window.
    Calibrating,
    /// No step event this frame.
    Idle,
    Accepted(Side),
    Rejected(Side, RejectReason),
}

impl StepOutcome {
    pub fn accepted(self) -> Option<Side> {
        match self {
            StepOutcome::Accepted(side) => Some(side),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepDetector {
    threshold: f32,
    hysteresis: f32,
    min_interval: f64,
    max_interval: f64,
    require_alternation: bool,
    calibration_time: f32,
    calibration_smoothing: f32,

    clock: f64,
    calibration_elapsed: f32,
    baseline: [Option<f32>; 2],
    calibrated: bool,
    lifted: [bool; 2],
    last_event: Option<f64>,
    last_side: Option<Side>,
}

impl StepDetector {
    pub fn new(cfg: &GaitConfig) -> Self {
        Self {
            threshold: cfg.knee_lift_threshold,
            hysteresis: cfg.hysteresis.max(0.0),
            min_interval: f64::from(cfg.min_step_interval),
            max_interval: f64::from(cfg.max_step_interval),
            require_alternation: cfg.require_alternation,
            calibration_time: cfg.calibration_time.max(0.0),
            calibration_smoothing: cfg.calibration_smoothing.clamp(0.0, 1.0),
            clock: 0.0,
            calibration_elapsed: 0.0,
            baseline: [None; 2],
            calibrated: false,
            lifted: [false; 2],
            last_event: None,
            last_side: None,
        }
    }

    /// Forget calibration and every step; the next frames warm up again.
    pub fn reset(&mut self) {
        self.clock = 0.0;
        self.calibration_elapsed = 0.0;
        self.baseline = [None; 2];
        self.calibrated = false;
        self.lifted = [false; 2];
        self.last_event = None;
        self.last_side = None;
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Standing hip-to-knee distance per leg, `[left, right]`, once the
    /// first sample has been seen.
    pub fn baseline(&self) -> Option<[f32; 2]> {
        match self.baseline {
            [Some(l), Some(r)] => Some([l, r]),
            _ => None,
        }
    }

    pub fn is_lifted(&self, side: Side) -> bool {
        self.lifted[side.index()]
    }

    pub fn last_accepted_side(&self) -> Option<Side> {
        self.last_side
    }

    /// Feed one frame.  `knee_y` is `[left, right]`.
    pub fn update(&mut self, dt: f32, hip_y: f32, knee_y: [f32; 2]) -> StepOutcome {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);
        let d = knee_y.map(|k| (hip_y - k).max(0.0));

        if !self.calibrated {
            self.calibrate(dt, d);
            return StepOutcome::Calibrating;
        }

        let mut newly = [false; 2];
        for side in [Side::Left, Side::Right] {
            let i = side.index();
            if !self.lifted[i] && d[i] < self.threshold {
                self.lifted[i] = true;
                newly[i] = true;
            } else if self.lifted[i] && d[i] >= self.threshold + self.hysteresis {
                self.lifted[i] = false;
            }
        }

        let side = match newly {
            [true, false] if !self.lifted[Side::Right.index()] => Side::Left,
            [false, true] if !self.lifted[Side::Left.index()] => Side::Right,
            _ => return StepOutcome::Idle,
        };
        self.judge(side)
    }

    fn calibrate(&mut self, dt: f32, d: [f32; 2]) {
        let k = self.calibration_smoothing;
        for (base, sample) in self.baseline.iter_mut().zip(d) {
            *base = Some(match *base {
                None => sample,
                Some(b) => b + (sample - b) * k,
            });
        }
        self.calibration_elapsed += dt;
        if self.calibration_elapsed < self.calibration_time {
            return;
        }
        self.calibrated = true;
        let [left, right] = self.baseline().unwrap_or([0.0; 2]);
        info!(baseline_left = left, baseline_right = right, "Gait calibration complete");
        if left.min(right) < self.threshold + self.hysteresis {
            warn!(
                baseline_left = left,
                baseline_right = right,
                threshold = self.threshold,
                "Standing knee distance is inside the lift band; legs will read as lifted"
            );
        }
    }

    fn judge(&mut self, side: Side) -> StepOutcome {
        let interval = self.last_event.map(|t| self.clock - t);
        self.last_event = Some(self.clock);

        let verdict = match interval {
            Some(i) if i < self.min_interval => Err(RejectReason::TooSoon),
            Some(i) if i > self.max_interval => Err(RejectReason::TooLate),
            _ if self.require_alternation && self.last_side == Some(side) => {
                Err(RejectReason::SameSide)
            }
            _ => Ok(()),
        };

        match verdict {
            Ok(()) => {
                self.last_side = Some(side);
                info!(?side, interval = ?interval, "Step accepted");
                StepOutcome::Accepted(side)
            }
            Err(reason) => {
                debug!(?side, ?reason, interval = ?interval, "Step rejected");
                StepOutcome::Rejected(side, reason)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
