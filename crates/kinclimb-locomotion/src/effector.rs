//! Per-limb contact and grip bookkeeping.

use kinclimb_hal::JointSample;
use kinclimb_types::{Limb, SurfaceId, Vec3};

/// A committed attachment of a limb to a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grip {
    pub surface: SurfaceId,
    /// World point on the surface, frozen when the grip was committed.
    pub anchor: Vec3,
}

/// State of one climbing limb.
///
/// The grip and its anchor live in one `Option`, so a gripped effector
/// always knows its surface.
#[derive(Debug, Clone)]
pub struct Effector {
    limb: Limb,
    enabled: bool,
    probe_radius: f32,
    pub(crate) touched: Option<SurfaceId>,
    pub(crate) grip: Option<Grip>,
    /// Seconds continuously touching `touched`.
    pub(crate) dwell: f32,
    /// Seconds since the last touch.
    pub(crate) no_touch: f32,
    pub(crate) current: Option<JointSample>,
    pub(crate) previous: Option<JointSample>,
    pub(crate) just_gripped: bool,
}

impl Effector {
    pub fn new(limb: Limb, enabled: bool, probe_radius: f32) -> Self {
        Self {
            limb,
            enabled,
            probe_radius,
            touched: None,
            grip: None,
            dwell: 0.0,
            no_touch: 0.0,
            current: None,
            previous: None,
            just_gripped: false,
        }
    }

    pub fn limb(&self) -> Limb {
        self.limb
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn probe_radius(&self) -> f32 {
        self.probe_radius
    }

    pub fn is_touching(&self) -> bool {
        self.touched.is_some()
    }

    pub fn touched_surface(&self) -> Option<SurfaceId> {
        self.touched
    }

    pub fn is_gripped(&self) -> bool {
        self.grip.is_some()
    }

    pub fn grip(&self) -> Option<Grip> {
        self.grip
    }

    pub fn anchor(&self) -> Option<Vec3> {
        self.grip.map(|g| g.anchor)
    }

    pub fn dwell_time(&self) -> f32 {
        self.dwell
    }

    pub fn no_touch_time(&self) -> f32 {
        self.no_touch
    }

    /// This frame's reading, if the limb was tracked and within reach.
    pub fn position(&self) -> Option<JointSample> {
        self.current
    }

    /// Sensor-frame motion since the previous frame.
    pub fn gesture_delta(&self) -> Option<Vec3> {
        Some(self.current?.local - self.previous?.local)
    }

    /// Shift readings one frame: `sample` becomes current.
    pub(crate) fn advance(&mut self, sample: Option<JointSample>) {
        self.previous = self.current;
        self.current = sample;
    }

    /// Drop grip, dwell and timers.  Touch bookkeeping is left to the
    /// caller since it owns the notifications.
    pub(crate) fn clear_grip(&mut self) -> Option<Grip> {
        self.dwell = 0.0;
        self.no_touch = 0.0;
        self.just_gripped = false;
        self.grip.take()
    }

    /// Forget everything, including previous readings.
    pub(crate) fn reset(&mut self) {
        self.touched = None;
        self.grip = None;
        self.dwell = 0.0;
        self.no_touch = 0.0;
        self.current = None;
        self.previous = None;
        self.just_gripped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(local: Vec3) -> JointSample {
        JointSample { local, world: local }
    }

    #[test]
    fn gesture_delta_needs_two_readings() {
        let mut e = Effector::new(Limb::LeftHand, true, 0.04);
        assert!(e.gesture_delta().is_none());
        e.advance(Some(sample(Vec3::new(0.0, 1.0, 0.0))));
        assert!(e.gesture_delta().is_none());
        e.advance(Some(sample(Vec3::new(0.1, 1.2, 0.0))));
        let d = e.gesture_delta().unwrap();
        assert!((d - Vec3::new(0.1, 0.2, 0.0)).length() < 1e-6);
        e.advance(None);
        assert!(e.gesture_delta().is_none());
    }

    #[test]
    fn clear_grip_returns_old_grip() {
        let mut e = Effector::new(Limb::RightFoot, true, 0.04);
        e.grip = Some(Grip {
            surface: SurfaceId(3),
            anchor: Vec3::UP,
        });
        e.dwell = 0.5;
        assert!(e.is_gripped());
        assert_eq!(e.anchor(), Some(Vec3::UP));
        let old = e.clear_grip().unwrap();
        assert_eq!(old.surface, SurfaceId(3));
        assert!(!e.is_gripped());
        assert_eq!(e.dwell_time(), 0.0);
    }
}
