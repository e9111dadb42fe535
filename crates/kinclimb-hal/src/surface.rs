//! Spatial query and feedback seam for climbable geometry.
//!
//! The climbing engine asks one question per limb per frame: "which
//! climbable surface is inside this probe sphere?".  [`Surfaces`] answers
//! with an ordered overlap list plus per-surface layer and tag lookups; the
//! provided [`Surfaces::first_match`] applies a [`SurfaceClassifier`] and
//! takes the first accepted handle.
//!
//! Surfaces may carry a [`SurfaceFeedback`] object (glow, sound, logs).  A
//! surface without one is simply skipped by [`notify`].

use kinclimb_types::{SurfaceClassifier, SurfaceId, Vec3};

/// Receiver of contact notifications on one climbable surface.
///
/// The climbing engine calls each method at most once per actual state
/// transition of one limb.
pub trait SurfaceFeedback {
    /// A limb started (`true`) or stopped (`false`) touching this surface.
    fn on_touch_changed(&mut self, touching: bool);
    /// A limb committed a grip on this surface.
    fn on_grip_start(&mut self);
    /// A limb released its grip on this surface.
    fn on_grip_end(&mut self);
}

/// Spatial backend holding the climbable geometry.
pub trait Surfaces {
    /// Every surface overlapping the sphere, in backend order.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<SurfaceId>;

    /// Collision layer of `id` (0..=31).
    fn layer(&self, id: SurfaceId) -> u8;

    /// Whether `id` carries `tag`.
    fn has_tag(&self, id: SurfaceId, tag: &str) -> bool;

    /// Point on `id` closest to `point` (the point itself when inside).
    fn closest_point(&self, id: SurfaceId, point: Vec3) -> Vec3;

    /// Feedback object attached to `id`, if any.
    fn feedback_mut(&mut self, _id: SurfaceId) -> Option<&mut dyn SurfaceFeedback> {
        None
    }

    /// First overlapping surface accepted by `classifier`.
    fn first_match(
        &self,
        center: Vec3,
        radius: f32,
        classifier: &SurfaceClassifier,
    ) -> Option<SurfaceId> {
        self.overlap_sphere(center, radius)
            .into_iter()
            .find(|&id| classifier.accepts(self.layer(id), |tag| self.has_tag(id, tag)))
    }
}

/// A contact transition to report to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Touched,
    Untouched,
    GripStarted,
    GripEnded,
}

/// Deliver `event` to the feedback object of `id`.  Surfaces without a
/// feedback object are skipped.
pub fn notify(surfaces: &mut dyn Surfaces, id: SurfaceId, event: SurfaceEvent) {
    let Some(feedback) = surfaces.feedback_mut(id) else {
        return;
    };
    match event {
        SurfaceEvent::Touched => feedback.on_touch_changed(true),
        SurfaceEvent::Untouched => feedback.on_touch_changed(false),
        SurfaceEvent::GripStarted => feedback.on_grip_start(),
        SurfaceEvent::GripEnded => feedback.on_grip_end(),
    }
}
