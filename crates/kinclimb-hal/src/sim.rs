//! In-process simulation of every collaborator, for headless tests and
//! session replay without a game engine or a sensor.
//!
//! # Example
//!
//! ```rust
//! use kinclimb_hal::sim::{SimBody, SimSurfaces};
//! use kinclimb_hal::{CharacterBody, Surfaces};
//! use kinclimb_types::{SurfaceClassifier, Vec3};
//!
//! let wall = SimSurfaces::new().with_hold(Vec3::new(0.0, 1.5, 0.5), 0.05);
//! let tag = SurfaceClassifier::Tagged("Scalable".into());
//! assert!(wall.first_match(Vec3::new(0.0, 1.5, 0.44), 0.04, &tag).is_some());
//!
//! let mut body = SimBody::new(Vec3::new(0.0, 0.2, 0.0)).with_floor(0.0);
//! let flags = body.move_by(Vec3::new(0.0, -1.0, 0.0));
//! assert!(flags.below);
//! assert_eq!(body.position().y, 0.0);
//! ```

use kinclimb_types::{CollisionFlags, Joint, Quaternion, SurfaceId, UserId, Vec3};

use crate::body::CharacterBody;
use crate::feedback::GripFeedback;
use crate::skeleton::SkeletonSource;
use crate::surface::{SurfaceFeedback, Surfaces};
use crate::view::ViewSource;

/// Tag given to surfaces created through the `*_hold` helpers.
pub const DEFAULT_TAG: &str = "Scalable";

// ────────────────────────────────────────────────────────────────────────────
// Skeleton
// ────────────────────────────────────────────────────────────────────────────

/// A single-user skeleton whose joints are set directly.
///
/// Only exposes the by-index and count discovery capabilities, like the
/// simplest sensor SDKs.  A joint without a position is untracked.
#[derive(Debug, Clone, Default)]
pub struct SimSkeleton {
    user: u32,
    joints: [Option<Vec3>; Joint::COUNT],
}

impl SimSkeleton {
    /// Skeleton for raw user id `user` (`0` = nobody in view).
    pub fn new(user: u32) -> Self {
        Self {
            user,
            joints: [None; Joint::COUNT],
        }
    }

    pub fn with_joint(mut self, joint: Joint, position: Vec3) -> Self {
        self.set_joint(joint, position);
        self
    }

    pub fn set_user(&mut self, user: u32) {
        self.user = user;
    }

    pub fn set_joint(&mut self, joint: Joint, position: Vec3) {
        self.joints[joint.index()] = Some(position);
    }

    /// Mark `joint` as untracked.
    pub fn clear_joint(&mut self, joint: Joint) {
        self.joints[joint.index()] = None;
    }

    pub fn clear_all(&mut self) {
        self.joints = [None; Joint::COUNT];
    }

    pub fn joint(&self, joint: Joint) -> Option<Vec3> {
        self.joints[joint.index()]
    }
}

impl SkeletonSource for SimSkeleton {
    fn is_joint_tracked(&self, user: UserId, joint: Joint) -> bool {
        user.get() == self.user && self.joints[joint.index()].is_some()
    }

    fn joint_position(&self, _user: UserId, joint: Joint) -> Vec3 {
        self.joints[joint.index()].unwrap_or_default()
    }

    fn user_id_by_index(&self, index: usize) -> Option<u32> {
        Some(if index == 0 { self.user } else { 0 })
    }

    fn user_count(&self) -> Option<usize> {
        Some(usize::from(self.user != 0))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Surfaces
// ────────────────────────────────────────────────────────────────────────────

/// Geometry of a simulated surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimShape {
    Sphere { center: Vec3, radius: f32 },
    /// Axis-aligned box.
    Box { min: Vec3, max: Vec3 },
}

impl SimShape {
    fn closest_point(self, p: Vec3) -> Vec3 {
        match self {
            SimShape::Sphere { center, radius } => {
                let offset = p - center;
                if offset.length() <= radius {
                    p
                } else {
                    center + offset.clamp_length(radius)
                }
            }
            SimShape::Box { min, max } => Vec3::new(
                p.x.clamp(min.x, max.x),
                p.y.clamp(min.y, max.y),
                p.z.clamp(min.z, max.z),
            ),
        }
    }
}

#[derive(Debug, Clone)]
struct SimSurface {
    shape: SimShape,
    layer: u8,
    tags: Vec<String>,
    feedback: Option<GripFeedback>,
}

/// A list of simulated surfaces.  Handles are 1-based insertion indices.
#[derive(Debug, Clone, Default)]
pub struct SimSurfaces {
    surfaces: Vec<SimSurface>,
}

impl SimSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface.  When `with_feedback` is set a [`GripFeedback`] named
    /// after the handle is attached.
    pub fn add(&mut self, shape: SimShape, layer: u8, tags: &[&str], with_feedback: bool) -> SurfaceId {
        let id = SurfaceId(self.surfaces.len() as u64 + 1);
        self.surfaces.push(SimSurface {
            shape,
            layer,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            feedback: with_feedback.then(|| GripFeedback::new(id.to_string())),
        });
        id
    }

    /// Add a spherical climbing hold on layer 0, tagged [`DEFAULT_TAG`],
    /// with feedback.
    pub fn add_hold(&mut self, center: Vec3, radius: f32) -> SurfaceId {
        self.add(SimShape::Sphere { center, radius }, 0, &[DEFAULT_TAG], true)
    }

    /// Add a box-shaped climbable panel on layer 0, tagged [`DEFAULT_TAG`],
    /// with feedback.
    pub fn add_panel(&mut self, min: Vec3, max: Vec3) -> SurfaceId {
        self.add(SimShape::Box { min, max }, 0, &[DEFAULT_TAG], true)
    }

    pub fn with_hold(mut self, center: Vec3, radius: f32) -> Self {
        self.add_hold(center, radius);
        self
    }

    pub fn with_panel(mut self, min: Vec3, max: Vec3) -> Self {
        self.add_panel(min, max);
        self
    }

    pub fn feedback(&self, id: SurfaceId) -> Option<&GripFeedback> {
        self.get(id).and_then(|s| s.feedback.as_ref())
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    fn get(&self, id: SurfaceId) -> Option<&SimSurface> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.surfaces.get(index)
    }

    fn get_mut(&mut self, id: SurfaceId) -> Option<&mut SimSurface> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.surfaces.get_mut(index)
    }
}

impl Surfaces for SimSurfaces {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<SurfaceId> {
        self.surfaces
            .iter()
            .enumerate()
            .filter(|(_, s)| s.shape.closest_point(center).distance(center) <= radius)
            .map(|(i, _)| SurfaceId(i as u64 + 1))
            .collect()
    }

    fn layer(&self, id: SurfaceId) -> u8 {
        self.get(id).map_or(0, |s| s.layer)
    }

    fn has_tag(&self, id: SurfaceId, tag: &str) -> bool {
        self.get(id).is_some_and(|s| s.tags.iter().any(|t| t == tag))
    }

    fn closest_point(&self, id: SurfaceId, point: Vec3) -> Vec3 {
        self.get(id).map_or(point, |s| s.shape.closest_point(point))
    }

    fn feedback_mut(&mut self, id: SurfaceId) -> Option<&mut dyn SurfaceFeedback> {
        self.get_mut(id)
            .and_then(|s| s.feedback.as_mut())
            .map(|f| f as &mut dyn SurfaceFeedback)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Body
// ────────────────────────────────────────────────────────────────────────────

/// A point body with an optional infinite floor plane.
///
/// Every committed displacement is recorded so tests can assert on it.
#[derive(Debug, Clone)]
pub struct SimBody {
    position: Vec3,
    rotation: Quaternion,
    floor: Option<f32>,
    moves: Vec<Vec3>,
}

impl SimBody {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quaternion::identity(),
            floor: None,
            moves: Vec::new(),
        }
    }

    /// Add a floor at height `y`; the body cannot sink below it.
    pub fn with_floor(mut self, y: f32) -> Self {
        self.floor = Some(y);
        self
    }

    pub fn with_rotation(mut self, rotation: Quaternion) -> Self {
        self.rotation = rotation;
        self
    }

    /// Every displacement passed to [`CharacterBody::move_by`], in order.
    pub fn moves(&self) -> &[Vec3] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<Vec3> {
        self.moves.last().copied()
    }

    pub fn clear_moves(&mut self) {
        self.moves.clear();
    }
}

impl CharacterBody for SimBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn rotation(&self) -> Quaternion {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
    }

    fn move_by(&mut self, displacement: Vec3) -> CollisionFlags {
        self.moves.push(displacement);
        let mut target = self.position + displacement;
        let mut flags = CollisionFlags::NONE;
        if let Some(floor) = self.floor {
            if target.y <= floor && displacement.y <= 0.0 {
                target.y = floor;
                flags.below = true;
            }
        }
        self.position = target;
        flags
    }
}

// ────────────────────────────────────────────────────────────────────────────
// View
// ────────────────────────────────────────────────────────────────────────────

/// A camera whose look direction is set directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimView {
    pub forward: Option<Vec3>,
}

impl ViewSource for SimView {
    fn view_forward(&self) -> Option<Vec3> {
        self.forward
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::first_tracked_user;
    use crate::surface::{SurfaceEvent, notify};
    use kinclimb_types::{LayerMask, SurfaceClassifier};

    #[test]
    fn sim_skeleton_reports_user_and_joints() {
        let sk = SimSkeleton::new(3).with_joint(Joint::HandLeft, Vec3::new(0.1, 1.2, 0.3));
        let user = first_tracked_user(&sk).expect("user present");
        assert_eq!(user.get(), 3);
        assert!(sk.is_joint_tracked(user, Joint::HandLeft));
        assert!(!sk.is_joint_tracked(user, Joint::HandRight));
        assert_eq!(sk.joint_position(user, Joint::HandLeft), Vec3::new(0.1, 1.2, 0.3));
    }

    #[test]
    fn sim_skeleton_without_user() {
        let mut sk = SimSkeleton::new(0);
        assert!(first_tracked_user(&sk).is_none());
        sk.set_user(8);
        assert_eq!(first_tracked_user(&sk).map(UserId::get), Some(8));
    }

    #[test]
    fn sphere_overlap_and_closest_point() {
        let mut s = SimSurfaces::new();
        let id = s.add_hold(Vec3::new(0.0, 1.0, 0.0), 0.1);
        assert_eq!(s.overlap_sphere(Vec3::new(0.0, 1.0, 0.13), 0.04), vec![id]);
        assert!(s.overlap_sphere(Vec3::new(0.0, 1.0, 0.2), 0.04).is_empty());

        let p = s.closest_point(id, Vec3::new(0.0, 1.0, 0.5));
        assert!((p - Vec3::new(0.0, 1.0, 0.1)).length() < 1e-5);
        // Inside the hold the point is its own closest point.
        let inside = Vec3::new(0.0, 1.02, 0.0);
        assert_eq!(s.closest_point(id, inside), inside);
    }

    #[test]
    fn panel_clamps_to_box() {
        let mut s = SimSurfaces::new();
        let id = s.add_panel(Vec3::new(-1.0, 0.0, 0.5), Vec3::new(1.0, 3.0, 0.6));
        let p = s.closest_point(id, Vec3::new(0.2, 1.5, 0.45));
        assert!((p - Vec3::new(0.2, 1.5, 0.5)).length() < 1e-5);
    }

    #[test]
    fn classifier_filters_sim_surfaces() {
        let mut s = SimSurfaces::new();
        let plain = s.add(
            SimShape::Sphere { center: Vec3::zero(), radius: 0.2 },
            5,
            &["Wall"],
            false,
        );
        let hold = s.add_hold(Vec3::zero(), 0.2);
        let by_tag = SurfaceClassifier::Tagged(DEFAULT_TAG.into());
        assert_eq!(s.first_match(Vec3::zero(), 0.05, &by_tag), Some(hold));
        let by_layer = SurfaceClassifier::Layers(LayerMask::from_layer(5));
        assert_eq!(s.first_match(Vec3::zero(), 0.05, &by_layer), Some(plain));
    }

    #[test]
    fn feedback_reachable_through_notify() {
        let mut s = SimSurfaces::new();
        let id = s.add_hold(Vec3::zero(), 0.1);
        notify(&mut s, id, SurfaceEvent::Touched);
        notify(&mut s, id, SurfaceEvent::GripStarted);
        let fb = s.feedback(id).unwrap();
        assert!(fb.glow_active());
        assert_eq!(fb.grips_started(), 1);
        assert!(s.feedback(SurfaceId(99)).is_none());
    }

    #[test]
    fn body_lands_on_floor() {
        let mut body = SimBody::new(Vec3::new(0.0, 0.05, 0.0)).with_floor(0.0);
        let flags = body.move_by(Vec3::new(0.1, -0.2, 0.0));
        assert!(flags.below);
        assert_eq!(body.position(), Vec3::new(0.1, 0.0, 0.0));

        let up = body.move_by(Vec3::new(0.0, 0.3, 0.0));
        assert!(!up.below);
        assert_eq!(body.moves().len(), 2);
    }

    #[test]
    fn body_without_floor_falls_freely() {
        let mut body = SimBody::new(Vec3::zero());
        let flags = body.move_by(Vec3::new(0.0, -5.0, 0.0));
        assert!(!flags.below);
        assert_eq!(body.position().y, -5.0);
    }
}
