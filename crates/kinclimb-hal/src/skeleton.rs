//! Skeletal frame provider seam.
//!
//! A [`SkeletonSource`] answers two questions per joint (is it tracked, and
//! where is it).  Finding *which* user to read is messier: sensor SDKs
//! expose different subsets of "is anybody there", "id at index N",
//! "player one" and "how many users".  Each of those is an optional trait
//! method that defaults to `None`, and [`first_tracked_user`] walks them in
//! a fixed order.
//!
//! # Example
//!
//! ```rust
//! use kinclimb_hal::skeleton::{first_tracked_user, SkeletonSource};
//! use kinclimb_types::{Joint, UserId, Vec3};
//!
//! struct OnePlayer;
//!
//! impl SkeletonSource for OnePlayer {
//!     fn is_joint_tracked(&self, _: UserId, _: Joint) -> bool { true }
//!     fn joint_position(&self, _: UserId, _: Joint) -> Vec3 { Vec3::zero() }
//!     fn player_one_id(&self) -> Option<u32> { Some(42) }
//! }
//!
//! assert_eq!(first_tracked_user(&OnePlayer).map(UserId::get), Some(42));
//! ```

use kinclimb_types::{Joint, Quaternion, SensorMount, Transform3D, UserId, Vec3};

// ────────────────────────────────────────────────────────────────────────────
// SkeletonSource
// ────────────────────────────────────────────────────────────────────────────

/// A body-tracking sensor (or anything pretending to be one).
///
/// Positions are in the sensor's own frame.  Discovery methods return
/// `None` when the provider does not offer that capability at all, and raw
/// ids where `0` means "nobody".
pub trait SkeletonSource {
    /// Whether `joint` of `user` carries a usable position this frame.
    fn is_joint_tracked(&self, user: UserId, joint: Joint) -> bool;

    /// Sensor-space position of `joint`.  Only meaningful when
    /// [`is_joint_tracked`][Self::is_joint_tracked] returned `true`.
    fn joint_position(&self, user: UserId, joint: Joint) -> Vec3;

    /// "Is any user in view?"  A `Some(false)` answer ends discovery.
    fn is_user_detected(&self) -> Option<bool> {
        None
    }

    /// Raw id of the user at `index`.
    fn user_id_by_index(&self, _index: usize) -> Option<u32> {
        None
    }

    /// Raw id of the primary player.
    fn player_one_id(&self) -> Option<u32> {
        None
    }

    /// Number of users currently known to the provider.
    fn user_count(&self) -> Option<usize> {
        None
    }
}

/// Find the user to drive the character with.
///
/// Order: detection gate, user at index 0, player one, then every index
/// below the user count.  Returns `None` when the provider exposes none of
/// these or reports only zero ids.
pub fn first_tracked_user(source: &dyn SkeletonSource) -> Option<UserId> {
    if source.is_user_detected() == Some(false) {
        return None;
    }

    if let Some(user) = source.user_id_by_index(0).and_then(UserId::new) {
        return Some(user);
    }

    if let Some(user) = source.player_one_id().and_then(UserId::new) {
        return Some(user);
    }

    let count = source.user_count()?;
    (0..count).find_map(|i| source.user_id_by_index(i).and_then(UserId::new))
}

// ────────────────────────────────────────────────────────────────────────────
// SkeletonReader
// ────────────────────────────────────────────────────────────────────────────

/// One joint reading in both frames the engines care about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    /// Sensor frame with the handedness already corrected.  Frame-to-frame
    /// deltas in this frame are pure user motion.
    pub local: Vec3,
    /// World position, used for contact probes and anchors.
    pub world: Vec3,
}

/// Per-frame view of one user's skeleton, mapped into world space.
pub struct SkeletonReader<'a> {
    source: &'a dyn SkeletonSource,
    user: UserId,
    flip_z: bool,
    to_world: Transform3D,
}

impl<'a> SkeletonReader<'a> {
    /// Build a reader for `user`.  `body_pose` is only used when the mount
    /// follows the body.
    pub fn new(
        source: &'a dyn SkeletonSource,
        user: UserId,
        mount: &SensorMount,
        body_pose: Transform3D,
    ) -> Self {
        let base = if mount.follow_body {
            body_pose
        } else {
            Transform3D::identity()
        };
        Self {
            source,
            user,
            flip_z: mount.flip_z,
            to_world: base.compose(Transform3D::new(mount.offset, Quaternion::identity())),
        }
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    /// Read `joint`, or `None` when it is untracked or not finite.
    pub fn sample(&self, joint: Joint) -> Option<JointSample> {
        if !self.source.is_joint_tracked(self.user, joint) {
            return None;
        }
        let raw = self.source.joint_position(self.user, joint);
        if !raw.is_finite() {
            return None;
        }
        let local = if self.flip_z {
            Vec3::new(raw.x, raw.y, -raw.z)
        } else {
            raw
        };
        Some(JointSample {
            local,
            world: self.to_world.apply(local),
        })
    }

    pub fn world(&self, joint: Joint) -> Option<Vec3> {
        self.sample(joint).map(|s| s.world)
    }

    pub fn local(&self, joint: Joint) -> Option<Vec3> {
        self.sample(joint).map(|s| s.local)
    }

    /// Express a sensor-frame direction (e.g. a frame-to-frame delta) in
    /// world axes.
    pub fn direction_to_world(&self, v: Vec3) -> Vec3 {
        self.to_world.rotation.rotate(v)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider whose discovery capabilities are switched on per test.
    #[derive(Default)]
    struct MockProvider {
        detected: Option<bool>,
        by_index: Option<Vec<u32>>,
        player_one: Option<u32>,
        expose_count: bool,
        position: Vec3,
        tracked: bool,
    }

    impl SkeletonSource for MockProvider {
        fn is_joint_tracked(&self, _user: UserId, _joint: Joint) -> bool {
            self.tracked
        }

        fn joint_position(&self, _user: UserId, _joint: Joint) -> Vec3 {
            self.position
        }

        fn is_user_detected(&self) -> Option<bool> {
            self.detected
        }

        fn user_id_by_index(&self, index: usize) -> Option<u32> {
            self.by_index.as_ref().map(|ids| ids.get(index).copied().unwrap_or(0))
        }

        fn player_one_id(&self) -> Option<u32> {
            self.player_one
        }

        fn user_count(&self) -> Option<usize> {
            if self.expose_count {
                self.by_index.as_ref().map(Vec::len)
            } else {
                None
            }
        }
    }

    fn user(raw: u32) -> UserId {
        UserId::new(raw).unwrap()
    }

    #[test]
    fn provider_without_discovery_has_no_user() {
        assert!(first_tracked_user(&MockProvider::default()).is_none());
    }

    #[test]
    fn detection_gate_short_circuits() {
        let p = MockProvider {
            detected: Some(false),
            player_one: Some(5),
            ..Default::default()
        };
        assert!(first_tracked_user(&p).is_none());
    }

    #[test]
    fn index_zero_wins_over_player_one() {
        let p = MockProvider {
            detected: Some(true),
            by_index: Some(vec![9]),
            player_one: Some(5),
            ..Default::default()
        };
        assert_eq!(first_tracked_user(&p), Some(user(9)));
    }

    #[test]
    fn zero_player_one_falls_through_to_count_scan() {
        let p = MockProvider {
            by_index: Some(vec![0, 0, 17]),
            player_one: Some(0),
            expose_count: true,
            ..Default::default()
        };
        assert_eq!(first_tracked_user(&p), Some(user(17)));
    }

    #[test]
    fn count_scan_needs_user_count() {
        let p = MockProvider {
            by_index: Some(vec![0, 3]),
            ..Default::default()
        };
        assert!(first_tracked_user(&p).is_none());
    }

    #[test]
    fn reader_flips_z_and_follows_body() {
        let p = MockProvider {
            tracked: true,
            position: Vec3::new(0.1, 1.0, 2.0),
            ..Default::default()
        };
        let mount = SensorMount {
            flip_z: true,
            offset: Vec3::new(0.0, 0.5, 0.0),
            follow_body: true,
        };
        let body = Transform3D::new(Vec3::new(10.0, 0.0, 0.0), Quaternion::identity());
        let reader = SkeletonReader::new(&p, user(1), &mount, body);

        let s = reader.sample(Joint::HandLeft).unwrap();
        assert!((s.local.z + 2.0).abs() < 1e-5);
        assert!((s.world.x - 10.1).abs() < 1e-5);
        assert!((s.world.y - 1.5).abs() < 1e-5);
        assert!((s.world.z + 2.0).abs() < 1e-5);
    }

    #[test]
    fn reader_ignores_body_when_not_following() {
        let p = MockProvider {
            tracked: true,
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let mount = SensorMount {
            flip_z: false,
            offset: Vec3::zero(),
            follow_body: false,
        };
        let body = Transform3D::new(Vec3::new(10.0, 0.0, 0.0), Quaternion::identity());
        let reader = SkeletonReader::new(&p, user(1), &mount, body);
        assert_eq!(reader.world(Joint::Head), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(reader.direction_to_world(Vec3::RIGHT), Vec3::RIGHT);
    }

    #[test]
    fn reader_rotates_directions_with_body() {
        let p = MockProvider::default();
        let yaw = Quaternion::from_axis_angle(Vec3::UP, std::f32::consts::FRAC_PI_2);
        let reader = SkeletonReader::new(
            &p,
            user(1),
            &SensorMount::default(),
            Transform3D::new(Vec3::zero(), yaw),
        );
        // Turned to face +X, the sensor's right axis points along -Z.
        let right = reader.direction_to_world(Vec3::RIGHT);
        assert!((right - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn reader_rejects_untracked_and_non_finite() {
        let untracked = MockProvider::default();
        let reader = SkeletonReader::new(
            &untracked,
            user(1),
            &SensorMount::default(),
            Transform3D::identity(),
        );
        assert!(reader.sample(Joint::HipCenter).is_none());

        let nan = MockProvider {
            tracked: true,
            position: Vec3::new(f32::NAN, 0.0, 0.0),
            ..Default::default()
        };
        let reader = SkeletonReader::new(
            &nan,
            user(1),
            &SensorMount::default(),
            Transform3D::identity(),
        );
        assert!(reader.local(Joint::HipCenter).is_none());
    }
}
