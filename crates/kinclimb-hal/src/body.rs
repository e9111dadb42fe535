//! Character body seam: the physical move primitive.

use kinclimb_types::{CollisionFlags, Quaternion, Transform3D, Vec3};

/// A collide-and-slide character body (capsule controller or equivalent).
///
/// The locomotion engines are the only writers of the body pose while they
/// run; the anti-recentering guard uses [`set_position`][Self::set_position]
/// to undo displacement caused by anything else.
pub trait CharacterBody {
    fn position(&self) -> Vec3;

    /// Teleport without collision.
    fn set_position(&mut self, position: Vec3);

    fn rotation(&self) -> Quaternion;

    fn set_rotation(&mut self, rotation: Quaternion);

    /// Move by `displacement`, resolving collisions, and report which sides
    /// of the body were hit.
    fn move_by(&mut self, displacement: Vec3) -> CollisionFlags;

    fn forward(&self) -> Vec3 {
        self.rotation().forward()
    }

    fn right(&self) -> Vec3 {
        self.rotation().right()
    }

    fn pose(&self) -> Transform3D {
        Transform3D::new(self.position(), self.rotation())
    }
}
