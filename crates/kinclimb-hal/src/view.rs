//! Forward-facing camera seam, used as a heading source by the gait engine.

use kinclimb_types::Vec3;

/// A camera or headset whose look direction can steer walking.
pub trait ViewSource {
    /// World-space look direction, or `None` when the view is unavailable.
    fn view_forward(&self) -> Option<Vec3>;
}

impl ViewSource for Vec3 {
    fn view_forward(&self) -> Option<Vec3> {
        Some(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_direction_is_a_view_source() {
        let view: &dyn ViewSource = &Vec3::FORWARD;
        assert_eq!(view.view_forward(), Some(Vec3::FORWARD));
    }
}
