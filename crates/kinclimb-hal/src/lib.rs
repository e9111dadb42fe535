//! `kinclimb-hal` – seams to the engine-side collaborators.
//!
//! The locomotion engines never talk to a sensor SDK, a physics engine or a
//! scene graph directly.  They talk to the traits below, so a game engine
//! binding, a replay file or a unit test can stand in for the real thing.
//!
//! # Modules
//!
//! - [`skeleton`] – [`SkeletonSource`][skeleton::SkeletonSource]: per-joint
//!   positions and tracked flags, the tracked-user discovery cascade, and
//!   [`SkeletonReader`][skeleton::SkeletonReader] which maps sensor space
//!   into world space.
//! - [`surface`] – [`Surfaces`][surface::Surfaces]: sphere overlap queries
//!   against climbable geometry and access to per-surface feedback objects.
//! - [`feedback`] – [`GripFeedback`][feedback::GripFeedback]: the stock
//!   touch/grip counter attached to climbable surfaces.
//! - [`body`] – [`CharacterBody`][body::CharacterBody]: the collide-and-slide
//!   movement primitive.
//! - [`view`] – [`ViewSource`][view::ViewSource]: forward direction of a
//!   head-mounted or forward-facing camera.
//! - [`sim`] – in-process stand-ins for all of the above.

pub mod body;
pub mod feedback;
pub mod sim;
pub mod skeleton;
pub mod surface;
pub mod view;

pub use body::CharacterBody;
pub use feedback::GripFeedback;
pub use skeleton::{JointSample, SkeletonReader, SkeletonSource, first_tracked_user};
pub use surface::{SurfaceEvent, SurfaceFeedback, Surfaces, notify};
pub use view::ViewSource;
