//! `kinclimb-perception` – signal stages between raw joints and motion.
//!
//! Skeleton streams are jittery and occasionally wrong.  Each stage here
//! owns one piece of the clean-up and keeps its own small state, so the
//! engines in `kinclimb-locomotion` only combine results.
//!
//! # Modules
//!
//! - [`jitter`] – [`JitterFilter`][jitter::JitterFilter]: deadzone, damped
//!   blend with the previous output, and a per-frame magnitude clamp.
//! - [`step_detector`] – [`StepDetector`][step_detector::StepDetector]:
//!   standing baseline warm-up, per-leg lift hysteresis, and step
//!   acceptance by interval and alternation.
//! - [`heading`] – [`HeadingTracker`][heading::HeadingTracker]: forward
//!   direction from the view, the shoulders or the body, smoothed by slerp.

pub mod heading;
pub mod jitter;
pub mod step_detector;

pub use heading::{HeadingInputs, HeadingTracker};
pub use jitter::JitterFilter;
pub use step_detector::{RejectReason, StepDetector, StepOutcome};
