//! [`GripFeedback`] – the stock feedback object for climbable surfaces.
//!
//! Several limbs can touch or grip the same surface at once, so the object
//! keeps counts instead of flags.  Its glow indicator is on while at least
//! one limb touches the surface.  Lifetime totals are kept alongside the
//! live counts so callers can check that each transition was reported
//! exactly once.

use tracing::debug;

use crate::surface::SurfaceFeedback;

/// Touch/grip counter with a glow indicator and optional event logging.
#[derive(Debug, Clone)]
pub struct GripFeedback {
    name: String,
    log_events: bool,
    enabled: bool,
    touch_count: u32,
    grip_count: u32,
    glow: bool,
    touches_started: u32,
    grips_started: u32,
    grips_ended: u32,
}

impl GripFeedback {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log_events: false,
            enabled: true,
            touch_count: 0,
            grip_count: 0,
            glow: false,
            touches_started: 0,
            grips_started: 0,
            grips_ended: 0,
        }
    }

    /// Emit a `debug` event for every notification.
    pub fn with_logging(mut self, log_events: bool) -> Self {
        self.log_events = log_events;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Limbs currently touching.
    pub fn touch_count(&self) -> u32 {
        self.touch_count
    }

    /// Limbs currently gripping.
    pub fn grip_count(&self) -> u32 {
        self.grip_count
    }

    pub fn glow_active(&self) -> bool {
        self.glow
    }

    pub fn touches_started(&self) -> u32 {
        self.touches_started
    }

    pub fn grips_started(&self) -> u32 {
        self.grips_started
    }

    pub fn grips_ended(&self) -> u32 {
        self.grips_ended
    }

    /// Disabling turns the glow off and forgets the live counts; enabling
    /// restores the glow from the current touch count.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.glow = self.touch_count > 0;
        } else {
            self.glow = false;
            self.touch_count = 0;
            self.grip_count = 0;
        }
    }

    fn refresh_glow(&mut self) {
        if self.enabled {
            self.glow = self.touch_count > 0;
        }
    }
}

impl SurfaceFeedback for GripFeedback {
    fn on_touch_changed(&mut self, touching: bool) {
        if touching {
            self.touch_count += 1;
            self.touches_started += 1;
        } else {
            self.touch_count = self.touch_count.saturating_sub(1);
        }
        self.refresh_glow();
        if self.log_events {
            debug!(surface = %self.name, touching, touch_count = self.touch_count, "touch changed");
        }
    }

    fn on_grip_start(&mut self) {
        self.grip_count += 1;
        self.grips_started += 1;
        if self.log_events {
            debug!(surface = %self.name, grip_count = self.grip_count, "grip start");
        }
    }

    fn on_grip_end(&mut self) {
        self.grip_count = self.grip_count.saturating_sub(1);
        self.grips_ended += 1;
        if self.log_events {
            debug!(surface = %self.name, grip_count = self.grip_count, "grip end");
        }
    }
}
