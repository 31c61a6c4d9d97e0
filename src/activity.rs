//! Motor activity tracking from external scalar indicators.
//!
//! The monitor consumes two externally-computed signals per sample tick —
//! typically vibration RMS and current draw — and decides whether the
//! monitored machine is running. This is deliberately decoupled from the
//! clustering pipeline: "the machine went idle" and "the engine is frozen"
//! are independent facts, and an alarm must survive a shift change or
//! equipment shutdown.

use crate::fixed::Fixed;

/// RMS level below which a tick counts as idle (0.5 in real units).
pub const IDLE_RMS_THRESHOLD: Fixed = Fixed::from_raw(32768);

/// Current-draw level below which a tick counts as idle (0.1 in real units).
pub const IDLE_CURRENT_THRESHOLD: Fixed = Fixed::from_raw(6554);

/// Consecutive idle ticks required before the motor is considered stopped.
pub const IDLE_CONSECUTIVE_SAMPLES: u32 = 10;

/// Consecutive-idle detector over two activity signals.
#[derive(Clone, Debug)]
pub struct ActivityMonitor {
    idle_streak: u32,
    running: bool,
    last_rms: Fixed,
    last_current: Fixed,
}

impl ActivityMonitor {
    /// New monitor; the motor is assumed running until proven idle.
    pub(crate) fn new() -> Self {
        ActivityMonitor {
            idle_streak: 0,
            running: true,
            last_rms: Fixed::ZERO,
            last_current: Fixed::ZERO,
        }
    }

    /// Feed one tick of activity signals.
    ///
    /// Both signals must sit below their thresholds for
    /// [`IDLE_CONSECUTIVE_SAMPLES`] ticks in a row before the motor flips to
    /// stopped. A single active tick resets the streak and marks it running.
    pub(crate) fn observe(&mut self, rms: Fixed, current: Fixed) {
        self.last_rms = rms;
        self.last_current = current;

        if rms < IDLE_RMS_THRESHOLD && current < IDLE_CURRENT_THRESHOLD {
            self.idle_streak += 1;
            if self.idle_streak >= IDLE_CONSECUTIVE_SAMPLES {
                self.running = false;
            }
        } else {
            self.idle_streak = 0;
            self.running = true;
        }
    }

    /// Whether the monitored machine is currently considered running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Most recent RMS reading.
    pub fn last_rms(&self) -> Fixed {
        self.last_rms
    }

    /// Most recent current reading.
    pub fn last_current(&self) -> Fixed {
        self.last_current
    }
}
