/// Default toggle interval, in the caller's time units (usually milliseconds).
pub const DEFAULT_BLINK_INTERVAL: u32 = 250;

/// Free-running blink flag for UI effects.
///
/// Not tied to any output: the caller feeds it a timestamp from its main
/// loop and reads the flag when deciding what level to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkTimer {
    interval: u32,
    last_toggle: u32,
    blink: bool,
}

impl BlinkTimer {
    pub const fn new(interval: u32) -> Self {
        Self {
            interval,
            last_toggle: 0,
            blink: false,
        }
    }

    /// Toggles the flag once more than `interval` has elapsed since the last toggle.
    ///
    /// Elapsed time uses wrapping arithmetic, so a rolling-over tick
    /// counter keeps blinking at the same rate.
    pub fn set_timer(&mut self, now: u32) {
        if now.wrapping_sub(self.last_toggle) > self.interval {
            self.blink = !self.blink;
            self.last_toggle = now;
        }
    }

    #[inline]
    pub fn blink(&self) -> bool {
        self.blink
    }

    #[inline]
    pub fn interval(&self) -> u32 {
        self.interval
    }
}

impl Default for BlinkTimer {
    fn default() -> Self {
        Self::new(DEFAULT_BLINK_INTERVAL)
    }
}
