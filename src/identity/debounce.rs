//! # Button Debouncing
//!
//! Two-button identity entry. Each button owns an independent debounce
//! state machine; a raw level must hold for longer than the debounce window
//! before it is committed as the stable level.
//!
//! The machines are polled on a coarse outer cadence (200 ms by default)
//! rather than on every raw sample. A level change seen on one poll is
//! committed on the next poll that still observes it, so contact bounce
//! shorter than the poll interval is coalesced while a press held across
//! two polls is never lost.
//!
//! ```
//! use touch_telemetry::identity::debounce::{Debouncer, Edge};
//!
//! let mut button = Debouncer::new(50, true);
//!
//! // First sighting of the high level only starts the timer
//! assert_eq!(button.poll(true, 200), None);
//! // Still high one poll later: committed as a press
//! assert_eq!(button.poll(true, 400), Some(Edge::Pressed));
//! ```

use tracing::info;

use super::IdentityAssigner;

/// Default debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// A committed transition of the stable level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Stable level moved to the active level
    Pressed,
    /// Stable level moved back to the idle level
    Released,
}

/// Debounce state machine for a single button
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    active_high: bool,
    last_raw: bool,
    last_change_ms: u64,
    stable: bool,
}

impl Debouncer {
    /// Creates a debouncer resting at the idle level.
    ///
    /// # Arguments
    ///
    /// * `window_ms` - Time a raw level must persist before it is committed
    /// * `active_high` - Whether a high level means "pressed"
    #[must_use]
    pub fn new(window_ms: u64, active_high: bool) -> Self {
        let idle = !active_high;
        Self {
            window_ms,
            active_high,
            last_raw: idle,
            last_change_ms: 0,
            stable: idle,
        }
    }

    /// Feeds one raw sample taken at `now_ms`.
    ///
    /// Returns the committed edge, if this sample caused one.
    pub fn poll(&mut self, raw: bool, now_ms: u64) -> Option<Edge> {
        if raw != self.last_raw {
            self.last_change_ms = now_ms;
            self.last_raw = raw;
        }

        if now_ms.saturating_sub(self.last_change_ms) > self.window_ms && raw != self.stable {
            self.stable = raw;
            return Some(if raw == self.active_high {
                Edge::Pressed
            } else {
                Edge::Released
            });
        }

        None
    }

    /// Whether the committed level is the active (pressed) level
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.stable == self.active_high
    }
}

/// A debounced button bound to an identity delta (+1 or -1)
#[derive(Debug, Clone)]
pub struct IdentityButton {
    debouncer: Debouncer,
    delta: i8,
}

impl IdentityButton {
    #[must_use]
    pub fn new(debouncer: Debouncer, delta: i8) -> Self {
        Self { debouncer, delta }
    }

    /// Polls the button and applies the delta on a committed press.
    ///
    /// Returns the new identity when one was applied.
    pub fn poll(&mut self, raw: bool, now_ms: u64, identity: &IdentityAssigner) -> Option<u8> {
        match self.debouncer.poll(raw, now_ms) {
            Some(Edge::Pressed) => {
                let id = identity.adjust(self.delta);
                info!(
                    "Client ID {} to {}",
                    if self.delta > 0 { "increased" } else { "decreased" },
                    id
                );
                Some(id)
            }
            _ => None,
        }
    }
}

/// The increment/decrement button pair
#[derive(Debug, Clone)]
pub struct IdentityButtons {
    increment: IdentityButton,
    decrement: IdentityButton,
}

impl IdentityButtons {
    /// Creates the pair with a shared debounce window and polarity
    #[must_use]
    pub fn new(window_ms: u64, active_high: bool) -> Self {
        Self {
            increment: IdentityButton::new(Debouncer::new(window_ms, active_high), 1),
            decrement: IdentityButton::new(Debouncer::new(window_ms, active_high), -1),
        }
    }

    /// Polls both buttons. `None` levels (failed reads) leave that button's
    /// state untouched.
    pub fn poll(
        &mut self,
        increment: Option<bool>,
        decrement: Option<bool>,
        now_ms: u64,
        identity: &IdentityAssigner,
    ) {
        if let Some(level) = increment {
            self.increment.poll(level, now_ms, identity);
        }
        if let Some(level) = decrement {
            self.decrement.poll(level, now_ms, identity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::store::MemoryIdentityStore;

    fn assigner(initial: u8) -> IdentityAssigner {
        IdentityAssigner::load(Box::new(MemoryIdentityStore::with_value(initial)))
    }

    #[test]
    fn test_new_change_is_not_committed_immediately() {
        let mut button = Debouncer::new(DEFAULT_DEBOUNCE_MS, true);
        assert_eq!(button.poll(true, 1000), None);
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_level_held_past_window_commits_once() {
        let mut button = Debouncer::new(DEFAULT_DEBOUNCE_MS, true);
        assert_eq!(button.poll(true, 1000), None);
        assert_eq!(button.poll(true, 1200), Some(Edge::Pressed));
        assert!(button.is_pressed());

        // Holding the button does not produce more edges
        for t in (1400..4000).step_by(200) {
            assert_eq!(button.poll(true, t), None);
        }
    }

    #[test]
    fn test_release_is_reported() {
        let mut button = Debouncer::new(DEFAULT_DEBOUNCE_MS, true);
        button.poll(true, 0);
        button.poll(true, 200);
        assert_eq!(button.poll(false, 400), None);
        assert_eq!(button.poll(false, 600), Some(Edge::Released));
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_exactly_window_is_not_enough() {
        let mut button = Debouncer::new(50, true);
        button.poll(true, 100);
        assert_eq!(button.poll(true, 150), None);
        assert_eq!(button.poll(true, 151), Some(Edge::Pressed));
    }

    #[test]
    fn test_noise_shorter_than_window_never_commits() {
        let mut button = Debouncer::new(50, true);
        let mut edges = 0;

        // Chatter every 10 ms, never stable for longer than the window
        for i in 0..100u64 {
            if button.poll(i % 2 == 0, i * 10).is_some() {
                edges += 1;
            }
        }

        assert_eq!(edges, 0);
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_bounce_then_settle_commits_once_per_transition() {
        let mut button = Debouncer::new(50, true);
        let mut edges = Vec::new();

        // Bouncy press: 0..40ms chatter, then steady high
        let samples = [
            (0, true), (5, false), (10, true), (20, false), (40, true),
            (60, true), (95, true), (200, true),
            // Bouncy release
            (300, false), (305, true), (310, false), (420, false), (600, false),
        ];
        for (t, level) in samples {
            if let Some(edge) = button.poll(level, t) {
                edges.push(edge);
            }
        }

        assert_eq!(edges, vec![Edge::Pressed, Edge::Released]);
    }

    #[test]
    fn test_active_low_button() {
        let mut button = Debouncer::new(50, false);
        // Idle high level is not a transition
        assert_eq!(button.poll(true, 0), None);
        assert_eq!(button.poll(true, 200), None);

        assert_eq!(button.poll(false, 400), None);
        assert_eq!(button.poll(false, 600), Some(Edge::Pressed));
    }

    #[test]
    fn test_increment_button_applies_delta() {
        let identity = assigner(3);
        let mut buttons = IdentityButtons::new(50, true);

        buttons.poll(Some(true), Some(false), 200, &identity);
        assert_eq!(identity.get(), 3);
        buttons.poll(Some(true), Some(false), 400, &identity);
        assert_eq!(identity.get(), 4);
    }

    #[test]
    fn test_decrement_button_applies_delta() {
        let identity = assigner(3);
        let mut buttons = IdentityButtons::new(50, true);

        buttons.poll(Some(false), Some(true), 200, &identity);
        buttons.poll(Some(false), Some(true), 400, &identity);
        assert_eq!(identity.get(), 2);
    }

    #[test]
    fn test_release_does_not_change_identity() {
        let identity = assigner(7);
        let mut button = IdentityButton::new(Debouncer::new(50, true), 1);

        button.poll(true, 0, &identity);
        assert_eq!(button.poll(true, 200, &identity), Some(8));
        button.poll(false, 400, &identity);
        assert_eq!(button.poll(false, 600, &identity), None);
        assert_eq!(identity.get(), 8);
    }

    #[test]
    fn test_repeated_presses_clamp_at_bounds() {
        let identity = assigner(14);
        let mut button = IdentityButton::new(Debouncer::new(50, true), 1);

        let mut t = 0;
        for _ in 0..5 {
            for level in [true, true, false, false] {
                button.poll(level, t, &identity);
                t += 200;
            }
        }

        assert_eq!(identity.get(), 15);
    }

    #[test]
    fn test_failed_read_leaves_button_untouched() {
        let identity = assigner(5);
        let mut buttons = IdentityButtons::new(50, true);

        buttons.poll(Some(true), None, 200, &identity);
        buttons.poll(None, None, 400, &identity);
        buttons.poll(Some(true), None, 600, &identity);
        assert_eq!(identity.get(), 6);
    }
}
