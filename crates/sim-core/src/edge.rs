//! Transition detection on boolean signals.

/// What a signal did between two simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    /// No transition; the signal held its level.
    None,
}

/// Previous-value latch for a single boolean signal.
///
/// Feed it the signal's level once per step of the observing clock domain;
/// it reports the transition relative to the previous step. Sync pulses and
/// clock-enable strobes from the model are asynchronous to the observer, so
/// this is the only way to see their edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self { prev: false }
    }

    /// Latch the current level and report the transition since last call.
    pub fn update(&mut self, level: bool) -> Edge {
        let edge = match (self.prev, level) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::None,
        };
        self.prev = level;
        edge
    }

    /// The level latched by the most recent `update`.
    #[must_use]
    pub const fn level(&self) -> bool {
        self.prev
    }
}
