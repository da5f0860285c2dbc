//! Discrete-event scheduler for independent clock domains.

use crate::model::HardwareModel;
use crate::trace::TraceSink;

/// Per-domain hook, invoked once per toggle with the level just applied.
///
/// Hooks receive the model and the bench context, never the scheduler, so
/// registering or removing clock domains from inside a hook is impossible
/// by construction rather than checked at runtime.
pub type DomainHook<M, C> = Box<dyn FnMut(&mut M, &mut C, bool)>;

/// Applies a level to the domain's clock pin on the model.
pub type LevelSetter<M> = Box<dyn FnMut(&mut M, bool)>;

/// Why a `run_until` loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The caller's predicate became true.
    Satisfied,
    /// The model reported its terminal condition. Stop stepping.
    Finished,
}

/// One periodic clock domain.
struct ClockDomain<M, C> {
    set_level: LevelSetter<M>,
    /// Level currently driven onto the pin.
    level: bool,
    half_period_ps: u64,
    /// Absolute time of the next toggle. Strictly increasing.
    next_due_ps: u64,
    hook: Option<DomainHook<M, C>>,
}

/// Owns the global picosecond clock and a set of clock domains.
///
/// Each `step_once` picks the earliest-due domain (ties broken by
/// registration order), advances global time to its due point, toggles its
/// pin, settles the model, and reschedules it half a period later. Global
/// time therefore advances in non-decreasing steps equal to the minimum
/// pending due time.
pub struct ClockScheduler<M, C> {
    domains: Vec<ClockDomain<M, C>>,
    now_ps: u64,
    trace: Option<Box<dyn TraceSink>>,
    trace_tick: u64,
}

impl<M: HardwareModel, C> ClockScheduler<M, C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            domains: Vec::new(),
            now_ps: 0,
            trace: None,
            trace_tick: 0,
        }
    }

    /// Register a clock domain.
    ///
    /// The domain starts low and holds that level for one half period past
    /// its phase offset; the first toggle lands at
    /// `phase_offset_ps + half_period`, so `n` steps of a lone phase-0
    /// domain put global time at exactly `n * half_period`.
    ///
    /// # Errors
    ///
    /// Fails if `frequency_hz` is not a positive finite number.
    pub fn add_clock(
        &mut self,
        set_level: LevelSetter<M>,
        frequency_hz: f64,
        phase_offset_ps: u64,
        hook: Option<DomainHook<M, C>>,
    ) -> Result<usize, String> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(format!(
                "clock frequency must be positive, got {frequency_hz} Hz"
            ));
        }
        let half_period_ps = (1e12 / frequency_hz / 2.0) as u64;
        if half_period_ps == 0 {
            return Err(format!("clock frequency {frequency_hz} Hz exceeds 500 GHz"));
        }
        self.domains.push(ClockDomain {
            set_level,
            level: false,
            half_period_ps,
            next_due_ps: phase_offset_ps + half_period_ps,
            hook,
        });
        Ok(self.domains.len() - 1)
    }

    /// Attach a trace sink. It receives two samples per toggle (one before
    /// the flip, one after the post-flip settle) with a monotonically
    /// increasing integer timestamp.
    pub fn set_trace(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// Current absolute simulation time in picoseconds.
    #[must_use]
    pub const fn now_ps(&self) -> u64 {
        self.now_ps
    }

    /// Number of registered domains.
    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Apply the next pending clock edge.
    ///
    /// Toggles the earliest-due domain, evaluates the model twice (a single
    /// pass does not settle all combinational logic downstream of the
    /// flipped input), advances global time, reschedules the domain, and
    /// invokes its hook.
    pub fn step_once(&mut self, model: &mut M, ctx: &mut C) {
        let idx = self.earliest();

        if let Some(t) = self.trace.as_deref_mut() {
            t.sample(self.trace_tick);
            self.trace_tick += 1;
        }

        {
            let domain = &mut self.domains[idx];
            self.now_ps = domain.next_due_ps;
            domain.level = !domain.level;
            (domain.set_level)(model, domain.level);
        }
        model.eval();
        model.eval();

        if let Some(t) = self.trace.as_deref_mut() {
            t.sample(self.trace_tick);
            self.trace_tick += 1;
        }

        let domain = &mut self.domains[idx];
        domain.next_due_ps += domain.half_period_ps;
        let level = domain.level;
        if let Some(hook) = domain.hook.as_mut() {
            hook(model, ctx, level);
        }
    }

    /// Step until `predicate` holds or the model finishes.
    pub fn run_until(
        &mut self,
        model: &mut M,
        ctx: &mut C,
        mut predicate: impl FnMut(&M, &C) -> bool,
    ) -> RunStatus {
        loop {
            if model.finished() {
                return RunStatus::Finished;
            }
            self.step_once(model, ctx);
            if predicate(model, ctx) {
                return RunStatus::Satisfied;
            }
        }
    }

    /// Index of the domain with the smallest `next_due_ps`; registration
    /// order breaks ties.
    fn earliest(&self) -> usize {
        assert!(!self.domains.is_empty(), "no clock domains registered");
        let mut first = 0;
        for (i, domain) in self.domains.iter().enumerate() {
            if domain.next_due_ps < self.domains[first].next_due_ps {
                first = i;
            }
        }
        first
    }
}

impl<M: HardwareModel, C> Default for ClockScheduler<M, C> {
    fn default() -> Self {
        Self::new()
    }
}
