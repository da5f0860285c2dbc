//! Discrete-event testbench mechanism for cycle-accurate RTL simulation.
//!
//! The simulated hardware is a black box behind capability traits: named
//! pins, an `eval()` step, and a finished query. Everything here is
//! single-threaded and step-driven; global time only moves when a clock
//! domain's edge is applied.

mod edge;
mod framebuffer;
mod model;
mod raster;
mod scheduler;
mod trace;

pub use edge::{Edge, EdgeDetector};
pub use framebuffer::{Framebuffer, Rgb};
pub use model::{AudioPin, ClockPin, HardwareModel, KeyboardPort, MemoryPort, ResetPin, VideoPins};
pub use raster::{BlankingAssembler, SyncPulseAssembler};
pub use scheduler::{ClockScheduler, DomainHook, RunStatus};
pub use trace::{TraceSink, VecTrace, WriteTrace};
