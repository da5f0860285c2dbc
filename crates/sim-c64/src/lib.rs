//! Frame-scripted testbench driver for a C64 system-on-chip model.
//!
//! Builds on `sim-core`'s clock scheduler and raster assembly: the bench
//! drives the model's single 8 MHz pixel clock, reconstructs frames from
//! the sync outputs, and fires scripted stimulus (program loads, memory
//! dumps, key injection) at frame boundaries. The model itself sits
//! behind `sim-core`'s capability traits; [`SoftModel`] is the
//! software stand-in the tests and the binary run against.

pub mod capture;
pub mod command;
pub mod driver;
pub mod inject;
pub mod keymap;
pub mod loader;
pub mod model;

pub use command::{Command, CommandQueue};
pub use driver::{C64Bench, FrameOutcome};
pub use inject::{KeyInjectionSession, SessionStatus};
pub use loader::{ChunkedLoader, ControlChannel, LoaderStatus};
pub use model::SoftModel;
