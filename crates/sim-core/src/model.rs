//! Capability traits for the simulated hardware model.
//!
//! The model (typically a Verilated RTL object behind FFI) is a black box
//! exposing named pins and an evaluation step. The testbench never looks
//! inside; each component bounds itself to exactly the pins it needs.

/// The evaluation and termination surface every model must expose.
///
/// `eval()` settles combinational logic after an input change. It must be
/// safe to call repeatedly without further input changes; the scheduler
/// calls it twice per edge because a single pass does not guarantee all
/// downstream logic has settled.
pub trait HardwareModel {
    fn eval(&mut self);

    /// True once the model has hit a terminal condition (e.g. `$finish`).
    /// This is ordinary termination, never an error.
    fn finished(&self) -> bool {
        false
    }
}

/// Raster timing and colour output pins of a video domain.
pub trait VideoPins {
    fn hsync(&self) -> bool;
    fn vsync(&self) -> bool;
    /// Blanking flag; models without one report false (never blanked).
    fn blank(&self) -> bool {
        false
    }
    /// Current pixel colour as 0x00RRGGBB.
    fn color_rgb(&self) -> u32;
}

/// The keyboard-matrix mask input pin.
///
/// Bit `pa * 8 + pb` asserted means the key at matrix position (PA, PB)
/// is held down.
pub trait KeyboardPort {
    fn keyboard_mask(&self) -> u64;
    fn set_keyboard_mask(&mut self, mask: u64);
}

/// Directly addressable memory image inside the model.
///
/// A bounded byte span, not a raw pointer: callers bounds-check against
/// `mem().len()` so an out-of-range load or dump fails cleanly instead of
/// corrupting adjacent state.
pub trait MemoryPort {
    fn mem(&self) -> &[u8];
    fn mem_mut(&mut self) -> &mut [u8];
}

/// A primary clock input pin, for models driven by a single clock domain.
///
/// Multi-clock models instead hand the scheduler one level-setter closure
/// per domain.
pub trait ClockPin {
    fn set_clk(&mut self, level: bool);
}

/// Audio wave output pin, one signed sample per read.
pub trait AudioPin {
    fn wave(&self) -> i16;
}

/// Reset input pin.
pub trait ResetPin {
    fn set_reset(&mut self, active: bool);
}
