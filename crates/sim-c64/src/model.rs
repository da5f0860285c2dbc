//! Software stand-in for the Verilated C64 RTL.
//!
//! The real bench drives a Verilator-generated model behind FFI. That
//! object cannot live in this repository, so `SoftModel` implements the
//! same pin surface with a deterministic PAL-ish raster whose colour
//! output is derived from screen RAM. It is what the tests and the demo
//! binary run against; anything implementing the capability traits can be
//! swapped in.

use sim_core::{AudioPin, ClockPin, HardwareModel, KeyboardPort, MemoryPort, ResetPin, VideoPins};

/// Pixel-clock cycles per raster line.
pub const H_TOTAL: u32 = 504;
/// Raster lines per frame.
pub const V_TOTAL: u32 = 312;

/// Screen RAM base address.
pub const SCREEN_RAM: usize = 0x0400;

/// Text window position in raster coordinates.
const TEXT_X0: u32 = 110;
const TEXT_Y0: u32 = 40;
const TEXT_COLS: u32 = 40;
const TEXT_ROWS: u32 = 25;

const BORDER: u32 = 0x006C_5EB5; // C64 light blue
const BACKGROUND: u32 = 0x0035_2879; // C64 blue

/// The classic 16-colour palette, indexed by the low nibble of the screen
/// code.
const PALETTE: [u32; 16] = [
    0x0000_0000, 0x00FF_FFFF, 0x0068_372B, 0x0070_A4B2, 0x006F_3D86, 0x0058_8D43, 0x0035_2879,
    0x00B8_C76F, 0x006F_4F25, 0x0043_3900, 0x009A_6759, 0x0044_4444, 0x006C_6C6C, 0x009A_D284,
    0x006C_5EB5, 0x0095_9595,
];

/// Deterministic stand-in DUT with a 504x312 raster.
pub struct SoftModel {
    clk: bool,
    clk_seen: bool,
    rst: bool,
    h: u32,
    v: u32,
    hsync: bool,
    vsync: bool,
    color: u32,
    wave: i16,
    keyboard_mask: u64,
    ram: Vec<u8>,
    cycles: u64,
    finish_at_cycle: Option<u64>,
}

impl SoftModel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clk: false,
            clk_seen: false,
            rst: false,
            h: 0,
            v: 0,
            hsync: false,
            vsync: false,
            color: BORDER,
            wave: 0,
            keyboard_mask: 0,
            ram: vec![0; 0x10000],
            cycles: 0,
            finish_at_cycle: None,
        }
    }

    /// Make `finished()` latch after the given number of pixel cycles.
    pub fn finish_at_cycle(&mut self, cycle: u64) {
        self.finish_at_cycle = Some(cycle);
    }

    /// Pixel cycles since construction.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    fn advance_pixel(&mut self) {
        self.cycles += 1;

        if self.rst {
            self.h = 0;
            self.v = 0;
            self.hsync = false;
            self.vsync = false;
            self.color = BORDER;
            return;
        }

        self.h += 1;
        if self.h == H_TOTAL {
            self.h = 0;
            self.v += 1;
            if self.v == V_TOTAL {
                self.v = 0;
            }
        }

        self.hsync = self.h == 0;
        self.vsync = self.h == 0 && self.v == 0;
        self.color = self.pixel_color();
        // Placeholder waveform; enough for the 50 kHz sampling path.
        self.wave = ((self.cycles % 160) as i16 - 80) * 256;
    }

    fn pixel_color(&self) -> u32 {
        let (h, v) = (self.h, self.v);
        if h >= TEXT_X0
            && h < TEXT_X0 + TEXT_COLS * 8
            && v >= TEXT_Y0
            && v < TEXT_Y0 + TEXT_ROWS * 8
        {
            let col = (h - TEXT_X0) / 8;
            let row = (v - TEXT_Y0) / 8;
            let code = self.ram[SCREEN_RAM + (row * TEXT_COLS + col) as usize];
            if code == 0 {
                BACKGROUND
            } else {
                PALETTE[(code & 0x0F) as usize]
            }
        } else {
            BORDER
        }
    }
}

impl Default for SoftModel {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareModel for SoftModel {
    /// Settle after an input change. Idempotent: repeated calls without a
    /// new clock edge do nothing, so the scheduler's double evaluation is
    /// safe.
    fn eval(&mut self) {
        if self.clk && !self.clk_seen {
            self.advance_pixel();
        }
        self.clk_seen = self.clk;
    }

    fn finished(&self) -> bool {
        self.finish_at_cycle.is_some_and(|n| self.cycles >= n)
    }
}

impl VideoPins for SoftModel {
    fn hsync(&self) -> bool {
        self.hsync
    }

    fn vsync(&self) -> bool {
        self.vsync
    }

    fn color_rgb(&self) -> u32 {
        self.color
    }
}

impl KeyboardPort for SoftModel {
    fn keyboard_mask(&self) -> u64 {
        self.keyboard_mask
    }

    fn set_keyboard_mask(&mut self, mask: u64) {
        self.keyboard_mask = mask;
    }
}

impl MemoryPort for SoftModel {
    fn mem(&self) -> &[u8] {
        &self.ram
    }

    fn mem_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }
}

impl AudioPin for SoftModel {
    fn wave(&self) -> i16 {
        self.wave
    }
}

impl ResetPin for SoftModel {
    fn set_reset(&mut self, active: bool) {
        self.rst = active;
    }
}

impl ClockPin for SoftModel {
    /// Drive the clock pin. The model advances on the rising edge during
    /// the next `eval()`.
    fn set_clk(&mut self, level: bool) {
        self.clk = level;
    }
}
