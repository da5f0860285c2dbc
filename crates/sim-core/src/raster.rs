//! Raster frame reconstruction from sync timing.
//!
//! There is no frame-boundary signal coming out of the model; the only
//! structure is the sync pulses. Two assembler variants cover the two pin
//! surfaces models expose:
//!
//! - [`SyncPulseAssembler`] for models with discrete sync pulses and a
//!   valid colour every pixel-clock tick (the pulse is observed level-wise
//!   and the visible window is located with fixed porch offsets);
//! - [`BlankingAssembler`] for models with a blanking flag and free-running
//!   sync lines (edges are detected against the previous tick and no porch
//!   arithmetic is needed).
//!
//! Tick either one once per pixel-clock cycle. A `true` return marks frame
//! completion, the only notion of time the scripted layers have.

use crate::edge::{Edge, EdgeDetector};
use crate::framebuffer::{Framebuffer, Rgb};

const fn split_rgb(color: u32) -> Rgb {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// Porch-offset raster assembler.
///
/// The horizontal counter increments unconditionally every tick; hsync
/// resets it and bumps the vertical counter; vsync resets the vertical
/// counter and completes the frame. A pixel lands in the framebuffer only
/// when both counters, minus their porch offsets, fall inside the visible
/// window. Everything else is beam time outside the picture and is
/// discarded without error.
pub struct SyncPulseAssembler {
    fb: Framebuffer,
    h_porch: i32,
    v_porch: i32,
    hcntr: i32,
    vcntr: i32,
}

impl SyncPulseAssembler {
    #[must_use]
    pub fn new(width: u32, height: u32, h_porch: i32, v_porch: i32) -> Self {
        Self {
            fb: Framebuffer::new(width, height),
            h_porch,
            v_porch,
            hcntr: 0,
            vcntr: 0,
        }
    }

    /// Process one pixel-clock tick. Returns true when vsync completed a
    /// frame.
    pub fn tick(&mut self, hsync: bool, vsync: bool, color: u32) -> bool {
        let mut frame_done = false;

        if hsync {
            self.hcntr = 0;
            self.vcntr += 1;
        }
        if vsync {
            self.vcntr = 0;
            frame_done = true;
        }

        let x = self.hcntr - self.h_porch;
        let y = self.vcntr - self.v_porch;
        if x >= 0 && y >= 0 {
            // put() discards anything right of or below the window
            self.fb.put(x as u32, y as u32, split_rgb(color));
        }

        self.hcntr += 1;
        frame_done
    }

    /// Raster counters (horizontal, vertical), pre-porch.
    #[must_use]
    pub const fn cursor(&self) -> (i32, i32) {
        (self.hcntr, self.vcntr)
    }

    /// The live framebuffer. Overwritten in place by subsequent ticks.
    #[must_use]
    pub const fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    /// Owned copy of the current frame for handoff.
    #[must_use]
    pub fn snapshot(&self) -> Framebuffer {
        self.fb.snapshot()
    }
}

/// Blanking-flag raster assembler.
///
/// Sync edges are detected against the previous tick's levels: a rising
/// vsync resets both counters and completes the frame, a rising hsync
/// starts the next line. Outside those edges, a non-blanked tick writes
/// the pixel at the current counters and advances horizontally.
pub struct BlankingAssembler {
    fb: Framebuffer,
    x: u32,
    y: u32,
    hsync_edge: EdgeDetector,
    vsync_edge: EdgeDetector,
}

impl BlankingAssembler {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fb: Framebuffer::new(width, height),
            x: 0,
            y: 0,
            hsync_edge: EdgeDetector::new(),
            vsync_edge: EdgeDetector::new(),
        }
    }

    /// Process one pixel-clock tick. Returns true when a rising vsync
    /// completed a frame.
    pub fn tick(&mut self, hsync: bool, vsync: bool, blank: bool, color: u32) -> bool {
        let vsync_edge = self.vsync_edge.update(vsync);
        let hsync_edge = self.hsync_edge.update(hsync);

        if vsync_edge == Edge::Rising {
            self.x = 0;
            self.y = 0;
            return true;
        }
        if hsync_edge == Edge::Rising {
            self.x = 0;
            self.y += 1;
        } else if !blank {
            self.fb.put(self.x, self.y, split_rgb(color));
            self.x += 1;
        }
        false
    }

    /// Raster position (x, y).
    #[must_use]
    pub const fn cursor(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// The live framebuffer. Overwritten in place by subsequent ticks.
    #[must_use]
    pub const fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    /// Owned copy of the current frame for handoff.
    #[must_use]
    pub fn snapshot(&self) -> Framebuffer {
        self.fb.snapshot()
    }
}
