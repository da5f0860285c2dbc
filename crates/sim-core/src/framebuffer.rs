//! RGB framebuffer reconstructed from raster timing.

/// One pixel: red, green, blue.
pub type Rgb = [u8; 3];

/// A width x height grid of RGB triples.
///
/// The raster assemblers overwrite one live buffer in place as the beam
/// sweeps. Hosts that hold on to a completed frame (PNG writers, GUI
/// textures) must take a `snapshot()`; handing out a reference to the live
/// buffer across a frame boundary would let the next frame scribble over
/// a frame still being consumed.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Framebuffer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0]; (width * height) as usize],
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Write a pixel. Out-of-range coordinates are discarded without error;
    /// the beam spends most of its time outside the visible window.
    pub fn put(&mut self, x: u32, y: u32, rgb: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = rgb;
        }
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Row-major pixel data.
    #[must_use]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Owned copy for handoff to the host.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}
