//! Chunked program upload over a control channel.
//!
//! The in-band path ([`command::load_program`](crate::command::load_program))
//! pokes RAM directly through the memory port. This module is the
//! out-of-band alternative: the program travels over a transfer channel
//! (USB bulk endpoint, debug link) in bounded chunks, and the BASIC area
//! pointers are patched last so an interrupted upload never leaves the
//! interpreter pointing into half-written memory.

use crate::command::BASIC_AREA_POINTERS;

/// Payload bytes per transfer: the 2 KiB endpoint buffer minus the
/// 8-byte transfer header.
pub const CHUNK_BYTES: usize = 2048 - 8;

/// A failed transfer is retried this many times before the upload aborts.
const MAX_RETRIES: u32 = 3;

/// Write access to the target's memory over some transfer medium.
pub trait ControlChannel {
    /// Write `data` starting at `addr`.
    ///
    /// # Errors
    ///
    /// Transfer errors are transient from the loader's point of view; it
    /// retries a bounded number of times.
    fn mem_write(&mut self, addr: u16, data: &[u8]) -> Result<(), String>;
}

/// Whether the upload still has transfers pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderStatus {
    Busy,
    Done,
}

/// One program upload, advanced one transfer per [`step`](Self::step).
pub struct ChunkedLoader {
    payload: Vec<u8>,
    start: u16,
    offset: usize,
    pointer_idx: usize,
    retries: u32,
}

impl ChunkedLoader {
    /// Parse a PRG image: a little-endian load address followed by the
    /// payload.
    ///
    /// # Errors
    ///
    /// Rejects images too short to carry the header plus at least one
    /// payload byte, and images whose payload would run past the 64 KiB
    /// address space.
    pub fn from_prg(image: &[u8]) -> Result<Self, String> {
        if image.len() < 3 {
            return Err(format!(
                "program image is {} bytes, need a 2-byte load address plus payload",
                image.len()
            ));
        }
        let start = u16::from_le_bytes([image[0], image[1]]);
        let payload = image[2..].to_vec();
        let end = usize::from(start) + payload.len();
        if end > 0x10000 {
            return Err(format!(
                "program at ${start:04x} with {} payload bytes runs past $ffff",
                payload.len()
            ));
        }
        Ok(Self {
            payload,
            start,
            offset: 0,
            pointer_idx: 0,
            retries: 0,
        })
    }

    /// Load address from the image header.
    #[must_use]
    pub const fn start_address(&self) -> u16 {
        self.start
    }

    /// First address past the payload; the value patched into the BASIC
    /// area pointers.
    #[must_use]
    pub fn end_address(&self) -> u16 {
        (usize::from(self.start) + self.payload.len()) as u16
    }

    /// Issue the next transfer: a payload chunk, or once the payload is
    /// through, one BASIC area pointer pair per step.
    ///
    /// # Errors
    ///
    /// A transfer that keeps failing past the retry cap aborts the upload.
    pub fn step(&mut self, channel: &mut impl ControlChannel) -> Result<LoaderStatus, String> {
        if self.offset < self.payload.len() {
            let chunk_end = usize::min(self.offset + CHUNK_BYTES, self.payload.len());
            let addr = (usize::from(self.start) + self.offset) as u16;
            self.transfer(channel, addr, self.offset..chunk_end)?;
            self.offset = chunk_end;
            return Ok(LoaderStatus::Busy);
        }

        if self.pointer_idx < BASIC_AREA_POINTERS.len() {
            let (lo_addr, _) = BASIC_AREA_POINTERS[self.pointer_idx];
            let end = self.end_address().to_le_bytes();
            match channel.mem_write(lo_addr, &end) {
                Ok(()) => {
                    self.retries = 0;
                    self.pointer_idx += 1;
                }
                Err(e) => self.retry(e)?,
            }
            return Ok(if self.pointer_idx < BASIC_AREA_POINTERS.len() {
                LoaderStatus::Busy
            } else {
                LoaderStatus::Done
            });
        }

        Ok(LoaderStatus::Done)
    }

    /// Run the whole upload to completion.
    ///
    /// # Errors
    ///
    /// Propagates the first transfer failure that exhausts its retries.
    pub fn run(&mut self, channel: &mut impl ControlChannel) -> Result<(), String> {
        while self.step(channel)? == LoaderStatus::Busy {}
        Ok(())
    }

    fn transfer(
        &mut self,
        channel: &mut impl ControlChannel,
        addr: u16,
        range: std::ops::Range<usize>,
    ) -> Result<(), String> {
        // Retries re-send the same chunk; offset only moves on success.
        loop {
            match channel.mem_write(addr, &self.payload[range.clone()]) {
                Ok(()) => {
                    self.retries = 0;
                    return Ok(());
                }
                Err(e) => self.retry(e)?,
            }
        }
    }

    fn retry(&mut self, error: String) -> Result<(), String> {
        self.retries += 1;
        if self.retries > MAX_RETRIES {
            return Err(format!(
                "transfer failed after {MAX_RETRIES} retries: {error}"
            ));
        }
        eprintln!("transfer error ({error}), retry {} of {MAX_RETRIES}", self.retries);
        Ok(())
    }
}
