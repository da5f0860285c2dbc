//! Frame-scripted commands.
//!
//! Commands are declared up front (normally on the command line), each
//! bound to a trigger frame. On every completed frame the bench fires at
//! most one command whose trigger has been reached; overdue commands drain
//! one per frame in declaration order.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sim_core::MemoryPort;

/// Zero-page (plus $AE/$AF) pointer pairs patched after a program load,
/// (low byte, high byte) each. These are the BASIC bookkeeping pointers:
/// start of variables, start and end of arrays, and the end address left
/// behind by LOAD. Without the patch the loaded program is invisible to
/// the interpreter.
pub const BASIC_AREA_POINTERS: [(u16, u16); 4] =
    [(0x2D, 0x2E), (0x2F, 0x30), (0x31, 0x32), (0xAE, 0xAF)];

/// A scripted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a program image (2-byte LE load address + payload) into the
    /// model's memory and patch the BASIC area pointers.
    LoadProgram(PathBuf),
    /// Print a hex listing of model memory.
    DumpMemory { address: u16, length: u16 },
    /// Start injecting the given key script.
    InjectKeys(String),
}

/// Commands ordered by trigger frame, declaration order breaking ties.
#[derive(Default)]
pub struct CommandQueue {
    commands: VecDeque<(u64, Command)>,
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: VecDeque::new(),
        }
    }

    /// Insert a command, keeping the queue sorted by trigger frame with
    /// stable order among equal triggers.
    pub fn push(&mut self, trigger_frame: u64, command: Command) {
        let pos = self
            .commands
            .iter()
            .position(|&(f, _)| f > trigger_frame)
            .unwrap_or(self.commands.len());
        self.commands.insert(pos, (trigger_frame, command));
    }

    /// Take the head command if its trigger frame has been reached.
    ///
    /// Call once per completed frame: even with several overdue commands,
    /// only one fires per frame.
    pub fn pop_due(&mut self, completed_frame: u64) -> Option<Command> {
        match self.commands.front() {
            Some(&(trigger, _)) if completed_frame >= trigger => {
                self.commands.pop_front().map(|(_, c)| c)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Load a program file into the model's memory image.
///
/// Returns the load address.
///
/// # Errors
///
/// Missing or unreadable files and images that do not fit the memory span
/// are reported as errors; nothing is written in that case.
pub fn load_program<M: MemoryPort>(model: &mut M, path: &Path) -> Result<u16, String> {
    let data = std::fs::read(path)
        .map_err(|e| format!("cannot read program file {}: {e}", path.display()))?;
    load_program_bytes(model, &data)
}

/// Load a program image (2-byte LE load address + payload) from memory.
pub fn load_program_bytes<M: MemoryPort>(model: &mut M, data: &[u8]) -> Result<u16, String> {
    if data.len() < 3 {
        return Err(format!(
            "program image too short: {} bytes (need load address + payload)",
            data.len()
        ));
    }
    let start = u16::from(data[0]) | (u16::from(data[1]) << 8);
    let payload = &data[2..];

    let mem = model.mem_mut();
    let end = start as usize + payload.len();
    if end > mem.len() {
        return Err(format!(
            "program does not fit: ${start:04x}..${end:04x} exceeds {} byte memory",
            mem.len()
        ));
    }
    mem[start as usize..end].copy_from_slice(payload);

    let end_addr = start.wrapping_add(payload.len() as u16);
    for (lo, hi) in BASIC_AREA_POINTERS {
        mem[lo as usize] = (end_addr & 0xFF) as u8;
        mem[hi as usize] = (end_addr >> 8) as u8;
    }
    Ok(start)
}

/// Render a hex listing of model memory: sixteen bytes per line, each line
/// prefixed with its running address.
pub fn dump_memory<M: MemoryPort>(model: &M, address: u16, length: u16) -> Result<String, String> {
    let mem = model.mem();
    let end = address as usize + length as usize;
    if end > mem.len() {
        return Err(format!(
            "dump range ${address:04x}+{length} exceeds {} byte memory",
            mem.len()
        ));
    }

    let mut out = String::new();
    for i in 0..length {
        if i % 16 == 0 {
            if i != 0 {
                out.push('\n');
            }
            let _ = write!(out, "{:04x}:", address + i);
        }
        let _ = write!(out, " {:02x}", mem[address as usize + i as usize]);
    }
    if length > 0 {
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MemModel {
        ram: Vec<u8>,
    }

    impl MemModel {
        fn new() -> Self {
            Self {
                ram: vec![0; 0x10000],
            }
        }
    }

    impl MemoryPort for MemModel {
        fn mem(&self) -> &[u8] {
            &self.ram
        }

        fn mem_mut(&mut self) -> &mut [u8] {
            &mut self.ram
        }
    }

    fn cmd(n: u32) -> Command {
        Command::DumpMemory {
            address: n as u16,
            length: 1,
        }
    }

    #[test]
    fn one_command_per_frame_fifo_ties() {
        let mut queue = CommandQueue::new();
        queue.push(2, cmd(0));
        queue.push(2, cmd(1));
        queue.push(5, cmd(2));

        assert_eq!(queue.pop_due(0), None);
        assert_eq!(queue.pop_due(1), None);
        // Frame 2: only the first of the two frame-2 commands fires.
        assert_eq!(queue.pop_due(2), Some(cmd(0)));
        // Frame 3: the overdue second one fires.
        assert_eq!(queue.pop_due(3), Some(cmd(1)));
        assert_eq!(queue.pop_due(4), None);
        assert_eq!(queue.pop_due(5), Some(cmd(2)));
        assert!(queue.is_empty());
    }

    #[test]
    fn out_of_order_declaration_sorts_by_trigger() {
        let mut queue = CommandQueue::new();
        queue.push(9, cmd(0));
        queue.push(3, cmd(1));
        assert_eq!(queue.pop_due(10), Some(cmd(1)));
        assert_eq!(queue.pop_due(11), Some(cmd(0)));
    }

    #[test]
    fn load_program_writes_payload_and_pointers() {
        let mut model = MemModel::new();
        // Load address $2000, payload [AA, BB] -> end address $2002.
        let image = [0x00, 0x20, 0xAA, 0xBB];
        let start = load_program_bytes(&mut model, &image).expect("load");
        assert_eq!(start, 0x2000);
        assert_eq!(model.ram[0x2000], 0xAA);
        assert_eq!(model.ram[0x2001], 0xBB);

        for (lo, hi) in BASIC_AREA_POINTERS {
            assert_eq!(model.ram[lo as usize], 0x02, "low byte at ${lo:02x}");
            assert_eq!(model.ram[hi as usize], 0x20, "high byte at ${hi:02x}");
        }
    }

    #[test]
    fn load_program_rejects_short_image() {
        let mut model = MemModel::new();
        assert!(load_program_bytes(&mut model, &[0x00, 0x20]).is_err());
    }

    #[test]
    fn load_program_rejects_overflowing_image() {
        let mut model = MemModel::new();
        let mut image = vec![0xFE, 0xFF]; // load at $FFFE
        image.extend_from_slice(&[1, 2, 3]);
        assert!(load_program_bytes(&mut model, &image).is_err());
        // Nothing written.
        assert_eq!(model.ram[0xFFFE], 0);
        assert_eq!(model.ram[0x2D], 0);
    }

    #[test]
    fn load_program_missing_file_is_an_error() {
        let mut model = MemModel::new();
        let err = load_program(&mut model, Path::new("/no/such/file.prg"));
        assert!(err.is_err());
    }

    #[test]
    fn dump_seventeen_bytes_is_two_lines() {
        let mut model = MemModel::new();
        for i in 0..17 {
            model.ram[0x0400 + i] = i as u8;
        }
        let listing = dump_memory(&model, 0x0400, 17).expect("dump");
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0400:"));
        assert!(lines[1].starts_with("0410:"));
        assert_eq!(lines[1], "0410: 10");
    }

    #[test]
    fn dump_formats_sixteen_bytes_per_line() {
        let mut model = MemModel::new();
        model.ram[0] = 0xAB;
        let listing = dump_memory(&model, 0x0000, 16).expect("dump");
        assert_eq!(
            listing,
            "0000: ab 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00\n"
        );
    }

    #[test]
    fn dump_out_of_range_is_an_error() {
        let model = MemModel::new();
        assert!(dump_memory(&model, 0xFFF0, 0x20).is_err());
    }
}
