//! The bench driver: one stepping loop tying scheduler, raster assembly
//! and frame-scripted stimulus together.

use std::path::PathBuf;

use sim_core::{
    AudioPin, ClockPin, ClockScheduler, DomainHook, Framebuffer, HardwareModel, KeyboardPort,
    MemoryPort, ResetPin, SyncPulseAssembler, TraceSink, VideoPins,
};

use crate::command::{self, Command, CommandQueue};
use crate::inject::{KeyInjectionSession, SessionStatus};

/// Visible raster window reconstructed from the VIC-II output.
pub const XRES: u32 = 403;
pub const YRES: u32 = 284;

/// Raster ticks between a sync pulse and the visible window.
pub const H_PORCH: i32 = 70;
pub const V_PORCH: i32 = 10;

/// The single pixel clock of the bench.
pub const PIXEL_CLOCK_HZ: f64 = 8e6;

/// Audio is sampled at 50 kHz: every 160th pixel-clock cycle at 8 MHz.
const AUDIO_DIVISOR: u64 = 160;

/// Reset is held for this many whole clock cycles at construction.
const RESET_CYCLES: u64 = 5;

/// What `advance_frame` produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame completed and carries this index.
    Completed(u64),
    /// The model reported its terminal condition before the frame ended.
    Finished,
}

/// Per-run state shared with the clock-domain hook.
pub struct BenchState {
    raster: SyncPulseAssembler,
    frame_ready: bool,
    cycles: u64,
    audio: Vec<i16>,
}

/// Everything a run owns: the model, the scheduler, the raster state, the
/// command queue and the active key-injection session. No ambient state;
/// hosts call [`advance_frame`](C64Bench::advance_frame) one unit of work
/// at a time.
pub struct C64Bench<M> {
    model: M,
    scheduler: ClockScheduler<M, BenchState>,
    state: BenchState,
    queue: CommandQueue,
    session: Option<KeyInjectionSession>,
    frames_completed: u64,
}

impl<M> C64Bench<M>
where
    M: HardwareModel + ClockPin + ResetPin + VideoPins + KeyboardPort + MemoryPort + AudioPin,
{
    /// Build the bench around a model: register the pixel clock, then hold
    /// reset for a few cycles so the model starts from a known state.
    pub fn new(mut model: M, queue: CommandQueue) -> Result<Self, String> {
        let mut scheduler = ClockScheduler::new();

        let hook: DomainHook<M, BenchState> = Box::new(|model, state: &mut BenchState, level| {
            // Full cycle = two toggles; raster and audio advance once per
            // cycle, on the high phase.
            if !level {
                return;
            }
            state.cycles += 1;
            if state
                .raster
                .tick(model.hsync(), model.vsync(), model.color_rgb())
            {
                state.frame_ready = true;
            }
            if state.cycles % AUDIO_DIVISOR == 0 {
                state.audio.push(model.wave());
            }
        });
        scheduler.add_clock(
            Box::new(|m: &mut M, level| m.set_clk(level)),
            PIXEL_CLOCK_HZ,
            0,
            Some(hook),
        )?;

        let mut state = BenchState {
            raster: SyncPulseAssembler::new(XRES, YRES, H_PORCH, V_PORCH),
            frame_ready: false,
            cycles: 0,
            audio: Vec::new(),
        };

        model.set_reset(true);
        for _ in 0..(2 * RESET_CYCLES) {
            scheduler.step_once(&mut model, &mut state);
        }
        model.set_reset(false);

        Ok(Self {
            model,
            scheduler,
            state,
            queue,
            session: None,
            frames_completed: 0,
        })
    }

    /// Step clock edges until the next frame completes, then fire at most
    /// one due scripted command and advance the key-injection session.
    ///
    /// # Errors
    ///
    /// A scripted command that cannot run (missing program file,
    /// out-of-range memory access) aborts the run.
    pub fn advance_frame(&mut self) -> Result<FrameOutcome, String> {
        self.state.frame_ready = false;
        loop {
            if self.model.finished() {
                return Ok(FrameOutcome::Finished);
            }
            self.scheduler.step_once(&mut self.model, &mut self.state);
            if self.state.frame_ready {
                break;
            }
        }

        let frame = self.frames_completed;
        self.frames_completed += 1;

        if let Some(cmd) = self.queue.pop_due(frame) {
            self.execute(cmd)?;
        }
        if let Some(session) = self.session.as_mut() {
            if session.on_frame(frame, &mut self.model) == SessionStatus::Done {
                self.session = None;
            }
        }

        Ok(FrameOutcome::Completed(frame))
    }

    fn execute(&mut self, cmd: Command) -> Result<(), String> {
        match cmd {
            Command::LoadProgram(path) => {
                let addr = command::load_program(&mut self.model, &path)?;
                eprintln!("loaded {} at ${addr:04x}", path.display());
            }
            Command::DumpMemory { address, length } => {
                let listing = command::dump_memory(&self.model, address, length)?;
                print!("{listing}");
            }
            Command::InjectKeys(script) => {
                // A newly fired inject replaces the active session; scripts
                // do not queue behind each other.
                self.session = Some(KeyInjectionSession::new(script));
            }
        }
        Ok(())
    }

    /// Queue a scripted command after construction.
    pub fn queue_command(&mut self, trigger_frame: u64, cmd: Command) {
        self.queue.push(trigger_frame, cmd);
    }

    /// Convenience for hosts loading a program at a frame boundary.
    pub fn queue_program(&mut self, trigger_frame: u64, path: PathBuf) {
        self.queue.push(trigger_frame, Command::LoadProgram(path));
    }

    pub fn set_trace(&mut self, sink: Box<dyn TraceSink>) {
        self.scheduler.set_trace(sink);
    }

    /// The live framebuffer of the current (partially drawn) frame.
    #[must_use]
    pub const fn framebuffer(&self) -> &Framebuffer {
        self.state.raster.framebuffer()
    }

    /// Owned copy of the framebuffer for handoff to the host.
    #[must_use]
    pub fn snapshot_frame(&self) -> Framebuffer {
        self.state.raster.snapshot()
    }

    #[must_use]
    pub fn audio_samples(&self) -> &[i16] {
        &self.state.audio
    }

    /// Whole pixel-clock cycles applied so far (including reset cycles).
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.state.cycles
    }

    #[must_use]
    pub const fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    /// Current simulation time in picoseconds.
    #[must_use]
    pub const fn now_ps(&self) -> u64 {
        self.scheduler.now_ps()
    }

    #[must_use]
    pub fn injection_active(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::match_longest;
    use crate::model::{SCREEN_RAM, SoftModel};

    fn bench() -> C64Bench<SoftModel> {
        C64Bench::new(SoftModel::new(), CommandQueue::new()).expect("valid bench")
    }

    #[test]
    fn frames_complete_with_increasing_indices() {
        let mut bench = bench();
        assert_eq!(bench.advance_frame(), Ok(FrameOutcome::Completed(0)));
        assert_eq!(bench.advance_frame(), Ok(FrameOutcome::Completed(1)));
        assert_eq!(bench.frames_completed(), 2);
    }

    #[test]
    fn finished_model_ends_the_run() {
        let mut model = SoftModel::new();
        model.finish_at_cycle(1_000);
        let mut bench = C64Bench::new(model, CommandQueue::new()).expect("valid bench");
        assert_eq!(bench.advance_frame(), Ok(FrameOutcome::Finished));
    }

    #[test]
    fn inject_command_starts_session_at_trigger_frame() {
        let mut queue = CommandQueue::new();
        queue.push(1, Command::InjectKeys("A".into()));
        let mut bench = C64Bench::new(SoftModel::new(), queue).expect("valid bench");

        bench.advance_frame().expect("frame 0");
        assert!(!bench.injection_active());

        // Frame 1 fires the command and presses the first key in the same
        // frame.
        bench.advance_frame().expect("frame 1");
        assert!(bench.injection_active());
        let expected = match_longest("A").expect("token").mask_bit();
        assert_eq!(bench.model().keyboard_mask(), expected);

        // Release, then the session winds down.
        bench.advance_frame().expect("frame 2");
        assert_eq!(bench.model().keyboard_mask(), 0);
        bench.advance_frame().expect("frame 3");
        assert!(!bench.injection_active());
    }

    #[test]
    fn new_inject_command_replaces_active_session() {
        let mut queue = CommandQueue::new();
        queue.push(0, Command::InjectKeys("AAAAAAAA".into()));
        queue.push(2, Command::InjectKeys("Z".into()));
        let mut bench = C64Bench::new(SoftModel::new(), queue).expect("valid bench");

        let a = match_longest("A").expect("token").mask_bit();
        let z = match_longest("Z").expect("token").mask_bit();

        bench.advance_frame().expect("frame 0");
        assert_eq!(bench.model().keyboard_mask(), a);
        bench.advance_frame().expect("frame 1");
        assert_eq!(bench.model().keyboard_mask(), 0);

        // Frame 2: the second script takes over mid-run; its key goes down
        // instead of the first script's next key.
        bench.advance_frame().expect("frame 2");
        assert_eq!(bench.model().keyboard_mask(), z);

        bench.advance_frame().expect("frame 3");
        assert_eq!(bench.model().keyboard_mask(), 0);
        bench.advance_frame().expect("frame 4");
        assert!(!bench.injection_active());
    }

    #[test]
    fn dump_command_errors_propagate() {
        let mut queue = CommandQueue::new();
        queue.push(
            0,
            Command::DumpMemory {
                address: 0xFFF0,
                length: 0x100,
            },
        );
        let mut bench = C64Bench::new(SoftModel::new(), queue).expect("valid bench");
        assert!(bench.advance_frame().is_err());
    }

    #[test]
    fn loaded_screen_ram_reaches_the_framebuffer() {
        let mut bench = bench();
        bench.model_mut().mem_mut()[SCREEN_RAM] = 0x01; // white cell

        bench.advance_frame().expect("frame 0");
        bench.advance_frame().expect("frame 1");

        // Text window starts at raster (110, 40); minus the porch that is
        // framebuffer (40, 30).
        let fb = bench.framebuffer();
        assert_eq!(fb.get(40, 30), Some([0xFF, 0xFF, 0xFF]));
        // A border pixel stays border-coloured.
        assert_eq!(fb.get(0, 0), Some([0x6C, 0x5E, 0xB5]));
    }

    #[test]
    fn audio_sampled_at_fixed_divisor() {
        let mut bench = bench();
        bench.advance_frame().expect("frame");
        let cycles = bench.cycles();
        assert_eq!(bench.audio_samples().len() as u64, cycles / 160);
    }
}
