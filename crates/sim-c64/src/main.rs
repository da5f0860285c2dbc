//! C64 testbench binary.
//!
//! Runs the bench headless against the software model: frame-scripted
//! commands from the command line, optional PNG snapshots of a frame
//! range, a signal trace file, and a WAV dump of the audio tap at exit.

use std::error::Error;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};
use std::{fs, thread};

use sim_c64::{C64Bench, Command, CommandQueue, FrameOutcome, SoftModel, capture};
use sim_core::WriteTrace;

const TRACE_FILE: &str = "dump.trace";
const AUDIO_FILE: &str = "out.wav";

struct CliArgs {
    frame_ms: Option<u64>,
    save_from: Option<u64>,
    save_to: Option<u64>,
    save_prefix: String,
    exit_after_frame: Option<u64>,
    exit_after_cycle: Option<u64>,
    trace: bool,
    commands: Vec<(u64, Command)>,
}

fn usage() {
    eprintln!("Usage: sim-c64 [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scale=<n>                 Display scale factor (ignored headless)");
    eprintln!("  --frame-rate=<ms>           Pace the run to one frame per <ms> milliseconds");
    eprintln!("  --save-frame-from=<frame>   First frame to save as PNG");
    eprintln!("  --save-frame-to=<frame>     Last frame to save as PNG");
    eprintln!("  --save-frame-prefix=<name>  Snapshot filename prefix [default: frame]");
    eprintln!("  --exit-after-frame=<n>      Stop once frame <n> has completed");
    eprintln!("  --exit-after-cycle=<n>      Stop once this many clock cycles have run");
    eprintln!("  --trace                     Write signal toggles to {TRACE_FILE}");
    eprintln!("  --cmd-load-prg=<frame>:<file>");
    eprintln!("                              Load a PRG image at the given frame");
    eprintln!("  --cmd-inject-keys=<frame>:<keys>");
    eprintln!("                              Start typing a key script at the given frame");
    eprintln!("  --cmd-dump-ram=<frame>:<addr>:<len>");
    eprintln!("                              Hex-dump memory at the given frame");
}

fn bail(msg: &str) -> ! {
    eprintln!("{msg}");
    usage();
    process::exit(1);
}

/// Parse a number, accepting a `0x` prefix for hexadecimal.
fn parse_num<T: TryFrom<u64>>(s: &str, what: &str) -> T {
    let parsed = s
        .strip_prefix("0x")
        .map_or_else(|| s.parse::<u64>().ok(), |hex| u64::from_str_radix(hex, 16).ok());
    match parsed.and_then(|n| T::try_from(n).ok()) {
        Some(n) => n,
        None => bail(&format!("invalid {what}: {s}")),
    }
}

fn parse_args() -> CliArgs {
    let mut cli = CliArgs {
        frame_ms: None,
        save_from: None,
        save_to: None,
        save_prefix: "frame".into(),
        exit_after_frame: None,
        exit_after_cycle: None,
        trace: false,
        commands: Vec::new(),
    };

    for arg in std::env::args().skip(1) {
        let (flag, value) = match arg.split_once('=') {
            Some((f, v)) => (f.to_owned(), Some(v.to_owned())),
            None => (arg, None),
        };
        let value_of = |what: &str| match &value {
            Some(v) => v.clone(),
            None => bail(&format!("{what} requires a value: {flag}=<...>")),
        };

        match flag.as_str() {
            // Only meaningful to a windowed host; accepted for script
            // compatibility.
            "--scale" => {
                let _: u64 = parse_num(&value_of("scale"), "scale");
            }
            "--frame-rate" => {
                cli.frame_ms = Some(parse_num(&value_of("frame period"), "frame period"));
            }
            "--save-frame-from" => cli.save_from = Some(parse_num(&value_of("frame"), "frame")),
            "--save-frame-to" => cli.save_to = Some(parse_num(&value_of("frame"), "frame")),
            "--save-frame-prefix" => cli.save_prefix = value_of("prefix"),
            "--exit-after-frame" => {
                cli.exit_after_frame = Some(parse_num(&value_of("frame"), "frame"));
            }
            "--exit-after-cycle" => {
                cli.exit_after_cycle = Some(parse_num(&value_of("cycle"), "cycle"));
            }
            "--trace" => cli.trace = true,
            "--cmd-load-prg" => {
                let v = value_of("command");
                let Some((frame, path)) = v.split_once(':') else {
                    bail(&format!("expected <frame>:<file>, got {v}"));
                };
                cli.commands.push((
                    parse_num(frame, "frame"),
                    Command::LoadProgram(PathBuf::from(path)),
                ));
            }
            "--cmd-inject-keys" => {
                let v = value_of("command");
                let Some((frame, keys)) = v.split_once(':') else {
                    bail(&format!("expected <frame>:<keys>, got {v}"));
                };
                cli.commands
                    .push((parse_num(frame, "frame"), Command::InjectKeys(keys.into())));
            }
            "--cmd-dump-ram" => {
                let v = value_of("command");
                let parts: Vec<&str> = v.splitn(3, ':').collect();
                let &[frame, addr, len] = parts.as_slice() else {
                    bail(&format!("expected <frame>:<addr>:<len>, got {v}"));
                };
                cli.commands.push((
                    parse_num(frame, "frame"),
                    Command::DumpMemory {
                        address: parse_num(addr, "address"),
                        length: parse_num(len, "length"),
                    },
                ));
            }
            "--help" | "-h" => {
                usage();
                process::exit(0);
            }
            other => bail(&format!("unknown argument: {other}")),
        }
    }

    cli
}

/// True once `frame` is the configured final frame: the run stops after
/// frame number `n` completes, not after `n` frames.
fn exit_frame_reached(exit_after: Option<u64>, frame: u64) -> bool {
    exit_after.is_some_and(|n| frame >= n)
}

fn snapshot_path(prefix: &str, frame: u64) -> PathBuf {
    PathBuf::from(format!("{prefix}_{frame:03}.png"))
}

fn run(cli: &CliArgs) -> Result<(), Box<dyn Error>> {
    let mut queue = CommandQueue::new();
    for (frame, command) in &cli.commands {
        queue.push(*frame, command.clone());
    }

    let mut model = SoftModel::new();
    if let Some(cycle) = cli.exit_after_cycle {
        model.finish_at_cycle(cycle);
    }
    let mut bench = C64Bench::new(model, queue)?;

    if cli.trace {
        let file = fs::File::create(TRACE_FILE)?;
        bench.set_trace(Box::new(WriteTrace::new(BufWriter::new(file))));
    }

    let frame_period = cli.frame_ms.map(Duration::from_millis);
    let mut last_frame = Instant::now();

    loop {
        match bench.advance_frame()? {
            FrameOutcome::Finished => {
                eprintln!("model finished at cycle {}", bench.cycles());
                break;
            }
            FrameOutcome::Completed(frame) => {
                let in_range = cli.save_from.is_none_or(|from| frame >= from)
                    && cli.save_to.is_none_or(|to| frame <= to);
                if (cli.save_from.is_some() || cli.save_to.is_some()) && in_range {
                    let path = snapshot_path(&cli.save_prefix, frame);
                    capture::save_screenshot(bench.framebuffer(), &path)?;
                }

                if exit_frame_reached(cli.exit_after_frame, frame) {
                    break;
                }

                if let Some(period) = frame_period {
                    let elapsed = last_frame.elapsed();
                    if elapsed < period {
                        thread::sleep(period - elapsed);
                    }
                    last_frame = Instant::now();
                }
            }
        }
    }

    if !bench.audio_samples().is_empty() {
        capture::save_audio(bench.audio_samples(), std::path::Path::new(AUDIO_FILE))?;
        eprintln!("audio saved to {AUDIO_FILE}");
    }
    eprintln!(
        "ran {} frames, {} cycles, {} ps",
        bench.frames_completed(),
        bench.cycles(),
        bench.now_ps()
    );

    Ok(())
}

fn main() {
    let cli = parse_args();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
