//! Trace sinks for signal-toggle dumps.
//!
//! The real waveform writer lives with the model (a Verilated VCD dumper
//! knows the model's internals); the scheduler only drives it. What must be
//! preserved for trace-file compatibility is the ordering: two dumps per
//! toggle, timestamped with a monotonically increasing integer tick.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Receives one call per trace point with the integer timestamp.
pub trait TraceSink {
    fn sample(&mut self, timestamp: u64);
}

/// Records timestamps into a shared vector. Test support.
pub struct VecTrace {
    samples: Rc<RefCell<Vec<u64>>>,
}

impl VecTrace {
    #[must_use]
    pub fn shared(samples: Rc<RefCell<Vec<u64>>>) -> Self {
        Self { samples }
    }
}

impl TraceSink for VecTrace {
    fn sample(&mut self, timestamp: u64) {
        self.samples.borrow_mut().push(timestamp);
    }
}

/// Writes one line per trace point to any `Write` target.
///
/// Write errors are reported once on stderr and further samples dropped;
/// a failing trace file must not abort the simulation run.
pub struct WriteTrace<W: Write> {
    out: W,
    failed: bool,
}

impl<W: Write> WriteTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }
}

impl<W: Write> TraceSink for WriteTrace<W> {
    fn sample(&mut self, timestamp: u64) {
        if self.failed {
            return;
        }
        if let Err(e) = writeln!(self.out, "#{timestamp}") {
            eprintln!("trace write failed, disabling trace: {e}");
            self.failed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_trace_formats_timestamps() {
        let mut buf = Vec::new();
        {
            let mut trace = WriteTrace::new(&mut buf);
            trace.sample(0);
            trace.sample(1);
            trace.sample(2);
        }
        assert_eq!(String::from_utf8(buf).expect("utf8"), "#0\n#1\n#2\n");
    }

    #[test]
    fn vec_trace_records() {
        let samples = Rc::new(RefCell::new(Vec::new()));
        let mut trace = VecTrace::shared(Rc::clone(&samples));
        trace.sample(7);
        trace.sample(8);
        assert_eq!(*samples.borrow(), vec![7, 8]);
    }
}
