use std::thread::sleep;
use std::time::{Duration, Instant};

/// Target clock rate of the machine.
pub const DEFAULT_CLOCK_HZ: u64 = 20_000_000;

/// Duration of a single instruction at `hz`. `None` if pacing is disabled (`hz == 0`) or the
/// rate is too fast to express in nanoseconds.
pub fn cycle_duration(hz: u64) -> Option<Duration> {
    if hz == 0 {
        return None;
    }
    let nanos = 1_000_000_000 / hz;
    (nanos > 0).then(|| Duration::from_nanos(nanos))
}

/// Throttles execution to a target rate by sleeping off the rest of each instruction's cycle.
///
/// Pacing is advisory: a slow host simply runs below the target, and sleeps shorter than the host
/// timer resolution are rounded up by the OS.
#[derive(Debug)]
pub struct Pacer {
    cycle: Option<Duration>,
    last: Instant,
}

impl Pacer {
    pub fn new(hz: u64) -> Self {
        Pacer {
            cycle: cycle_duration(hz),
            last: Instant::now(),
        }
    }

    /// Run as fast as possible.
    pub fn unpaced() -> Self {
        Pacer::new(0)
    }

    pub fn cycle(&self) -> Option<Duration> {
        self.cycle
    }

    /// Call once after every executed instruction.
    pub fn tick(&mut self) {
        if let Some(cycle) = self.cycle {
            let elapsed = self.last.elapsed();
            if elapsed < cycle {
                sleep(cycle - elapsed);
            }
        }
        self.last = Instant::now();
    }
}
