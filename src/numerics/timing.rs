#![allow(unused)]
use std::cell::RefCell;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Host,
    Closures,
    Membrane,
    Accumulation,
}

impl Phase {
    const ALL: [Phase; 4] = [
        Phase::Host,
        Phase::Closures,
        Phase::Membrane,
        Phase::Accumulation,
    ];

    fn label(self) -> &'static str {
        match self {
            Phase::Host => "Host advance",
            Phase::Closures => "Closures",
            Phase::Membrane => "Membrane model",
            Phase::Accumulation => "Accumulation",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Default, Clone)]
pub struct TimingStats {
    pub phase_times: [Vec<Duration>; 4],
    pub total_time: Duration,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self, phase: Phase) -> Duration {
        self.phase_times[phase.slot()].iter().sum()
    }

    #[cfg(feature = "timing")]
    pub fn print_summary(&self) {
        if self.phase_times.iter().all(Vec::is_empty) {
            return;
        }
        let accounted: Duration = Phase::ALL.iter().map(|&p| self.total(p)).sum();
        let overhead = self.total_time.saturating_sub(accounted);

        println!("\n{}", "=".repeat(60));
        println!("{:^60}", "STEP TIMING SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Total run time:                {:.3}s",
            self.total_time.as_secs_f64()
        );
        println!("{}", "-".repeat(60));
        for phase in Phase::ALL {
            let calls = self.phase_times[phase.slot()].len();
            if calls == 0 {
                continue;
            }
            let total_ms = self.total(phase).as_secs_f64() * 1000.0;
            println!(
                "  {:<26}{:>9.3}ms  (avg: {:>9.3}ms, {} calls)",
                phase.label(),
                total_ms,
                total_ms / calls as f64,
                calls
            );
        }
        println!("{}", "-".repeat(60));
        println!(
            "Overhead/Other:                {:>9.3}ms\n",
            overhead.as_secs_f64() * 1000.0
        );
    }

    #[cfg(not(feature = "timing"))]
    pub fn print_summary(&self) {}
}

#[cfg(feature = "timing")]
thread_local! {
    static TIMING_STATS: RefCell<TimingStats> = RefCell::new(TimingStats::new());
}

#[cfg(feature = "timing")]
pub fn reset_timing() {
    TIMING_STATS.with(|stats| {
        *stats.borrow_mut() = TimingStats::new();
    });
}

#[cfg(not(feature = "timing"))]
pub fn reset_timing() {}

#[cfg(feature = "timing")]
pub fn record_phase<F, R>(phase: Phase, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = std::time::Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    TIMING_STATS.with(|stats| {
        stats.borrow_mut().phase_times[phase.slot()].push(elapsed);
    });
    result
}

#[cfg(not(feature = "timing"))]
pub fn record_phase<F, R>(_phase: Phase, f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn finalize_timing(total_time: Duration) -> TimingStats {
    TIMING_STATS.with(|stats| {
        let mut s = stats.borrow_mut();
        s.total_time = total_time;
        s.clone()
    })
}

#[cfg(not(feature = "timing"))]
pub fn finalize_timing(_total_time: Duration) -> TimingStats {
    TimingStats::new()
}

pub fn finalize_and_print(total_time: Duration) {
    finalize_timing(total_time).print_summary();
}
