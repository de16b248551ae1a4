//! Fixed-rate control loop.
//!
//! Calls [`Superstructure::tick`] once per configured period until the
//! shutdown flag drops or a cycle limit is reached.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to an isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`: RT priority.
//!
//! ## Pacing
//! With the `rt` feature the loop sleeps on absolute `CLOCK_MONOTONIC`
//! deadlines; otherwise `std::thread::sleep` for the remaining time.
//! Overruns are counted and logged, never fatal: a late tick is still a
//! tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

use crate::superstructure::Superstructure;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Running sum of squares for stddev computation.
    pub sum_sq_cycle_ns: i128,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            sum_sq_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.sum_sq_cycle_ns += (duration_ns as i128) * (duration_ns as i128);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }

    /// Standard deviation of the cycle time [ns] (0 if no cycles).
    pub fn stddev_cycle_ns(&self) -> f64 {
        if self.cycle_count == 0 {
            return 0.0;
        }
        let n = self.cycle_count as f64;
        let mean = self.sum_cycle_ns as f64 / n;
        let variance = self.sum_sq_cycle_ns as f64 / n - mean * mean;
        variance.max(0.0).sqrt()
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors during RT setup or loop timing.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Monotonic clock unavailable.
    #[error("Clock error: {0}")]
    Clock(String),
}

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop never faults it in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup. All calls are no-ops without the `rt` feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

pub struct CycleRunner {
    superstructure: Superstructure,
    running: Arc<AtomicBool>,
    enabled: Arc<AtomicBool>,
    stats: CycleStats,
    period_ns: i64,
    max_cycles: Option<u64>,
}

impl CycleRunner {
    /// Wrap `superstructure`, ticking every `period_s` seconds.
    ///
    /// The robot starts enabled.
    pub fn new(superstructure: Superstructure, period_s: f64) -> Self {
        Self {
            superstructure,
            running: Arc::new(AtomicBool::new(true)),
            enabled: Arc::new(AtomicBool::new(true)),
            stats: CycleStats::new(),
            period_ns: (period_s * 1e9).round() as i64,
            max_cycles: None,
        }
    }

    /// Stop after `cycles` ticks.
    pub fn with_cycle_limit(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Shutdown flag: clearing it ends [`Self::run`] after the current tick.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Externally owned enable signal.
    pub fn enable_flag(&self) -> Arc<AtomicBool> {
        self.enabled.clone()
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn superstructure(&self) -> &Superstructure {
        &self.superstructure
    }

    pub fn superstructure_mut(&mut self) -> &mut Superstructure {
        &mut self.superstructure
    }

    fn should_continue(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    fn cycle_body(&mut self) {
        let enabled = self.enabled.load(Ordering::Relaxed);
        self.superstructure.tick(enabled);
    }

    fn check_overrun(&mut self, duration_ns: i64) {
        if duration_ns > self.period_ns {
            self.stats.overruns += 1;
            warn!(
                "Cycle overrun #{}: {duration_ns}ns > {}ns budget",
                self.stats.overruns, self.period_ns
            );
        }
    }

    /// Run until shut down or the cycle limit is reached.
    pub fn run(&mut self) -> Result<(), CycleError> {
        info!(
            "Entering control loop (period={}ns, limit={:?})",
            self.period_ns, self.max_cycles
        );

        #[cfg(feature = "rt")]
        self.run_rt_loop()?;

        #[cfg(not(feature = "rt"))]
        self.run_sim_loop();

        info!(
            "Control loop stopped after {} cycles (avg={}ns, max={}ns, overruns={})",
            self.stats.cycle_count,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns,
            self.stats.overruns
        );
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = |clock: ClockId| clock_gettime(clock).map_err(|e| CycleError::Clock(e.to_string()));
        let mut next_wake = now(clock)?;

        while self.should_continue() {
            next_wake = timespec_add_ns(next_wake, self.period_ns);

            let cycle_start = now(clock)?;
            self.cycle_body();
            let cycle_end = now(clock)?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            let latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();
            self.stats.record(duration_ns, latency_ns);
            self.check_overrun(duration_ns);

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.period_ns.max(0) as u64);
        while self.should_continue() {
            let cycle_start = Instant::now();
            self.cycle_body();
            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;

            self.stats.record(duration_ns, 0);
            self.check_overrun(duration_ns);

            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
