//! Fixed-rate poll → format → draw loop

use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::counters::{CounterSession, PerfQuery, SysinfoQuery};
use crate::format::{cpu_line, total_ram_line, used_ram_line};
use crate::memory::{MemorySampler, MemorySource, MemoryUsage, SysinfoMemory};
use crate::overlay::{Overlay, WindowStatus};

/// Caps how often frames are produced.
///
/// After each frame, [`FrameLimiter::wait`] sleeps for whatever is left of
/// the frame period since the previous frame, then restarts its clock.
#[derive(Debug)]
pub struct FrameLimiter {
    frame_time: Option<Duration>,
    last_frame: Instant,
}

impl FrameLimiter {
    /// `fps == 0` disables the cap.
    pub fn new(fps: u32) -> Self {
        let frame_time = (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64));
        Self {
            frame_time,
            last_frame: Instant::now(),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn frame_time(&self) -> Option<Duration> {
        self.frame_time
    }

    pub fn wait(&mut self) {
        if let Some(frame_time) = self.frame_time {
            let elapsed = self.last_frame.elapsed();
            if elapsed < frame_time {
                thread::sleep(frame_time - elapsed);
            }
        }
        self.last_frame = Instant::now();
    }
}

/// One tick's worth of readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSample {
    pub cpu_percent: i32,
    pub memory: Option<MemoryUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub ticks: u64,
    pub renders: u64,
    pub failed_renders: u64,
}

/// Everything the loop samples from, constructed at startup and handed in
/// explicitly.
pub struct MonitorContext<Q: PerfQuery, M: MemorySource> {
    pub session: CounterSession<Q>,
    pub memory: MemorySampler<M>,
}

impl<Q: PerfQuery, M: MemorySource> MonitorContext<Q, M> {
    pub fn new(query: Q, memory: M) -> Self {
        Self {
            session: CounterSession::new(query),
            memory: MemorySampler::new(memory),
        }
    }

    /// Opens the counter session. Failure leaves sampling disabled.
    pub fn open(&mut self) -> bool {
        match self.session.open() {
            Ok(()) => true,
            Err(e) => {
                warn!("CPU sampling disabled: {}", e);
                false
            }
        }
    }

    pub fn sample(&mut self) -> MetricSample {
        MetricSample {
            cpu_percent: self.session.sample_cpu(),
            memory: self.memory.sample(),
        }
    }

    pub fn shutdown(&mut self) {
        self.session.close();
    }
}

impl Default for MonitorContext<SysinfoQuery, SysinfoMemory> {
    fn default() -> Self {
        Self::new(SysinfoQuery::new(), SysinfoMemory::new())
    }
}

fn apply_sample<O: Overlay + ?Sized>(overlay: &mut O, sample: &MetricSample) {
    overlay.set_cpu_text(cpu_line(sample.cpu_percent));
    overlay.set_total_ram_text(total_ram_line(sample.memory.map(|m| m.total)));
    overlay.set_used_ram_text(used_ram_line(sample.memory.map(|m| m.used)));
}

/// Runs ticks until the overlay reports a close request.
///
/// The counter session is neither opened nor closed here.
pub fn run_monitor<Q, M, O>(
    ctx: &mut MonitorContext<Q, M>,
    overlay: &mut O,
    limiter: &mut FrameLimiter,
) -> LoopReport
where
    Q: PerfQuery,
    M: MemorySource,
    O: Overlay + ?Sized,
{
    let mut state = LoopState::Running;
    let mut report = LoopReport::default();

    while state == LoopState::Running {
        report.ticks += 1;

        if overlay.pump_events() == WindowStatus::CloseRequested {
            info!("Close requested on tick {}", report.ticks);
            state = LoopState::Stopped;
            continue;
        }

        let sample = ctx.sample();
        apply_sample(overlay, &sample);

        report.renders += 1;
        if let Err(e) = overlay.render() {
            report.failed_renders += 1;
            warn!("render error (tick {}): {}", report.ticks, e);
        }

        limiter.wait();
    }

    report
}

/// Opens the session, runs the loop and closes the session again.
pub fn run_overlay<Q, M, O>(
    ctx: &mut MonitorContext<Q, M>,
    overlay: &mut O,
    mut limiter: FrameLimiter,
) -> LoopReport
where
    Q: PerfQuery,
    M: MemorySource,
    O: Overlay + ?Sized,
{
    ctx.open();
    let report = run_monitor(ctx, overlay, &mut limiter);
    ctx.shutdown();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_derives_frame_time() {
        assert_eq!(
            FrameLimiter::new(4).frame_time(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(FrameLimiter::unlimited().frame_time(), None);
    }

    #[test]
    fn limiter_spaces_frames() {
        let start = Instant::now();
        let mut limiter = FrameLimiter::new(20);
        for _ in 0..4 {
            limiter.wait();
        }
        // 4 frames at 50ms each
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn unlimited_limiter_does_not_sleep() {
        let mut limiter = FrameLimiter::unlimited();
        let start = Instant::now();
        for _ in 0..1000 {
            limiter.wait();
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
