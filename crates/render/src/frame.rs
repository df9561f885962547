use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Time source and refresh pacing provided by the host.
pub trait FrameClock {
    /// Seconds since the session started. Never decreases.
    fn elapsed_secs(&self) -> f32;

    /// Return once the next frame is due.
    fn wait_for_next_frame(&mut self);
}

/// Wall-clock time, paced to a fixed refresh interval.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
    interval: Duration,
    next_frame: Instant,
}

impl SystemClock {
    pub fn new(refresh_hz: f32) -> Self {
        let start = Instant::now();
        let interval = Duration::from_secs_f32(1.0 / refresh_hz.max(1.0));
        Self {
            start,
            interval,
            next_frame: start + interval,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl FrameClock for SystemClock {
    fn elapsed_secs(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    fn wait_for_next_frame(&mut self) {
        let now = Instant::now();
        if self.next_frame > now {
            std::thread::sleep(self.next_frame - now);
            self.next_frame += self.interval;
        } else {
            // running behind: drop the missed slots instead of bursting
            self.next_frame = now + self.interval;
        }
    }
}

/// Deterministic clock that advances by a fixed step per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteppedClock {
    elapsed: f32,
    step: f32,
}

impl SteppedClock {
    pub fn new(step: f32) -> Self {
        Self {
            elapsed: 0.0,
            step,
        }
    }

    pub fn starting_at(elapsed: f32, step: f32) -> Self {
        Self { elapsed, step }
    }
}

impl FrameClock for SteppedClock {
    fn elapsed_secs(&self) -> f32 {
        self.elapsed
    }

    fn wait_for_next_frame(&mut self) {
        self.elapsed += self.step;
    }
}

/// Shared stop signal for a [`FrameLoop`].
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run-until-cancelled frame driver.
///
/// Each iteration reads the clock once, hands the elapsed time to the
/// frame callback, then waits for the next refresh.
#[derive(Debug, Default)]
pub struct FrameLoop {
    cancel: CancelHandle,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that stops the loop before its next frame.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Frames run so far, across all calls.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame if the loop has not been cancelled.
    ///
    /// Returns `Ok(false)` once cancelled. Hosts that own their own event
    /// loop call this from their redraw callback.
    pub fn step<C, E, F>(&mut self, clock: &C, frame: F) -> Result<bool, E>
    where
        C: FrameClock + ?Sized,
        F: FnOnce(f32) -> Result<(), E>,
    {
        if self.cancel.is_cancelled() {
            return Ok(false);
        }
        frame(clock.elapsed_secs())?;
        self.frames += 1;
        Ok(true)
    }

    /// Drive frames until cancelled or until `frame` fails.
    ///
    /// Returns the number of frames run by this call.
    pub fn run<C, E, F>(&mut self, clock: &mut C, mut frame: F) -> Result<u64, E>
    where
        C: FrameClock + ?Sized,
        F: FnMut(f32) -> Result<(), E>,
    {
        let start = self.frames;
        while self.step(&*clock, &mut frame)? {
            clock.wait_for_next_frame();
        }
        let ran = self.frames - start;
        tracing::debug!(frames = ran, "frame loop stopped");
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_clock_advances_per_frame() {
        let mut clock = SteppedClock::new(0.5);
        assert_eq!(clock.elapsed_secs(), 0.0);
        clock.wait_for_next_frame();
        clock.wait_for_next_frame();
        assert_eq!(clock.elapsed_secs(), 1.0);
    }

    #[test]
    fn run_stops_when_cancelled() {
        let mut frame_loop = FrameLoop::new();
        let cancel = frame_loop.cancel_handle();
        let mut clock = SteppedClock::new(0.25);
        let mut seen = Vec::new();

        let ran = frame_loop
            .run(&mut clock, |t| {
                seen.push(t);
                if seen.len() == 4 {
                    cancel.cancel();
                }
                Ok::<(), ()>(())
            })
            .unwrap();

        assert_eq!(ran, 4);
        assert_eq!(seen, vec![0.0, 0.25, 0.5, 0.75]);
        assert!(frame_loop.is_cancelled());
    }

    #[test]
    fn cancelled_loop_runs_no_frames() {
        let mut frame_loop = FrameLoop::new();
        frame_loop.cancel_handle().cancel();
        let mut clock = SteppedClock::new(1.0);
        let ran = frame_loop
            .run(&mut clock, |_| -> Result<(), ()> { panic!("frame after cancel") })
            .unwrap();
        assert_eq!(ran, 0);
    }

    #[test]
    fn frame_error_stops_the_loop() {
        let mut frame_loop = FrameLoop::new();
        let mut clock = SteppedClock::starting_at(10.0, 1.0);
        let err = frame_loop
            .run(&mut clock, |t| if t >= 12.0 { Err(t) } else { Ok(()) })
            .unwrap_err();
        assert_eq!(err, 12.0);
        assert_eq!(frame_loop.frames(), 2);
    }

    #[test]
    fn step_reports_cancellation() {
        let mut frame_loop = FrameLoop::new();
        let clock = SteppedClock::new(1.0);
        assert_eq!(frame_loop.step(&clock, |_| Ok::<(), ()>(())), Ok(true));
        frame_loop.cancel_handle().cancel();
        assert_eq!(frame_loop.step(&clock, |_| Ok::<(), ()>(())), Ok(false));
        assert_eq!(frame_loop.frames(), 1);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let mut clock = SystemClock::new(1000.0);
        let a = clock.elapsed_secs();
        clock.wait_for_next_frame();
        let b = clock.elapsed_secs();
        assert!(b >= a);
        assert!(b > 0.0);
    }
}
