use std::time::{Duration, Instant};

/// Wall-clock timer that can pause, so time spent inside save I/O does not
/// count towards the next save interval.
#[derive(Clone, Debug)]
pub struct Stopwatch {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl Stopwatch {
    pub fn new(running: bool) -> Stopwatch {
        Stopwatch {
            accumulated: Duration::ZERO,
            running_since: running.then(Instant::now),
        }
    }

    pub fn play(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    pub fn set(&mut self, elapsed: Duration, paused: bool) {
        self.accumulated = elapsed;
        self.running_since = (!paused).then(Instant::now);
    }

    pub fn reset(&mut self, paused: bool) {
        self.set(Duration::ZERO, paused);
    }

    pub fn elapsed(&self) -> Duration {
        let running = self
            .running_since
            .map(|since| since.elapsed())
            .unwrap_or(Duration::ZERO);
        self.accumulated + running
    }
}
