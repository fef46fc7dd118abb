/// Frame clock fed with `requestAnimationFrame` timestamps in milliseconds.
#[derive(Debug, Default, Clone)]
pub struct Clock {
    previous: Option<f64>,
    elapsed: f64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample and return seconds since the previous one.
    /// The first sample yields 0; a timestamp going backwards yields 0.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let delta = match self.previous {
            Some(prev) => ((now_ms - prev) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.previous = Some(now_ms);
        self.elapsed += delta;
        delta
    }

    /// Seconds accumulated since the first sample.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
