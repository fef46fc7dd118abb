use crate::physics::{CollisionObserver, ContactEvent};

/// A single preloaded sound that can be rewound and replayed.
pub trait AudioCue {
    fn set_volume(&mut self, volume: f64);
    fn set_current_time(&mut self, seconds: f64);
    fn play(&mut self) -> Result<(), String>;
}

/// xorshift32; good enough for volume jitter and needs no OS entropy on wasm.
#[derive(Debug, Clone)]
pub struct XorShift {
    state: u32,
}

impl XorShift {
    pub fn new(seed: u32) -> Self {
        // zero is a fixed point of xorshift
        Self {
            state: if seed == 0 { 0x9e37_79b9 } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / (f64::from(u32::MAX) + 1.0)
    }
}

/// Plays the hit cue for collisions harder than `threshold`.
pub struct HitSound {
    cue: Box<dyn AudioCue>,
    threshold: f32,
    rng: XorShift,
}

impl HitSound {
    pub fn new(cue: Box<dyn AudioCue>, threshold: f32, seed: u32) -> Self {
        Self {
            cue,
            threshold,
            rng: XorShift::new(seed),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// React to one impact speed. Returns true if playback was requested.
    pub fn on_impact(&mut self, impact_velocity: f32) -> bool {
        if impact_velocity.abs() <= self.threshold {
            return false;
        }
        self.cue.set_volume(self.rng.next_f64());
        self.cue.set_current_time(0.0);
        if let Err(e) = self.cue.play() {
            log::warn!("Hit sound playback failed: {e}");
        }
        true
    }
}

impl CollisionObserver for HitSound {
    fn on_collide(&mut self, event: &ContactEvent) {
        self.on_impact(event.impact_velocity);
    }
}

/// Cue that does nothing; used when no audio element is available.
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn set_volume(&mut self, _volume: f64) {}
    fn set_current_time(&mut self, _seconds: f64) {}
    fn play(&mut self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use html::HtmlAudioCue;

#[cfg(target_arch = "wasm32")]
mod html {
    use super::AudioCue;
    use wasm_bindgen::JsValue;
    use web_sys::HtmlAudioElement;

    /// Audio cue backed by an `<audio>` element.
    pub struct HtmlAudioCue {
        element: HtmlAudioElement,
    }

    impl HtmlAudioCue {
        pub fn new(src: &str) -> Result<Self, JsValue> {
            let element = HtmlAudioElement::new_with_src(src)?;
            element.set_preload("auto");
            Ok(Self { element })
        }
    }

    impl AudioCue for HtmlAudioCue {
        fn set_volume(&mut self, volume: f64) {
            self.element.set_volume(volume);
        }

        fn set_current_time(&mut self, seconds: f64) {
            self.element.set_current_time(seconds);
        }

        fn play(&mut self) -> Result<(), String> {
            let promise: js_sys::Promise = self
                .element
                .play()
                .map_err(|e| format!("{e:?}"))?;
            // Autoplay policy rejects until the user has interacted with the page.
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                    log::warn!("Hit sound rejected: {e:?}");
                }
            });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Volume(f64),
        Time(f64),
        Play,
    }

    struct MockCue {
        calls: Rc<RefCell<Vec<Call>>>,
        fail: bool,
    }

    impl AudioCue for MockCue {
        fn set_volume(&mut self, volume: f64) {
            self.calls.borrow_mut().push(Call::Volume(volume));
        }
        fn set_current_time(&mut self, seconds: f64) {
            self.calls.borrow_mut().push(Call::Time(seconds));
        }
        fn play(&mut self) -> Result<(), String> {
            self.calls.borrow_mut().push(Call::Play);
            if self.fail {
                Err("NotAllowedError".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn hit_sound(fail: bool) -> (HitSound, Rc<RefCell<Vec<Call>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let cue = MockCue {
            calls: Rc::clone(&calls),
            fail,
        };
        (HitSound::new(Box::new(cue), 1.5, 7), calls)
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let (mut sound, calls) = hit_sound(false);
        assert!(!sound.on_impact(1.5));
        assert!(!sound.on_impact(0.2));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_hard_hit_sets_volume_rewinds_and_plays() {
        let (mut sound, calls) = hit_sound(false);
        assert!(sound.on_impact(1.6));

        let calls = calls.borrow();
        assert_eq!(calls.len(), 3);
        match calls[0] {
            Call::Volume(v) => assert!((0.0..1.0).contains(&v), "volume {v}"),
            ref other => panic!("expected volume first, got {other:?}"),
        }
        assert_eq!(calls[1], Call::Time(0.0));
        assert_eq!(calls[2], Call::Play);
    }

    #[test]
    fn test_negative_impact_uses_magnitude() {
        let (mut sound, calls) = hit_sound(false);
        assert!(sound.on_impact(-4.0));
        assert_eq!(calls.borrow().last(), Some(&Call::Play));
    }

    #[test]
    fn test_playback_failure_is_not_fatal() {
        let (mut sound, calls) = hit_sound(true);
        assert!(sound.on_impact(3.0));
        assert!(sound.on_impact(3.0));
        assert_eq!(calls.borrow().len(), 6);
    }

    #[test]
    fn test_xorshift_range_and_zero_seed() {
        let mut rng = XorShift::new(0);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
        assert_ne!(XorShift::new(0).next_u32(), 0);
    }
}
