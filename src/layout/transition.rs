use eframe::egui::Pos2;

pub const TRANSITION_SECONDS: f64 = 0.75;

/// Issued once per mode switch; delayed work only runs while its token is current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionToken(u64);

impl TransitionToken {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

fn progress(start: f64, duration: f64, now: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    ((now - start) / duration).clamp(0.0, 1.0)
}

#[derive(Clone, Debug)]
pub struct Tween {
    start: f64,
    duration: f64,
    from: Vec<Pos2>,
    to: Vec<Pos2>,
}

impl Tween {
    pub fn new(start: f64, duration: f64, from: Vec<Pos2>, to: Vec<Pos2>) -> Self {
        Self {
            start,
            duration,
            from,
            to,
        }
    }

    pub fn is_finished(&self, now: f64) -> bool {
        progress(self.start, self.duration, now) >= 1.0
    }

    pub fn sample(&self, index: usize, now: f64) -> Option<Pos2> {
        let from = *self.from.get(index)?;
        let to = *self.to.get(index)?;
        let t = ease_cubic_in_out(progress(self.start, self.duration, now)) as f32;
        Some(from.lerp(to, t))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    start: f64,
    duration: f64,
    from: f32,
    to: f32,
}

impl Fade {
    pub fn hidden() -> Self {
        Self::settled(0.0)
    }

    pub fn settled(value: f32) -> Self {
        Self {
            start: 0.0,
            duration: 0.0,
            from: value,
            to: value,
        }
    }

    pub fn retarget(self, to: f32, now: f64, duration: f64) -> Self {
        Self {
            start: now,
            duration,
            from: self.value(now),
            to,
        }
    }

    pub fn value(&self, now: f64) -> f32 {
        let t = ease_cubic_in_out(progress(self.start, self.duration, now)) as f32;
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: f64) -> bool {
        progress(self.start, self.duration, now) >= 1.0
    }
}
