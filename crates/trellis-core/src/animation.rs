//! Frame time and easing used by the time-based hooks.
//!
//! The runtime samples its [`Clock`] once at the start of every frame; every
//! render inside that frame sees the same instant through
//! [`Cx::frame_time`](crate::Cx::frame_time).

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use web_time::Instant;

pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock for tests and headless hosts. Clones share one time.
#[derive(Clone)]
pub struct ManualClock {
    t: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            t: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.t.set(self.t.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Spring { damping: f32, stiffness: f32 },
}

impl Easing {
    pub fn interpolate(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::Spring { damping, stiffness } => {
                let omega = (stiffness / damping).sqrt();
                let zeta = damping / (2.0 * (stiffness * damping).sqrt());

                if zeta < 1.0 {
                    // underdamped
                    let omega_d = omega * (1.0 - zeta * zeta).sqrt();
                    let t = t * 2.0;
                    1.0 - ((-zeta * omega * t).exp() * (omega_d * t).cos())
                } else {
                    t * (2.0 - t)
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub easing: Easing,
    pub delay: Duration,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(300),
            easing: Easing::EaseInOut,
            delay: Duration::ZERO,
        }
    }
}

impl AnimationSpec {
    pub fn tween(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            delay: Duration::ZERO,
        }
    }

    pub fn linear(duration: Duration) -> Self {
        Self::tween(duration, Easing::Linear)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub trait Interpolate {
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t as f64
    }
}

/// One leg of a transition, fixed when the target changes.
#[derive(Clone, Debug)]
pub(crate) struct Segment<T> {
    pub from: T,
    pub to: T,
    pub start: Instant,
    pub end: Instant,
    pub easing: Easing,
}

impl<T: Interpolate + Clone> Segment<T> {
    pub fn sample(&self, now: Instant) -> T {
        if now >= self.end {
            return self.to.clone();
        }
        if now <= self.start {
            return self.from.clone();
        }
        let total = (self.end - self.start).as_secs_f32();
        let t = ((now - self.start).as_secs_f32() / total).clamp(0.0, 1.0);
        self.from.interpolate(&self.to, self.easing.interpolate(t))
    }
}
