use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shaping function applied to animation progress before tweening.
///
/// Curves determine *how* a value moves along a tween's range: `Linear`
/// advances at constant speed, `Sine` oscillates and is meant for
/// effects that swing between the endpoints rather than settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Curve {
    Linear,
    Sine,
}

impl Curve {
    /// Evaluates the curve at `t`. Pure: the same input always yields the
    /// same output.
    pub fn value(self, t: f64) -> f64 {
        match self {
            Curve::Linear => t,
            Curve::Sine => t.sin(),
        }
    }
}

/// Interpolation between two scalar endpoints.
///
/// `compute` returns the absolute target value along `[a, b]` for the
/// given progress, not a per-frame delta; callers that feed incremental
/// APIs must remember the previously returned value themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    a: f64,
    b: f64,
}

impl Tween {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    pub fn compute(&self, t: f64) -> f64 {
        self.a + (self.b - self.a) * t
    }
}

/// Progress accumulator for one animation bout.
///
/// Progress lives on the closed interval [0, 1]: 0 is not started, 1 is
/// complete. The accumulator only moves forward; a negative delta is
/// treated as zero time passing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationState {
    progress: f64,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances progress by `dt` seconds, clamping at 1.0.
    pub fn update(&mut self, dt: f64) {
        if dt > 0.0 {
            self.progress = (self.progress + dt).min(1.0);
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }
}

/// Time-stepped rotation about a fixed axis.
///
/// Binds an [`AnimationState`] to a [`Tween`] over angles and a [`Curve`],
/// with a speed factor scaling elapsed time (a full bout takes
/// `1 / speed` seconds). `update` returns the absolute angle reached so
/// far along the tween's range. The axis never changes for the lifetime
/// of one instance; sequential rotations use a fresh instance per bout.
#[derive(Debug, Clone, Copy)]
pub struct RotateAnimation {
    state: AnimationState,
    tween: Tween,
    curve: Curve,
    axis: Vec3,
    speed: f64,
}

impl RotateAnimation {
    pub fn new(tween: Tween, curve: Curve, axis: Vec3) -> Self {
        Self {
            state: AnimationState::new(),
            tween,
            curve,
            axis,
            speed: 1.0,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Advances the animation by `dt` seconds and returns the absolute
    /// angle in radians reached along the tween.
    pub fn update(&mut self, dt: f64) -> f64 {
        self.state.update(dt * self.speed);
        self.tween.compute(self.curve.value(self.state.progress()))
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}
