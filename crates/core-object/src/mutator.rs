use crate::interpolation::{interpolate_between, InterpolationMode, ValueRange};
use crate::params::{ObjectParameters, ParamId};
use core_model::RuntimeResult;
use serde::{Deserialize, Serialize};

/// One parameter animated by a mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatorTarget {
    pub param: ParamId,
    pub start: i32,
    pub end: i32,
}

/// A time-bounded parameter animation.
///
/// Active over `[creation + delay, creation + delay + duration]`; each tick
/// it writes the interpolated value of every target, and reports completion
/// once the window has passed. Tagged by (repetition index, name) so
/// scripted `EndObjectMutation` calls can address it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMutator {
    repno: i32,
    name: String,
    creation_time: u64,
    duration_ms: u64,
    delay_ms: u64,
    mode: InterpolationModeRepr,
    targets: Vec<MutatorTarget>,
}

// Serialized stand-in for the interpolation mode (the mode enum itself
// carries rejection semantics, not serde).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum InterpolationModeRepr {
    Linear,
    LogEaseOut,
    LogEaseIn,
}

impl From<InterpolationModeRepr> for InterpolationMode {
    fn from(repr: InterpolationModeRepr) -> Self {
        match repr {
            InterpolationModeRepr::Linear => InterpolationMode::Linear,
            InterpolationModeRepr::LogEaseOut => InterpolationMode::LogEaseOut,
            InterpolationModeRepr::LogEaseIn => InterpolationMode::LogEaseIn,
        }
    }
}

impl ObjectMutator {
    pub fn new(
        repno: i32,
        name: impl Into<String>,
        creation_time: u64,
        duration_ms: u64,
        delay_ms: u64,
        mode: InterpolationMode,
        targets: Vec<MutatorTarget>,
    ) -> Self {
        let mode = match mode {
            InterpolationMode::LogEaseOut => InterpolationModeRepr::LogEaseOut,
            InterpolationMode::LogEaseIn => InterpolationModeRepr::LogEaseIn,
            _ => InterpolationModeRepr::Linear,
        };
        Self {
            repno,
            name: name.into(),
            creation_time,
            duration_ms,
            delay_ms,
            mode,
            targets,
        }
    }

    pub fn repno(&self) -> i32 {
        self.repno
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, repno: i32, name: &str) -> bool {
        self.repno == repno && self.name == name
    }

    fn start_ms(&self) -> u64 {
        self.creation_time + self.delay_ms
    }

    fn end_ms(&self) -> u64 {
        self.start_ms() + self.duration_ms
    }

    /// Advance the animation to `now`, writing interpolated values once the
    /// delay has elapsed. Returns true when the mutator is finished and
    /// should be removed.
    pub fn step(&self, params: &mut ObjectParameters, now: u64) -> RuntimeResult<bool> {
        if now > self.start_ms() {
            for target in &self.targets {
                let value = interpolate_between(
                    self.start_ms() as f64,
                    now as f64,
                    self.end_ms() as f64,
                    ValueRange::new(target.start as f64, target.end as f64),
                    self.mode.into(),
                )?;
                target.param.set(params, value.round() as i32);
            }
        }
        Ok(now > self.end_ms())
    }

    /// Snap every target to its terminal value. Called when a mutator is
    /// cancelled or force-completed.
    pub fn set_to_end(&self, params: &mut ObjectParameters) {
        for target in &self.targets {
            target.param.set(params, target.end);
        }
    }
}
