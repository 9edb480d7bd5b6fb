use core_model::{RuntimeError, RuntimeResult};

/// Interpolation curves available to mutators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    LogEaseOut,
    LogEaseIn,
    /// Reserved by the command set; using it is an error today.
    Identity,
}

impl InterpolationMode {
    pub fn from_code(code: i32) -> RuntimeResult<Self> {
        match code {
            0 => Ok(InterpolationMode::Linear),
            1 => Ok(InterpolationMode::LogEaseOut),
            2 => Ok(InterpolationMode::LogEaseIn),
            3 => Ok(InterpolationMode::Identity),
            _ => Err(RuntimeError::BadFormat(format!(
                "invalid interpolation mode {code}"
            ))),
        }
    }
}

/// A value span being animated from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub start: f64,
    pub end: f64,
}

impl ValueRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Interpolate over the time span `[start, end]` at time `current` and
/// return the corresponding share of `amount`.
///
/// Times outside the span clamp to the nearest endpoint, so the result is
/// always within `[0, amount]` for non-negative amounts.
pub fn interpolate(
    start: f64,
    current: f64,
    end: f64,
    amount: f64,
    mode: InterpolationMode,
) -> RuntimeResult<f64> {
    let span = end - start;
    let mut t = if span == 0.0 {
        1.0
    } else {
        (current - start) / span
    };
    t = t.clamp(0.0, 1.0);

    let eased = match mode {
        InterpolationMode::Linear => t,
        // The logarithmic modes share one value table: ease-in is defined
        // as the full amount minus the ease-out remainder, which collapses
        // onto the ease-out curve.
        InterpolationMode::LogEaseOut | InterpolationMode::LogEaseIn => {
            (t + 1.0).ln() / std::f64::consts::LN_2
        }
        InterpolationMode::Identity => {
            return Err(RuntimeError::BadFormat(
                "identity interpolation mode is reserved".into(),
            ))
        }
    };
    Ok(eased * amount)
}

/// Interpolate a value between `value.start` and `value.end` over the time
/// span, clamping outside it.
pub fn interpolate_between(
    time_start: f64,
    time_current: f64,
    time_end: f64,
    value: ValueRange,
    mode: InterpolationMode,
) -> RuntimeResult<f64> {
    let amount = value.end - value.start;
    Ok(value.start + interpolate(time_start, time_current, time_end, amount, mode)?)
}
