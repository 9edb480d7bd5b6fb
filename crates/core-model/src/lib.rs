//! Shared vocabulary for the Reverie runtime core.
//!
//! Every other crate in the workspace speaks the types defined here: the
//! closed error set, script locations, scenario configuration, small
//! geometry/colour primitives, and the clock abstraction the scheduler and
//! mutators are driven by. Keeping these in one leaf crate avoids dependency
//! cycles between the memory model, the expression engine and the machine.

mod clock;
mod error;
mod geometry;
mod location;

pub use clock::{Clock, FixedClock, MonotonicClock};
pub use error::{RuntimeError, RuntimeResult};
pub use geometry::{Point, Rect, RgbaColour};
pub use location::{ScenarioConfig, ScriptLocation, TextEncoding};
