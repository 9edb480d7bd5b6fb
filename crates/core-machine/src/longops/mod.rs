//! The concrete long operations: waits, pauses, typewriter text output,
//! and the selection family.

mod button_object;
mod pause;
mod select;
mod textout;
mod wait;

pub use button_object::{ButtonHitTest, ButtonObjectSelectLongOperation};
pub use pause::PauseLongOperation;
pub use select::{SelectBtnLongOperation, SelectLongOperation, SelectOption};
pub use textout::TextoutLongOperation;
pub use wait::WaitLongOperation;
