//! The animated-object system: parameterized drawables, mutators, layers.
//!
//! Every on-screen object is a [`GraphicsObject`]: a flat parameter record
//! plus an optional drawer (what kind of content it shows) plus the list of
//! mutators currently animating its parameters. Objects live in two layers
//! (foreground / background) of lazily-allocated slots; child objects live
//! in a parent-owned arena reached through the parent drawer.
//!
//! Parent-to-child propagation is computed at render time from an explicit
//! composition rule ([`compose`]); objects never hold back-references.

mod interpolation;
mod layers;
mod mutator;
mod object;
mod params;
mod render;
mod stack;

pub use interpolation::{interpolate, interpolate_between, InterpolationMode, ValueRange};
pub use layers::{GraphicsLayers, Layer, DEFAULT_OBJECT_CEILING};
pub use mutator::{MutatorTarget, ObjectMutator};
pub use object::{AfterAction, Animator, Drawer, GraphicsObject, ParentLayer};
pub use params::{CompositeMode, ObjectParameters, ParamId, REPETITION_SLOTS};
pub use render::{compose, RenderParams};
pub use stack::{GraphicsStack, GraphicsStackEntry, GraphicsStackValue, GRAPHICS_STACK_CAP};
