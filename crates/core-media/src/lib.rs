//! Media-side data types and the sound collaborator contract.
//!
//! Decoding audio containers and mixing are collaborator work; what lives
//! here is the data the core itself manipulates: raw PCM sample buffers
//! (sliced and concatenated by audio opcodes), the CG completion table,
//! and the command queue the mixer thread consumes between ticks.

mod audio;
mod cgm;
mod sound;

pub use audio::{AudioData, AudioSpec, SampleBuffer, SampleFormat};
pub use cgm::CgmTable;
pub use sound::{MixerCommand, MixerQueue, SoundGlobals, SoundServices};
