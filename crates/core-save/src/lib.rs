//! Save/restore for machine state.
//!
//! Two persistence scopes with paired serde payloads per persistable type:
//!
//! * *Global* (`global.sav.gz`): global memory banks, the kidoku table,
//!   the machine environment and collaborator globals. Written outside of
//!   save slots; survives reset.
//! * *Local slot* (`save###.sav.gz`): header, local memory, machine state
//!   (line, savepoint call stack, environment) and recorded graphics
//!   state. The live call stack never serializes; a load rebuilds it from
//!   the savepoint frames and replays the graphics command stack against
//!   a fresh machine.
//!
//! Payloads are gzip-compressed JSON with an explicit schema version;
//! unknown future versions are rejected rather than best-effort loaded.
//! Writes go through a temp file + rename so a slot is either the old or
//! the new save, never a torn one. Any decode failure during load moves
//! the entire save directory aside for forensics and surfaces
//! `CorruptedSave`.

mod payload;
mod system;

pub use payload::{
    GlobalSaveFile, GraphicsSaveState, LocalSaveFile, SaveGameHeader, GLOBAL_SCHEMA_VERSION,
    LOCAL_SCHEMA_VERSION,
};
pub use system::SaveSystem;
