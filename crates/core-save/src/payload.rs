use chrono::{DateTime, Utc};
use core_machine::MachineStateSnapshot;
use core_media::SoundGlobals;
use core_memory::{GlobalMemory, KidokuTable, LocalMemory};
use core_object::GraphicsStack;
use core_text::TextGlobals;
use serde::{Deserialize, Serialize};

pub const GLOBAL_SCHEMA_VERSION: u32 = 3;
pub const LOCAL_SCHEMA_VERSION: u32 = 2;

/// Human-visible save metadata shown in load menus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGameHeader {
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Window subtitle at save time, if any.
    pub subtitle: String,
}

impl SaveGameHeader {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            created_at: Utc::now(),
            subtitle: subtitle.into(),
        }
    }
}

/// Per-game global file: survives reset, independent of save slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSaveFile {
    pub schema_version: u32,
    pub global_memory: GlobalMemory,
    pub kidoku: KidokuTable,
    pub environment: core_machine::MachineEnvironment,
    pub text_globals: TextGlobals,
    pub sound_globals: SoundGlobals,
}

/// Graphics state that persists in a slot. Object layers are not stored;
/// they are rebuilt by replaying the recorded command stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsSaveState {
    pub stack: GraphicsStack,
    pub interface_hidden: bool,
    pub window_subtitle: String,
}

/// One save slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSaveFile {
    pub schema_version: u32,
    pub header: SaveGameHeader,
    pub local_memory: LocalMemory,
    pub machine: MachineStateSnapshot,
    pub graphics: GraphicsSaveState,
    /// Collaborator-facing state captured with the slot. The
    /// collaborators' internals stay collaborator-owned; what persists is
    /// the surface the core drives.
    pub text_globals: TextGlobals,
    pub sound_globals: SoundGlobals,
}
