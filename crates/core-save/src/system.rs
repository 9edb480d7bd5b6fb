use crate::payload::{
    GlobalSaveFile, GraphicsSaveState, LocalSaveFile, SaveGameHeader, GLOBAL_SCHEMA_VERSION,
    LOCAL_SCHEMA_VERSION,
};
use core_machine::Machine;
use core_model::{RuntimeError, RuntimeResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Save-file placement and the save/load entry points.
pub struct SaveSystem {
    save_dir: PathBuf,
}

impl SaveSystem {
    /// Platform location for a game registry:
    /// `$HOME/.rlvm/<sanitized REGNAME>/`.
    pub fn for_game(sanitized_regname: &str) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            save_dir: home.join(".rlvm").join(sanitized_regname),
        }
    }

    /// Explicit directory (tests, portable installs).
    pub fn at(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn global_path(&self) -> PathBuf {
        self.save_dir.join("global.sav.gz")
    }

    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.save_dir.join(format!("save{slot:03}.sav.gz"))
    }

    // ------------------------------------------------------------------
    // Global scope

    pub fn save_global(&self, machine: &Machine) -> RuntimeResult<()> {
        let payload = GlobalSaveFile {
            schema_version: GLOBAL_SCHEMA_VERSION,
            global_memory: machine.memory().global().clone(),
            kidoku: machine.kidoku().clone(),
            environment: machine.env().clone(),
            text_globals: machine.text().globals().clone(),
            sound_globals: machine.sound().globals().clone(),
        };
        self.write_compressed(&self.global_path(), &payload)?;
        info!(target: "save", path = %self.global_path().display(), "global memory written");
        Ok(())
    }

    /// Load global memory if present. A missing file is normal (first
    /// run); an unreadable one quarantines the whole save directory and
    /// logs a warning, since no save under it can be trusted either.
    pub fn load_global(&self, machine: &mut Machine) -> RuntimeResult<()> {
        let path = self.global_path();
        if !path.exists() {
            return Ok(());
        }
        match self.read_compressed::<GlobalSaveFile>(&path) {
            Ok(payload) => {
                if payload.schema_version != GLOBAL_SCHEMA_VERSION {
                    self.quarantine();
                    warn!(
                        target: "save",
                        found = payload.schema_version,
                        expected = GLOBAL_SCHEMA_VERSION,
                        "global save schema mismatch; directory moved aside"
                    );
                    return Ok(());
                }
                machine
                    .memory_mut()
                    .partial_reset_global(payload.global_memory);
                *machine.kidoku_mut() = payload.kidoku;
                *machine.env_mut() = payload.environment;
                machine.text_mut().replace_globals(payload.text_globals);
                machine.sound_mut().replace_globals(payload.sound_globals);
                Ok(())
            }
            Err(err) => {
                self.quarantine();
                warn!(target: "save", %err, "unable to read global memory; directory moved aside");
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Slot scope

    pub fn save_slot(&self, machine: &Machine, slot: u32, title: &str) -> RuntimeResult<()> {
        let payload = LocalSaveFile {
            schema_version: LOCAL_SCHEMA_VERSION,
            header: SaveGameHeader::new(title, machine.graphics.window_subtitle.clone()),
            local_memory: machine.memory().local().clone(),
            machine: machine.state_snapshot(),
            graphics: GraphicsSaveState {
                stack: machine.graphics.saved_stack().clone(),
                interface_hidden: machine.graphics.interface_hidden,
                window_subtitle: machine.graphics.window_subtitle.clone(),
            },
            text_globals: machine.text().globals().clone(),
            sound_globals: machine.sound().globals().clone(),
        };
        self.write_compressed(&self.slot_path(slot), &payload)?;
        info!(target: "save", slot, "slot written");
        Ok(())
    }

    /// Read only the header of a slot (load-menu listings).
    pub fn load_header(&self, slot: u32) -> RuntimeResult<SaveGameHeader> {
        let payload: LocalSaveFile = self.read_or_corrupt(&self.slot_path(slot))?;
        Ok(payload.header)
    }

    pub fn slot_exists(&self, slot: u32) -> bool {
        self.slot_path(slot).exists()
    }

    /// Restore a slot into the machine: clear the live stack, restore
    /// memory and machine state, then rebuild graphics by replaying the
    /// recorded command stack.
    pub fn load_slot(&self, machine: &mut Machine, slot: u32) -> RuntimeResult<()> {
        let payload: LocalSaveFile = self.read_or_corrupt(&self.slot_path(slot))?;
        if payload.schema_version != LOCAL_SCHEMA_VERSION {
            self.quarantine();
            return Err(RuntimeError::CorruptedSave(format!(
                "slot {slot} has schema {} (expected {})",
                payload.schema_version, LOCAL_SCHEMA_VERSION
            )));
        }

        // Long operations hold collaborator state; the stack must clear
        // before anything else is replaced.
        machine.reset();

        machine
            .memory_mut()
            .partial_reset_local(payload.local_memory);
        machine.text_mut().replace_globals(payload.text_globals);
        machine.sound_mut().replace_globals(payload.sound_globals);
        machine.restore_state(payload.machine);

        machine.graphics.interface_hidden = payload.graphics.interface_hidden;
        machine.graphics.window_subtitle = payload.graphics.window_subtitle;
        let entries: Vec<_> = payload.graphics.stack.iter().cloned().collect();
        machine.replay_graphics_stack(entries)?;

        info!(target: "save", slot, "slot restored");
        Ok(())
    }

    /// Full load sequence: global memory first, then the slot.
    pub fn load_game(&self, machine: &mut Machine, slot: u32) -> RuntimeResult<()> {
        self.load_global(machine)?;
        self.load_slot(machine, slot)
    }

    // ------------------------------------------------------------------
    // IO plumbing

    fn write_compressed<T: Serialize>(&self, path: &Path, payload: &T) -> RuntimeResult<()> {
        fs::create_dir_all(&self.save_dir)?;

        let json = serde_json::to_vec(payload)
            .map_err(|err| RuntimeError::BadFormat(format!("save encode failed: {err}")))?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        let compressed = encoder.finish()?;

        // Temp-then-rename keeps the slot file atomic relative to readers.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, compressed)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_compressed<T: DeserializeOwned>(&self, path: &Path) -> RuntimeResult<T> {
        let compressed = fs::read(path)?;
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .map_err(|err| RuntimeError::BadFormat(format!("save decompress failed: {err}")))?;
        serde_json::from_slice(&json)
            .map_err(|err| RuntimeError::BadFormat(format!("save decode failed: {err}")))
    }

    /// Read a slot payload; on any failure quarantine the directory and
    /// surface `CorruptedSave`.
    fn read_or_corrupt<T: DeserializeOwned>(&self, path: &Path) -> RuntimeResult<T> {
        self.read_compressed(path).map_err(|err| {
            self.quarantine();
            RuntimeError::CorruptedSave(format!("{}: {err}", path.display()))
        })
    }

    /// Move the whole save directory to `<dir>.old_corrupted_data`,
    /// preserving forensic state.
    fn quarantine(&self) {
        let Some(name) = self.save_dir.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let dest = self
            .save_dir
            .with_file_name(format!("{name}.old_corrupted_data"));
        if dest.exists() {
            let _ = fs::remove_dir_all(&dest);
        }
        if let Err(err) = fs::rename(&self.save_dir, &dest) {
            warn!(target: "save", %err, "failed to quarantine save directory");
        } else {
            warn!(
                target: "save",
                from = %self.save_dir.display(),
                to = %dest.display(),
                "save directory quarantined"
            );
        }
    }
}
