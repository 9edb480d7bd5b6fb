use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};

/// Persisted audio settings (part of global save state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundGlobals {
    pub bgm_volume: i32,
    pub pcm_volume: i32,
    pub koe_volume: i32,
    pub se_volume: i32,
    pub bgm_enabled: bool,
    pub koe_enabled: bool,
}

impl Default for SoundGlobals {
    fn default() -> Self {
        Self {
            bgm_volume: 255,
            pcm_volume: 255,
            koe_volume: 255,
            se_volume: 255,
            bgm_enabled: true,
            koe_enabled: true,
        }
    }
}

/// Commands queued for the mixer thread. The core never blocks on audio:
/// it enqueues, the collaborator drains between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum MixerCommand {
    PlayBgm { name: String, looped: bool },
    StopBgm,
    FadeBgm { target_volume: i32, duration_ms: u32 },
    PlaySe { number: i32 },
    PlayKoe { id: i32 },
    StopKoe,
    StopAllSound,
    SetGlobals(SoundGlobals),
}

/// Sender half owned by the core, receiver half by the mixer thread.
pub struct MixerQueue {
    tx: Sender<MixerCommand>,
    rx: Receiver<MixerCommand>,
}

impl MixerQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<MixerCommand> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<MixerCommand> {
        self.rx.clone()
    }

    pub fn push(&self, command: MixerCommand) {
        // An unbounded queue never rejects; ignore the closed-side case
        // during shutdown.
        let _ = self.tx.send(command);
    }

    /// Drain pending commands without blocking (collaborator side).
    pub fn drain(&self) -> Vec<MixerCommand> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => out.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}

impl Default for MixerQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The sound-system surface the core consults synchronously (voice state
/// gates the auto-mode timer; everything else goes through the queue).
pub trait SoundServices {
    /// True while a voice clip is playing.
    fn koe_playing(&self) -> bool;
    /// Stop the current voice clip, if any.
    fn koe_stop(&mut self);
    fn globals(&self) -> &SoundGlobals;
    fn replace_globals(&mut self, globals: SoundGlobals);
}
