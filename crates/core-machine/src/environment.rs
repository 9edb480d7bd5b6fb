use serde::{Deserialize, Serialize};

/// The two generic flags the standard system menu exposes to scripts.
/// Their meaning is game-defined; valid values are 0 to 4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generics {
    pub val1: i32,
    pub val2: i32,
}

/// Visibility of one system-menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyscomEntryState {
    #[default]
    Visible,
    Invisible,
    Greyed,
}

impl SyscomEntryState {
    pub fn from_int(value: i32) -> Self {
        match value {
            0 => SyscomEntryState::Invisible,
            2 => SyscomEntryState::Greyed,
            _ => SyscomEntryState::Visible,
        }
    }

    pub fn as_int(self) -> i32 {
        match self {
            SyscomEntryState::Invisible => 0,
            SyscomEntryState::Visible => 1,
            SyscomEntryState::Greyed => 2,
        }
    }
}

pub const SYSCOM_COUNT: usize = 32;

/// The 32 numbered system-menu commands and their visibility states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyscomTable {
    entries: [SyscomEntryState; SYSCOM_COUNT],
}

impl Default for SyscomTable {
    fn default() -> Self {
        Self {
            entries: [SyscomEntryState::Visible; SYSCOM_COUNT],
        }
    }
}

impl SyscomTable {
    pub fn get(&self, index: usize) -> SyscomEntryState {
        self.entries
            .get(index)
            .copied()
            .unwrap_or(SyscomEntryState::Invisible)
    }

    pub fn set(&mut self, index: usize, state: SyscomEntryState) {
        if let Some(entry) = self.entries.get_mut(index) {
            *entry = state;
        }
    }

    pub fn set_all(&mut self, state: SyscomEntryState) {
        self.entries = [state; SYSCOM_COUNT];
    }
}

/// Script-visible countdown/countup timers. Two layers of 255 counters
/// each, storing the tick they were last reset at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerBank {
    #[serde(with = "timer_bases_as_vec")]
    bases: std::collections::BTreeMap<(i32, i32), u64>,
}

/// serde_json map keys must be strings, so tuple-keyed maps can't be
/// serialized directly; round-trip them as a vec of (key, value) pairs.
mod timer_bases_as_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<(i32, i32), u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        map.iter()
            .map(|(k, v)| (*k, *v))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(i32, i32), u64>, D::Error> {
        let entries = Vec::<((i32, i32), u64)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl TimerBank {
    pub fn reset(&mut self, layer: i32, counter: i32, now: u64) {
        self.bases.insert((layer, counter), now);
    }

    /// Milliseconds since the counter's last reset; an untouched counter
    /// reads from tick zero.
    pub fn read(&self, layer: i32, counter: i32, now: u64) -> u64 {
        let base = self.bases.get(&(layer, counter)).copied().unwrap_or(0);
        now.saturating_sub(base)
    }
}

/// Machine environment persisted with global memory: generics, the syscom
/// table and the timer bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineEnvironment {
    pub generics: Generics,
    pub syscom: SyscomTable,
    pub timers: TimerBank,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syscom_defaults_visible_and_clamps_range() {
        let mut table = SyscomTable::default();
        assert_eq!(table.get(0), SyscomEntryState::Visible);
        assert_eq!(table.get(99), SyscomEntryState::Invisible);
        table.set(3, SyscomEntryState::Greyed);
        assert_eq!(table.get(3), SyscomEntryState::Greyed);
        table.set_all(SyscomEntryState::Invisible);
        assert_eq!(table.get(31), SyscomEntryState::Invisible);
    }

    #[test]
    fn timers_measure_from_reset() {
        let mut timers = TimerBank::default();
        assert_eq!(timers.read(0, 0, 500), 500);
        timers.reset(0, 0, 400);
        assert_eq!(timers.read(0, 0, 500), 100);
        // Other counters are unaffected.
        assert_eq!(timers.read(0, 1, 500), 500);
    }

    #[test]
    fn environment_round_trips_through_serde() {
        let mut env = MachineEnvironment::default();
        env.generics.val1 = 3;
        env.syscom.set(0, SyscomEntryState::Greyed);
        env.timers.reset(1, 2, 77);

        let json = serde_json::to_string(&env).unwrap();
        let back: MachineEnvironment = serde_json::from_str(&json).unwrap();
        assert_eq!(env, back);
    }
}
