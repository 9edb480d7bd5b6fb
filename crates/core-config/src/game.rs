use crate::store::ConfigStore;
use core_model::RgbaColour;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-object settings from `OBJECT.<n>` entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectConfig {
    /// Rendering layer the object is pinned to.
    pub layer: i32,
    /// Whether the object participates in time-control freezes.
    pub time_mod: i32,
    /// Default wipe-copy flag.
    pub wipe_copy: bool,
}

/// Layout of one graphical selection button (`SELBTN.<n>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelBtnConfig {
    pub name: String,
    pub base_x: i32,
    pub base_y: i32,
    pub step_y: i32,
    /// Pattern indices for normal / hover / pressed / disabled frames.
    pub frames: [i32; 4],
}

/// One screen-shake recipe (`SHAKE.<n>`): (dx, dy, time) triplets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShakeSpec {
    pub steps: Vec<(i32, i32, i32)>,
}

/// Typed view over the configuration keys the core consumes.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub regname: String,
    pub seen_start: Option<i32>,
    pub seen_menu: Option<i32>,
    pub cancelcall_mod: i32,
    /// (scenario, entry point) invoked on cancel.
    pub cancelcall: Option<(i32, i32)>,
    /// Emulated extension libraries by slot (`DLL.<n>`).
    pub dlls: BTreeMap<i32, String>,
    pub window_attr: Vec<i32>,
    pub init_message_speed: i32,
    pub init_message_speed_mod: i32,
    pub message_key_wait_use: bool,
    pub message_key_wait_time: i32,
    pub savepoint_message: bool,
    pub savepoint_seentop: bool,
    pub savepoint_selcom: bool,
    pub init_originalsetting1_mod: i32,
    pub init_originalsetting2_mod: i32,
    pub objects: BTreeMap<i32, ObjectConfig>,
    pub object_max: usize,
    pub shakes: BTreeMap<i32, ShakeSpec>,
    pub color_table: Vec<RgbaColour>,
    pub selbtns: BTreeMap<i32, SelBtnConfig>,
    pub btnobj_action: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            regname: String::new(),
            seen_start: None,
            seen_menu: None,
            cancelcall_mod: 0,
            cancelcall: None,
            dlls: BTreeMap::new(),
            window_attr: Vec::new(),
            init_message_speed: 30,
            init_message_speed_mod: 0,
            message_key_wait_use: false,
            message_key_wait_time: 0,
            savepoint_message: true,
            savepoint_seentop: true,
            savepoint_selcom: true,
            init_originalsetting1_mod: 0,
            init_originalsetting2_mod: 0,
            objects: BTreeMap::new(),
            object_max: 256,
            shakes: BTreeMap::new(),
            color_table: Vec::new(),
            selbtns: BTreeMap::new(),
            btnobj_action: 0,
        }
    }
}

fn suffix_number(key: &str, prefix: &str) -> Option<i32> {
    key.strip_prefix(prefix)?.parse().ok()
}

impl GameConfig {
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        let mut config = GameConfig {
            regname: store.first_str("REGNAME").unwrap_or_default().to_string(),
            seen_start: store.first_int("SEEN_START"),
            seen_menu: store.first_int("SEEN_MENU"),
            cancelcall_mod: store.first_int("CANCELCALL_MOD").unwrap_or(0),
            window_attr: store.ints("WINDOW_ATTR"),
            init_message_speed: store.first_int("INIT_MESSAGE_SPEED").unwrap_or(30),
            init_message_speed_mod: store.first_int("INIT_MESSAGE_SPEED_MOD").unwrap_or(0),
            message_key_wait_use: store.first_int("MESSAGE_KEY_WAIT_USE").unwrap_or(0) != 0,
            message_key_wait_time: store.first_int("MESSAGE_KEY_WAIT_TIME").unwrap_or(0),
            savepoint_message: store.first_int("SAVEPOINT_MESSAGE").unwrap_or(1) != 0,
            savepoint_seentop: store.first_int("SAVEPOINT_SEENTOP").unwrap_or(1) != 0,
            savepoint_selcom: store.first_int("SAVEPOINT_SELCOM").unwrap_or(1) != 0,
            init_originalsetting1_mod: store
                .first_int("INIT_ORIGINALSETING1_MOD")
                .unwrap_or(0),
            init_originalsetting2_mod: store
                .first_int("INIT_ORIGINALSETING2_MOD")
                .unwrap_or(0),
            object_max: store.first_int("OBJECT_MAX").unwrap_or(256).max(1) as usize,
            btnobj_action: store.first_int("BTNOBJ.ACTION").unwrap_or(0),
            ..GameConfig::default()
        };

        let cancel = store.ints("CANCELCALL");
        if cancel.len() >= 2 {
            config.cancelcall = Some((cancel[0], cancel[1]));
        }

        for key in store.keys_with_prefix("DLL.") {
            if let (Some(slot), Some(name)) =
                (suffix_number(key, "DLL."), store.first_str(key))
            {
                config.dlls.insert(slot, name.to_string());
            }
        }

        for key in store.keys_with_prefix("OBJECT.") {
            let Some(number) = suffix_number(key, "OBJECT.") else {
                continue;
            };
            let ints = store.ints(key);
            config.objects.insert(
                number,
                ObjectConfig {
                    layer: ints.first().copied().unwrap_or(0),
                    time_mod: ints.get(1).copied().unwrap_or(0),
                    wipe_copy: ints.get(2).copied().unwrap_or(0) != 0,
                },
            );
        }

        for key in store.keys_with_prefix("SHAKE.") {
            let Some(number) = suffix_number(key, "SHAKE.") else {
                continue;
            };
            let ints = store.ints(key);
            let steps = ints
                .chunks_exact(3)
                .map(|chunk| (chunk[0], chunk[1], chunk[2]))
                .collect();
            config.shakes.insert(number, ShakeSpec { steps });
        }

        for chunk in store.ints("COLOR_TABLE").chunks_exact(3) {
            config.color_table.push(RgbaColour::rgb(
                chunk[0].clamp(0, 255) as u8,
                chunk[1].clamp(0, 255) as u8,
                chunk[2].clamp(0, 255) as u8,
            ));
        }

        for key in store.keys_with_prefix("SELBTN.") {
            let Some(number) = suffix_number(key, "SELBTN.") else {
                continue;
            };
            let ints = store.ints(key);
            config.selbtns.insert(
                number,
                SelBtnConfig {
                    name: store
                        .values(key)
                        .and_then(|vals| vals.iter().find_map(|v| v.as_str()))
                        .unwrap_or_default()
                        .to_string(),
                    base_x: ints.first().copied().unwrap_or(0),
                    base_y: ints.get(1).copied().unwrap_or(0),
                    step_y: ints.get(2).copied().unwrap_or(0),
                    frames: [
                        ints.get(3).copied().unwrap_or(0),
                        ints.get(4).copied().unwrap_or(0),
                        ints.get(5).copied().unwrap_or(0),
                        ints.get(6).copied().unwrap_or(0),
                    ],
                },
            );
        }

        debug!(
            target: "config",
            seen_start = ?config.seen_start,
            objects = config.objects.len(),
            selbtns = config.selbtns.len(),
            "game configuration loaded"
        );
        config
    }

    /// Sanitized registry name usable as a directory component.
    pub fn sanitized_regname(&self) -> String {
        self.regname
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;

    fn sample_store() -> KeyValueStore {
        let mut store = KeyValueStore::new();
        store.set_str("REGNAME", "KEY\\CLANNAD");
        store.set_ints("SEEN_START", &[100]);
        store.set_ints("CANCELCALL", &[9030, 1]);
        store.set_ints("SAVEPOINT_MESSAGE", &[0]);
        store.set_ints("OBJECT_MAX", &[512]);
        store.set_ints("OBJECT.004", &[1, 0, 1]);
        store.set_ints("SHAKE.001", &[4, 0, 20, -4, 0, 20]);
        store.set_ints("COLOR_TABLE", &[255, 255, 255, 0, 0, 0]);
        store.set_ints("SELBTN.000", &[50, 100, 40, 0, 1, 2, 3]);
        store.set_str("DLL.0", "rlBabel");
        store
    }

    #[test]
    fn extracts_typed_keys() {
        let config = GameConfig::from_store(&sample_store());
        assert_eq!(config.seen_start, Some(100));
        assert_eq!(config.cancelcall, Some((9030, 1)));
        assert!(!config.savepoint_message);
        assert!(config.savepoint_selcom);
        assert_eq!(config.object_max, 512);
        assert_eq!(config.dlls.get(&0).map(String::as_str), Some("rlBabel"));
    }

    #[test]
    fn dotted_families_index_by_suffix() {
        let config = GameConfig::from_store(&sample_store());
        let object = config.objects.get(&4).unwrap();
        assert_eq!(object.layer, 1);
        assert!(object.wipe_copy);

        let shake = config.shakes.get(&1).unwrap();
        assert_eq!(shake.steps, vec![(4, 0, 20), (-4, 0, 20)]);

        let btn = config.selbtns.get(&0).unwrap();
        assert_eq!(btn.base_x, 50);
        assert_eq!(btn.frames, [0, 1, 2, 3]);
    }

    #[test]
    fn colour_table_decodes_triplets() {
        let config = GameConfig::from_store(&sample_store());
        assert_eq!(config.color_table.len(), 2);
        assert_eq!(config.color_table[0], RgbaColour::rgb(255, 255, 255));
    }

    #[test]
    fn regname_sanitizes_path_hostile_characters() {
        let config = GameConfig::from_store(&sample_store());
        assert_eq!(config.sanitized_regname(), "KEY_CLANNAD");
    }

    #[test]
    fn defaults_apply_when_keys_are_absent() {
        let config = GameConfig::from_store(&KeyValueStore::new());
        assert_eq!(config.seen_start, None);
        assert!(config.savepoint_message);
        assert_eq!(config.object_max, 256);
        assert_eq!(config.init_message_speed, 30);
    }
}
