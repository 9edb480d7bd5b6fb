//! Configuration consumed by the runtime core.
//!
//! Two unrelated sources meet here:
//!
//! * The game's INI-style configuration. Parsing the file format is the
//!   job of an external collaborator; the core consumes a parsed key/value
//!   store ([`ConfigStore`]) and extracts typed views ([`GameConfig`]).
//! * Host-side runtime preferences (`reverie.toml`), discovered in the
//!   working directory first with a platform config-dir fallback.

mod game;
mod prefs;
mod store;

pub use game::{GameConfig, ObjectConfig, SelBtnConfig, ShakeSpec};
pub use prefs::{discover_prefs_path, load_prefs, RuntimePrefs};
pub use store::{ConfigStore, ConfigValue, KeyValueStore};
