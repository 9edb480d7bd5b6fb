use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Host-side runtime preferences (`reverie.toml`). Unknown fields are
/// ignored so the file can grow without breaking older binaries.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuntimePrefs {
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub game_root: Option<PathBuf>,
}

/// Working directory first, then the platform config dir.
pub fn discover_prefs_path() -> PathBuf {
    let local = PathBuf::from("reverie.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("reverie").join("reverie.toml");
    }
    PathBuf::from("reverie.toml")
}

/// Load preferences; a missing or unparsable file degrades to defaults.
pub fn load_prefs(path: Option<PathBuf>) -> Result<RuntimePrefs> {
    let path = path.unwrap_or_else(discover_prefs_path);
    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<RuntimePrefs>(&content) {
            Ok(prefs) => {
                info!(target: "config", path = %path.display(), "runtime prefs loaded");
                Ok(prefs)
            }
            Err(_) => Ok(RuntimePrefs::default()),
        },
        Err(_) => Ok(RuntimePrefs::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let prefs = load_prefs(Some(PathBuf::from("__no_such_prefs__.toml"))).unwrap();
        assert!(prefs.font_path.is_none());
        assert!(prefs.log_level.is_none());
    }

    #[test]
    fn parses_known_fields_and_ignores_unknown() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            tmp.path(),
            "font_path = \"/usr/share/fonts/x.ttf\"\nlog_level = \"info\"\nfuture_knob = 3\n",
        )
        .unwrap();
        let prefs = load_prefs(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(
            prefs.font_path,
            Some(PathBuf::from("/usr/share/fonts/x.ttf"))
        );
        assert_eq!(prefs.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn unparsable_file_degrades_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "not [valid toml").unwrap();
        let prefs = load_prefs(Some(tmp.path().to_path_buf())).unwrap();
        assert!(prefs.game_root.is_none());
    }
}
