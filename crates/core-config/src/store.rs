use std::collections::HashMap;

/// One parsed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Int(i32),
    Str(String),
}

impl ConfigValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ConfigValue::Int(value) => Some(*value),
            ConfigValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(value) => Some(value),
            ConfigValue::Int(_) => None,
        }
    }
}

/// The parsed-INI collaborator interface. A key maps to an ordered list of
/// values (`KEY=a,b,c`); repeated dotted keys (`OBJECT.004`) are distinct
/// keys in the store.
pub trait ConfigStore {
    fn values(&self, key: &str) -> Option<&[ConfigValue]>;
    /// All stored keys beginning with `prefix`, for families like
    /// `SELBTN.<n>`.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<&str>;

    fn first_int(&self, key: &str) -> Option<i32> {
        self.values(key)?.first()?.as_int()
    }

    fn first_str(&self, key: &str) -> Option<&str> {
        self.values(key)?.first()?.as_str()
    }

    fn ints(&self, key: &str) -> Vec<i32> {
        self.values(key)
            .map(|vals| vals.iter().filter_map(ConfigValue::as_int).collect())
            .unwrap_or_default()
    }
}

/// Simple in-memory store, used by hosts that parse the INI themselves and
/// by tests.
#[derive(Debug, Clone, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, Vec<ConfigValue>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, values: Vec<ConfigValue>) {
        self.entries.insert(key.into(), values);
    }

    pub fn set_ints(&mut self, key: impl Into<String>, ints: &[i32]) {
        self.set(
            key,
            ints.iter().map(|&value| ConfigValue::Int(value)).collect(),
        );
    }

    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, vec![ConfigValue::Str(value.into())]);
    }
}

impl ConfigStore for KeyValueStore {
    fn values(&self, key: &str) -> Option<&[ConfigValue]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let mut store = KeyValueStore::new();
        store.set_ints("SEEN_START", &[100]);
        store.set_str("REGNAME", "KEY\\CLANNAD");

        assert_eq!(store.first_int("SEEN_START"), Some(100));
        assert_eq!(store.first_str("REGNAME"), Some("KEY\\CLANNAD"));
        assert_eq!(store.first_int("MISSING"), None);
    }

    #[test]
    fn prefix_listing_is_sorted() {
        let mut store = KeyValueStore::new();
        store.set_ints("SELBTN.002", &[1]);
        store.set_ints("SELBTN.000", &[1]);
        store.set_ints("OTHER", &[1]);
        assert_eq!(
            store.keys_with_prefix("SELBTN."),
            vec!["SELBTN.000", "SELBTN.002"]
        );
    }
}
