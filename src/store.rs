use std::{fs, io::ErrorKind, path::PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::prelude::*;

/// Well-known snapshot keys.
#[derive(Copy, Clone, Debug)]
pub enum Key {
    /// Raw tariff API response, persisted verbatim.
    TariffData,

    /// Overnight cheap-slot plan.
    CheapSlotData,
}

impl Key {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TariffData => "tariff_data",
            Self::CheapSlotData => "cheap_slot_data",
        }
    }
}

/// Flat key-value snapshot store backing the tariff and plan caches.
///
/// Each key maps to a single JSON document which is always replaced
/// wholesale, never merged.
pub trait Store {
    fn load_raw(&self, key: Key) -> Result<Option<String>>;

    fn save_raw(&self, key: Key, payload: &str) -> Result;

    fn load<T: DeserializeOwned>(&self, key: Key) -> Result<Option<T>> {
        self.load_raw(key)?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .with_context(|| format!("failed to parse the `{}` snapshot", key.as_str()))
    }

    fn save<T: Serialize>(&self, key: Key, value: &T) -> Result {
        self.save_raw(key, &serde_json::to_string(value)?)
    }
}

/// One `<key>.json` file per key under the data directory.
pub struct FileStore(PathBuf);

impl FileStore {
    pub const fn new(root: PathBuf) -> Self {
        Self(root)
    }

    fn path(&self, key: Key) -> PathBuf {
        self.0.join(format!("{}.json", key.as_str()))
    }
}

impl Store for FileStore {
    fn load_raw(&self, key: Key) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => {
                Err(error).with_context(|| format!("failed to read `{}`", self.path(key).display()))
            }
        }
    }

    fn save_raw(&self, key: Key, payload: &str) -> Result {
        fs::write(self.path(key), payload)
            .with_context(|| format!("failed to write `{}`", self.path(key).display()))
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore(std::cell::RefCell<std::collections::HashMap<&'static str, String>>);

#[cfg(test)]
impl Store for MemoryStore {
    fn load_raw(&self, key: Key) -> Result<Option<String>> {
        Ok(self.0.borrow().get(key.as_str()).cloned())
    }

    fn save_raw(&self, key: Key, payload: &str) -> Result {
        self.0.borrow_mut().insert(key.as_str(), payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[test]
    fn missing_key_is_none() -> Result {
        let store = FileStore::new(std::env::temp_dir().join("nightowl-no-such-directory"));
        assert!(store.load_raw(Key::TariffData)?.is_none());
        Ok(())
    }

    #[test]
    fn typed_round_trip_ok() -> Result {
        #[derive(Debug, Eq, PartialEq, Serialize, Deserialize)]
        struct Snapshot {
            answer: u32,
        }

        let store = MemoryStore::default();
        assert!(store.load::<Snapshot>(Key::CheapSlotData)?.is_none());
        store.save(Key::CheapSlotData, &Snapshot { answer: 42 })?;
        assert_eq!(store.load::<Snapshot>(Key::CheapSlotData)?, Some(Snapshot { answer: 42 }));
        Ok(())
    }

    #[test]
    fn unparsable_snapshot_is_an_error() -> Result {
        let store = MemoryStore::default();
        store.save_raw(Key::CheapSlotData, "not JSON at all")?;
        assert!(store.load::<serde_json::Value>(Key::CheapSlotData).is_err());
        Ok(())
    }
}
