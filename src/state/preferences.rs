//! Durable user preferences
//!
//! Sliders and the cooldown table are stored together as one JSON document
//! under a single key. Every mutation is persisted before it becomes
//! visible, so a failed write leaves the in-memory state untouched.

use crate::error::{Result, VibeError};
use crate::state::cooldown::CooldownRecord;
use crate::storage::KeyValueStore;
use crate::types::SliderSet;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage key holding the preference document
pub const PREFERENCES_KEY: &str = "preferences";

/// The persisted preference document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Generation sliders
    #[serde(default)]
    pub sliders: SliderSet,
    /// Cooldown records keyed by song id
    #[serde(default)]
    pub cooldowns: BTreeMap<String, CooldownRecord>,
}

/// Sole owner and writer of [`Preferences`]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<Preferences>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("state", &*self.lock())
            .finish()
    }
}

impl PreferenceStore {
    /// Load preferences from `store`
    ///
    /// A missing document yields defaults. A document that cannot be decoded
    /// is logged and replaced by defaults on the next write.
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Storage` if the backend itself cannot be read
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let preferences = match store.load(PREFERENCES_KEY)? {
            Some(raw) => match serde_json::from_str::<Preferences>(&raw) {
                Ok(preferences) => {
                    tracing::debug!(
                        cooldowns = preferences.cooldowns.len(),
                        "Loaded preferences"
                    );
                    preferences
                }
                Err(e) => {
                    tracing::warn!("Stored preferences are unreadable, using defaults: {}", e);
                    Preferences::default()
                }
            },
            None => Preferences::default(),
        };

        Ok(Self {
            store,
            state: Mutex::new(preferences),
        })
    }

    /// Copy of the whole document
    pub fn snapshot(&self) -> Preferences {
        self.lock().clone()
    }

    /// Current slider positions
    pub fn sliders(&self) -> SliderSet {
        self.lock().sliders
    }

    /// Set one slider and persist
    ///
    /// # Errors
    ///
    /// Returns `VibeError::Validation` for an unknown name or out-of-range
    /// value, or `VibeError::Storage` if persisting fails
    pub fn set_slider(&self, name: &str, value: i64) -> Result<SliderSet> {
        self.mutate(|prefs| {
            prefs.sliders.set(name, value)?;
            Ok(prefs.sliders)
        })
    }

    /// Restore default slider positions and persist
    pub fn reset_sliders(&self) -> Result<SliderSet> {
        self.mutate(|prefs| {
            prefs.sliders = SliderSet::default();
            Ok(prefs.sliders)
        })
    }

    /// Cooldown record for one song
    pub fn cooldown(&self, song_id: &str) -> Option<CooldownRecord> {
        self.lock().cooldowns.get(song_id).cloned()
    }

    /// Every cooldown record
    pub fn cooldowns(&self) -> BTreeMap<String, CooldownRecord> {
        self.lock().cooldowns.clone()
    }

    /// Replace one cooldown record atomically and persist
    ///
    /// `update` receives the existing record, if any, and returns the new one.
    pub fn update_cooldown<F>(&self, song_id: &str, update: F) -> Result<CooldownRecord>
    where
        F: FnOnce(Option<CooldownRecord>) -> CooldownRecord,
    {
        self.mutate(|prefs| {
            let record = update(prefs.cooldowns.get(song_id).cloned());
            prefs.cooldowns.insert(song_id.to_string(), record.clone());
            Ok(record)
        })
    }

    /// Apply `change` to a copy, persist it, then commit
    fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Preferences) -> Result<T>,
    {
        let mut state = self.lock();
        let mut draft = state.clone();
        let result = change(&mut draft)?;

        let encoded = serde_json::to_string(&draft)
            .map_err(|e| VibeError::Storage(format!("Serialization failed: {}", e)))?;
        self.store.save(PREFERENCES_KEY, &encoded)?;

        *state = draft;
        Ok(result)
    }

    fn lock(&self) -> MutexGuard<'_, Preferences> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::cooldown::CooldownClass;
    use crate::storage::MemoryStore;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<()> {
            Err(VibeError::Storage("disk full".to_string()).into())
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let prefs = PreferenceStore::open(Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(prefs.sliders(), SliderSet::default());
        assert!(prefs.cooldowns().is_empty());
    }

    #[test]
    fn test_malformed_document_falls_back_to_defaults() {
        let store = Arc::new(MemoryStore::with_value(PREFERENCES_KEY, "{not json"));
        let prefs = PreferenceStore::open(store).unwrap();
        assert_eq!(prefs.snapshot(), Preferences::default());
    }

    #[test]
    fn test_set_slider_persists() {
        let store = Arc::new(MemoryStore::new());
        let prefs = PreferenceStore::open(store.clone()).unwrap();
        prefs.set_slider("artistFame", 90).unwrap();

        let raw = store.load(PREFERENCES_KEY).unwrap().unwrap();
        assert!(raw.contains(r#""artistFame":90"#));

        let reopened = PreferenceStore::open(store).unwrap();
        assert_eq!(reopened.sliders().artist_fame, 90);
    }

    #[test]
    fn test_invalid_slider_leaves_state_unchanged() {
        let prefs = PreferenceStore::open(Arc::new(MemoryStore::new())).unwrap();
        assert!(prefs.set_slider("artistFame", 400).is_err());
        assert_eq!(prefs.sliders(), SliderSet::default());
    }

    #[test]
    fn test_reset_sliders() {
        let prefs = PreferenceStore::open(Arc::new(MemoryStore::new())).unwrap();
        prefs.set_slider("themeFocus", 5).unwrap();
        assert_eq!(prefs.reset_sliders().unwrap(), SliderSet::default());
    }

    #[test]
    fn test_failed_persist_is_not_committed() {
        let prefs = PreferenceStore::open(Arc::new(FailingStore)).unwrap();
        assert!(prefs.set_slider("artistFame", 10).is_err());
        assert_eq!(prefs.sliders().artist_fame, 50);
        assert!(prefs
            .update_cooldown("a_b", |_| CooldownRecord::new(CooldownClass::Long))
            .is_err());
        assert!(prefs.cooldown("a_b").is_none());
    }

    #[test]
    fn test_legacy_cooldown_document_loads() {
        let raw = r#"{"sliders":{"genreVariety":70},"cooldowns":{"a_b":{"class":"turtle","lastPlayedAt":5,"durationSeconds":259200,"playCount":2}}}"#;
        let prefs = PreferenceStore::open(Arc::new(MemoryStore::with_value(PREFERENCES_KEY, raw)))
            .unwrap();
        assert_eq!(prefs.sliders().genre_variety, 70);
        assert_eq!(prefs.sliders().artist_fame, 50);
        assert_eq!(prefs.cooldown("a_b").unwrap().class, CooldownClass::Long);
    }
}
