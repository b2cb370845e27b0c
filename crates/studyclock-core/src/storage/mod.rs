mod config;
pub mod exchange;

pub use config::{Config, Preferences};
pub use exchange::{export_csv, import_csv, ImportReport, SettingType};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::timer::{BreakPolicy, SessionEngine};
use crate::valuation::ValuationConfig;

/// Returns `~/.config/studyclock[-dev]/` based on STUDYCLOCK_ENV.
///
/// Set STUDYCLOCK_ENV=dev to use a development data directory, or
/// STUDYCLOCK_HOME to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYCLOCK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYCLOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyclock-dev")
            } else {
                base_dir.join("studyclock")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persistence for the valuation tables.
pub trait ValuationStore {
    /// `None` on first run; callers fall back to defaults.
    fn load_valuation(&self) -> Result<Option<ValuationConfig>>;
    fn save_valuation(&self, valuation: &ValuationConfig) -> Result<()>;
}

/// Boolean preferences that survive restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Preference {
    AutoStart,
    AccessibleDisplay,
}

/// Persistence for [`Preference`] flags.
pub trait PreferenceStore {
    fn load_preference(&self, preference: Preference) -> Result<Option<bool>>;
    fn save_preference(&self, preference: Preference, value: bool) -> Result<()>;
}

/// The TOML config file, viewed through the persistence traits.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `config.toml` in [`data_dir`].
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::path()?))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn read(&self) -> Result<Option<Config>> {
        Config::read_from(&self.path)
    }

    fn update(&self, edit: impl FnOnce(&mut Config)) -> Result<()> {
        let mut config = self.read()?.unwrap_or_default();
        edit(&mut config);
        config.write_to(&self.path)
    }
}

impl ValuationStore for ConfigFile {
    fn load_valuation(&self) -> Result<Option<ValuationConfig>> {
        Ok(self.read()?.map(|c| c.valuation))
    }

    fn save_valuation(&self, valuation: &ValuationConfig) -> Result<()> {
        self.update(|c| c.valuation = valuation.clone())
    }
}

impl PreferenceStore for ConfigFile {
    fn load_preference(&self, preference: Preference) -> Result<Option<bool>> {
        Ok(self.read()?.map(|c| match preference {
            Preference::AutoStart => c.preferences.auto_start,
            Preference::AccessibleDisplay => c.preferences.accessible_display,
        }))
    }

    fn save_preference(&self, preference: Preference, value: bool) -> Result<()> {
        self.update(|c| match preference {
            Preference::AutoStart => c.preferences.auto_start = value,
            Preference::AccessibleDisplay => c.preferences.accessible_display = value,
        })
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    valuation: RefCell<Option<ValuationConfig>>,
    preferences: RefCell<BTreeMap<Preference, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ValuationStore for MemoryStore {
    fn load_valuation(&self) -> Result<Option<ValuationConfig>> {
        Ok(self.valuation.borrow().clone())
    }

    fn save_valuation(&self, valuation: &ValuationConfig) -> Result<()> {
        *self.valuation.borrow_mut() = Some(valuation.clone());
        Ok(())
    }
}

impl PreferenceStore for MemoryStore {
    fn load_preference(&self, preference: Preference) -> Result<Option<bool>> {
        Ok(self.preferences.borrow().get(&preference).copied())
    }

    fn save_preference(&self, preference: Preference, value: bool) -> Result<()> {
        self.preferences.borrow_mut().insert(preference, value);
        Ok(())
    }
}

/// Build a fresh session from persisted settings. Session counters always
/// start at zero.
pub fn load_engine(
    valuation: &impl ValuationStore,
    preferences: &impl PreferenceStore,
    policy: BreakPolicy,
) -> Result<SessionEngine> {
    let tables = valuation.load_valuation()?.unwrap_or_default();
    let mut engine = SessionEngine::new(tables, policy);
    engine.set_auto_start(
        preferences
            .load_preference(Preference::AutoStart)?
            .unwrap_or(false),
    );
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load_valuation().unwrap().is_none());
        assert!(store.load_preference(Preference::AutoStart).unwrap().is_none());
    }

    #[test]
    fn load_engine_applies_preferences() {
        let store = MemoryStore::new();
        let mut tables = ValuationConfig::default();
        tables.set_target("CT", 100);
        store.save_valuation(&tables).unwrap();
        store.save_preference(Preference::AutoStart, true).unwrap();

        let engine = load_engine(&store, &store, BreakPolicy::default()).unwrap();
        assert!(engine.auto_start());
        assert_eq!(engine.valuation().target_for("CT"), 100);
        assert_eq!(engine.session_secs(), 0);
    }

    #[test]
    fn config_file_round_trips_through_traits() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("config.toml"));
        assert!(file.load_valuation().unwrap().is_none());

        file.save_preference(Preference::AccessibleDisplay, true).unwrap();
        let mut tables = ValuationConfig::default();
        tables.set_unit_flat("Comparison", 0.15);
        file.save_valuation(&tables).unwrap();

        assert_eq!(
            file.load_preference(Preference::AccessibleDisplay).unwrap(),
            Some(true)
        );
        assert_eq!(
            file.load_preference(Preference::AutoStart).unwrap(),
            Some(false)
        );
        assert_eq!(file.load_valuation().unwrap(), Some(tables));
    }

    #[test]
    fn config_file_migrates_legacy_keys_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[valuation.target_seconds]\nMRI = 480\n").unwrap();

        let file = ConfigFile::new(&path);
        let tables = file.load_valuation().unwrap().unwrap();
        assert_eq!(tables.target_for("MR"), 480);
        assert!(!tables.target_seconds.contains_key("MRI"));

        // Only the loaded copy is migrated; the file is untouched until saved.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("MRI"));
    }
}
