use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::study::{Modifier, StudyKind};

/// Old kind identifiers and the keys that replaced them.
pub const LEGACY_KEYS: [(&str, &str); 5] = [
    ("MRI", "MR"),
    ("CR", "XR"),
    ("Nuclear", "NM"),
    ("Mammogram", "Mammo"),
    ("Ultrasound", "US"),
];

/// A unit-value entry: either a plain number or one number per study kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitWeight {
    Flat(f64),
    PerKind(BTreeMap<String, f64>),
}

impl UnitWeight {
    /// Contribution of this entry when applied to `kind`.
    pub fn for_kind(&self, kind: StudyKind) -> f64 {
        match self {
            UnitWeight::Flat(v) => finite_or_zero(*v),
            UnitWeight::PerKind(map) => map
                .get(kind.as_str())
                .copied()
                .map(finite_or_zero)
                .unwrap_or(0.0),
        }
    }
}

pub(crate) fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Editable valuation tables, keyed by study kind or modifier name.
///
/// Serialized under `[valuation]` in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    #[serde(default)]
    pub target_seconds: BTreeMap<String, u64>,
    #[serde(default)]
    pub unit_values: BTreeMap<String, UnitWeight>,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        let mut target_seconds = BTreeMap::new();
        let mut unit_values = BTreeMap::new();

        for (kind, secs, units) in [
            (StudyKind::Ct, 240, 1.0),
            (StudyKind::Mr, 420, 1.4),
            (StudyKind::Us, 180, 0.6),
            (StudyKind::Xr, 60, 0.2),
            (StudyKind::Nm, 300, 0.9),
            (StudyKind::Pet, 480, 2.0),
            (StudyKind::Fluoro, 300, 0.5),
            (StudyKind::Mammo, 150, 0.7),
        ] {
            target_seconds.insert(kind.as_str().to_string(), secs);
            unit_values.insert(kind.as_str().to_string(), UnitWeight::Flat(units));
        }

        for (modifier, secs) in [
            (Modifier::OneSection, 120),
            (Modifier::TwoSections, 240),
            (Modifier::Contrast, 60),
            (Modifier::Comparison, 60),
            (Modifier::Bilateral, 0),
        ] {
            target_seconds.insert(modifier.as_str().to_string(), secs);
        }

        unit_values.insert(
            Modifier::OneSection.as_str().to_string(),
            per_kind(&[(StudyKind::Ct, 0.5), (StudyKind::Mr, 0.7), (StudyKind::Us, 0.3)]),
        );
        unit_values.insert(
            Modifier::TwoSections.as_str().to_string(),
            per_kind(&[(StudyKind::Ct, 1.0), (StudyKind::Mr, 1.4)]),
        );
        unit_values.insert(
            Modifier::Contrast.as_str().to_string(),
            UnitWeight::Flat(0.2),
        );

        Self {
            target_seconds,
            unit_values,
        }
    }
}

fn per_kind(entries: &[(StudyKind, f64)]) -> UnitWeight {
    UnitWeight::PerKind(
        entries
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), *v))
            .collect(),
    )
}

impl ValuationConfig {
    /// Target seconds for a kind or modifier key; missing keys are 0.
    pub fn target_for(&self, key: &str) -> u64 {
        self.target_seconds.get(key).copied().unwrap_or(0)
    }

    pub fn unit_weight(&self, key: &str) -> Option<&UnitWeight> {
        self.unit_values.get(key)
    }

    pub fn set_target(&mut self, key: impl Into<String>, seconds: u64) {
        self.target_seconds.insert(key.into(), seconds);
    }

    pub fn set_unit_flat(&mut self, key: impl Into<String>, value: f64) {
        self.unit_values.insert(key.into(), UnitWeight::Flat(value));
    }

    /// Set a per-kind unit value. A flat entry under the same key is replaced
    /// by a per-kind map.
    pub fn set_unit_for_kind(&mut self, key: impl Into<String>, kind: &str, value: f64) {
        let entry = self
            .unit_values
            .entry(key.into())
            .or_insert_with(|| UnitWeight::PerKind(BTreeMap::new()));
        match entry {
            UnitWeight::PerKind(map) => {
                map.insert(kind.to_string(), value);
            }
            UnitWeight::Flat(_) => {
                let mut map = BTreeMap::new();
                map.insert(kind.to_string(), value);
                *entry = UnitWeight::PerKind(map);
            }
        }
    }

    /// Build from a parsed `[valuation]` table, overlaying the defaults.
    ///
    /// Entries that are not numeric are dropped and therefore valued 0.
    /// Legacy kind identifiers are remapped afterwards.
    pub fn from_toml_lenient(value: &toml::Value) -> Self {
        let mut config = Self::default();

        if let Some(targets) = value.get("target_seconds").and_then(|v| v.as_table()) {
            for (key, raw) in targets {
                match coerce_seconds(raw) {
                    Some(secs) => {
                        config.target_seconds.insert(key.clone(), secs);
                    }
                    None => {
                        tracing::warn!(key = %key, "ignoring non-numeric target_seconds entry");
                        config.target_seconds.remove(key);
                    }
                }
            }
        }

        if let Some(units) = value.get("unit_values").and_then(|v| v.as_table()) {
            for (key, raw) in units {
                match coerce_weight(raw) {
                    Some(weight) => {
                        config.unit_values.insert(key.clone(), weight);
                    }
                    None => {
                        tracing::warn!(key = %key, "ignoring non-numeric unit_values entry");
                        config.unit_values.remove(key);
                    }
                }
            }
        }

        let migrated = config.migrate_legacy_keys();
        if migrated > 0 {
            tracing::info!(migrated, "remapped legacy study kind keys");
        }
        config
    }

    /// Rename legacy kind identifiers, including keys inside per-kind maps.
    /// Returns the number of keys renamed.
    pub fn migrate_legacy_keys(&mut self) -> usize {
        let mut renamed = 0;
        for (old, new) in LEGACY_KEYS {
            if let Some(secs) = self.target_seconds.remove(old) {
                self.target_seconds.insert(new.to_string(), secs);
                renamed += 1;
            }
            if let Some(weight) = self.unit_values.remove(old) {
                self.unit_values.insert(new.to_string(), weight);
                renamed += 1;
            }
            for weight in self.unit_values.values_mut() {
                if let UnitWeight::PerKind(map) = weight {
                    if let Some(v) = map.remove(old) {
                        map.insert(new.to_string(), v);
                        renamed += 1;
                    }
                }
            }
        }
        renamed
    }
}

fn coerce_number(raw: &toml::Value) -> Option<f64> {
    let v = match raw {
        toml::Value::Integer(i) => *i as f64,
        toml::Value::Float(f) => *f,
        toml::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn coerce_seconds(raw: &toml::Value) -> Option<u64> {
    let v = coerce_number(raw)?;
    (v >= 0.0).then(|| v.round() as u64)
}

fn coerce_weight(raw: &toml::Value) -> Option<UnitWeight> {
    if let Some(table) = raw.as_table() {
        let map = table
            .iter()
            .filter_map(|(kind, v)| coerce_number(v).map(|n| (kind.clone(), n)))
            .collect();
        return Some(UnitWeight::PerKind(map));
    }
    coerce_number(raw).map(UnitWeight::Flat)
}
