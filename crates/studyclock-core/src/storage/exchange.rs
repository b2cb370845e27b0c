//! Tabular import/export of the valuation tables.
//!
//! The format is comma-delimited text with a fixed header:
//!
//! ```text
//! setting_type,key,value,kind
//! TargetDuration,CT,240,
//! UnitValue,+1 Section,0.5,CT
//! ```
//!
//! `kind` is only filled for per-kind unit values. Fields containing a comma,
//! quote or newline are quoted with doubled inner quotes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::study::StudyKind;
use crate::valuation::{UnitWeight, ValuationConfig};

pub const HEADER: [&str; 4] = ["setting_type", "key", "value", "kind"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingType {
    TargetDuration,
    UnitValue,
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SettingType::TargetDuration => "TargetDuration",
            SettingType::UnitValue => "UnitValue",
        })
    }
}

impl FromStr for SettingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "TargetDuration" => Ok(SettingType::TargetDuration),
            "UnitValue" => Ok(SettingType::UnitValue),
            other => Err(format!("unknown setting type: {other}")),
        }
    }
}

/// Outcome of an import. `valuation` is always complete: defaults plus every
/// row that parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub valuation: ValuationConfig,
    pub applied: usize,
    pub skipped: usize,
}

/// Render every setting as one row.
pub fn export_csv(valuation: &ValuationConfig) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');

    for (key, secs) in &valuation.target_seconds {
        push_row(
            &mut out,
            SettingType::TargetDuration,
            key,
            &secs.to_string(),
            "",
        );
    }

    for (key, weight) in &valuation.unit_values {
        match weight {
            UnitWeight::Flat(v) => {
                push_row(&mut out, SettingType::UnitValue, key, &v.to_string(), "");
            }
            UnitWeight::PerKind(map) => {
                for (kind, v) in map {
                    push_row(&mut out, SettingType::UnitValue, key, &v.to_string(), kind);
                }
            }
        }
    }

    out
}

fn push_row(out: &mut String, setting: SettingType, key: &str, value: &str, kind: &str) {
    let row = [
        setting.to_string(),
        csv_escape(key),
        csv_escape(value),
        csv_escape(kind),
    ];
    out.push_str(&row.join(","));
    out.push('\n');
}

fn csv_escape(s: &str) -> String {
    let needs_quote = s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r');
    if !needs_quote {
        return s.to_string();
    }
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Parse exported text, starting from the default tables.
///
/// The header row and malformed rows are skipped; every good row is applied.
pub fn import_csv(text: &str) -> ImportReport {
    let mut valuation = ValuationConfig::default();
    let mut applied = 0;
    let mut skipped = 0;

    for (index, record) in parse_records(text).into_iter().enumerate() {
        let fields = match record {
            Some(fields) => fields,
            None => {
                tracing::warn!(row = index + 1, "skipping row with unterminated quote");
                skipped += 1;
                continue;
            }
        };

        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if index == 0 && fields[0].trim().eq_ignore_ascii_case(HEADER[0]) {
            continue;
        }

        match apply_row(&mut valuation, &fields) {
            Ok(()) => applied += 1,
            Err(reason) => {
                tracing::warn!(row = index + 1, %reason, "skipping malformed row");
                skipped += 1;
            }
        }
    }

    ImportReport {
        valuation,
        applied,
        skipped,
    }
}

fn apply_row(valuation: &mut ValuationConfig, fields: &[String]) -> Result<(), String> {
    let [setting, key, value, kind] = fields else {
        return Err(format!("expected 4 fields, found {}", fields.len()));
    };

    let setting: SettingType = setting.parse()?;
    let key = key.trim();
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("value '{value}' is not a number"))?;
    if !value.is_finite() {
        return Err(format!("value '{value}' is not finite"));
    }
    let kind = kind.trim();

    match setting {
        SettingType::TargetDuration => {
            if value < 0.0 {
                return Err("target duration cannot be negative".to_string());
            }
            if !kind.is_empty() {
                return Err("target duration rows take no kind".to_string());
            }
            valuation.set_target(key, value.round() as u64);
        }
        SettingType::UnitValue if kind.is_empty() => valuation.set_unit_flat(key, value),
        SettingType::UnitValue => {
            let kind: StudyKind = kind.parse()?;
            valuation.set_unit_for_kind(key, kind.as_str(), value);
        }
    }
    Ok(())
}

/// Split text into records of fields. A record whose quote never closes is
/// `None`.
fn parse_records(text: &str) -> Vec<Option<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(Some(std::mem::take(&mut fields)));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        records.push(None);
    } else if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(Some(fields));
    }
    records
}
