//! Study kinds, modifier tags and the active selection.
//!
//! A study is one unit of timed work. It is described by exactly one
//! [`StudyKind`] and any number of [`Modifier`] tags. Both are identified in
//! configuration files by their display string (`"CT"`, `"+1 Section"`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The fixed set of study kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StudyKind {
    #[serde(rename = "CT")]
    Ct,
    #[serde(rename = "MR")]
    Mr,
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "XR")]
    Xr,
    #[serde(rename = "NM")]
    Nm,
    #[serde(rename = "PET")]
    Pet,
    Fluoro,
    Mammo,
}

impl StudyKind {
    pub const ALL: [StudyKind; 8] = [
        StudyKind::Ct,
        StudyKind::Mr,
        StudyKind::Us,
        StudyKind::Xr,
        StudyKind::Nm,
        StudyKind::Pet,
        StudyKind::Fluoro,
        StudyKind::Mammo,
    ];

    /// Configuration key for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            StudyKind::Ct => "CT",
            StudyKind::Mr => "MR",
            StudyKind::Us => "US",
            StudyKind::Xr => "XR",
            StudyKind::Nm => "NM",
            StudyKind::Pet => "PET",
            StudyKind::Fluoro => "Fluoro",
            StudyKind::Mammo => "Mammo",
        }
    }
}

impl fmt::Display for StudyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        StudyKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown study kind: {s}"))
    }
}

/// Modifier tags that adjust a study's target duration and unit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modifier {
    #[serde(rename = "+1 Section")]
    OneSection,
    #[serde(rename = "+2 Sections")]
    TwoSections,
    Contrast,
    Comparison,
    /// Both sides imaged; doubles the target duration.
    Bilateral,
}

impl Modifier {
    pub const ALL: [Modifier; 5] = [
        Modifier::OneSection,
        Modifier::TwoSections,
        Modifier::Contrast,
        Modifier::Comparison,
        Modifier::Bilateral,
    ];

    /// Configuration key for this modifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::OneSection => "+1 Section",
            Modifier::TwoSections => "+2 Sections",
            Modifier::Contrast => "Contrast",
            Modifier::Comparison => "Comparison",
            Modifier::Bilateral => "Bilateral",
        }
    }

    /// Short, whitespace-free name for typed commands.
    pub fn slug(self) -> &'static str {
        match self {
            Modifier::OneSection => "section1",
            Modifier::TwoSections => "section2",
            Modifier::Contrast => "contrast",
            Modifier::Comparison => "comparison",
            Modifier::Bilateral => "bilateral",
        }
    }

    /// The duplicate-side flag multiplies the target instead of adding to it.
    pub fn is_duplicate_side(self) -> bool {
        self == Modifier::Bilateral
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Modifier::ALL
            .into_iter()
            .find(|m| {
                m.as_str().eq_ignore_ascii_case(trimmed) || m.slug().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| format!("unknown modifier: {s}"))
    }
}

/// The study currently being timed or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: Option<StudyKind>,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
}

impl Selection {
    pub fn new(kind: StudyKind) -> Self {
        Self {
            kind: Some(kind),
            modifiers: BTreeSet::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.modifiers.is_empty()
    }

    /// Flip a modifier on or off. Returns whether it is now present.
    pub fn toggle(&mut self, modifier: Modifier) -> bool {
        if self.modifiers.remove(&modifier) {
            false
        } else {
            self.modifiers.insert(modifier);
            true
        }
    }

    /// Human label such as `CT +1 Section, Contrast`.
    pub fn label(&self) -> String {
        let kind = self.kind.map(|k| k.as_str()).unwrap_or("-");
        if self.modifiers.is_empty() {
            return kind.to_string();
        }
        let mods: Vec<&str> = self.modifiers.iter().map(|m| m.as_str()).collect();
        format!("{kind} {}", mods.join(", "))
    }
}
