use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutually exclusive activity categories. At most one accrues per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Working,
    /// Time between studies, and time while a study is paused.
    Interstitial,
    Admin,
    Comms,
    OnBreak,
    /// "Double tap": a quick look at a study that is not timed.
    QuickReview,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 6] = [
        ActivityCategory::Working,
        ActivityCategory::Interstitial,
        ActivityCategory::Admin,
        ActivityCategory::Comms,
        ActivityCategory::OnBreak,
        ActivityCategory::QuickReview,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Working => "working",
            ActivityCategory::Interstitial => "interstitial",
            ActivityCategory::Admin => "admin",
            ActivityCategory::Comms => "comms",
            ActivityCategory::OnBreak => "on_break",
            ActivityCategory::QuickReview => "quick_review",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative seconds accrued per category over the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub working: u64,
    pub interstitial: u64,
    pub admin: u64,
    pub comms: u64,
    pub on_break: u64,
    pub quick_review: u64,
}

impl CategoryTotals {
    pub fn get(&self, category: ActivityCategory) -> u64 {
        match category {
            ActivityCategory::Working => self.working,
            ActivityCategory::Interstitial => self.interstitial,
            ActivityCategory::Admin => self.admin,
            ActivityCategory::Comms => self.comms,
            ActivityCategory::OnBreak => self.on_break,
            ActivityCategory::QuickReview => self.quick_review,
        }
    }

    pub(crate) fn add_second(&mut self, category: ActivityCategory) {
        let slot = match category {
            ActivityCategory::Working => &mut self.working,
            ActivityCategory::Interstitial => &mut self.interstitial,
            ActivityCategory::Admin => &mut self.admin,
            ActivityCategory::Comms => &mut self.comms,
            ActivityCategory::OnBreak => &mut self.on_break,
            ActivityCategory::QuickReview => &mut self.quick_review,
        };
        *slot += 1;
    }

    pub fn sum(&self) -> u64 {
        ActivityCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Number of transitions into each interrupting category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounters {
    pub admin: u32,
    pub comms: u32,
    pub breaks: u32,
    pub quick_reviews: u32,
}

impl EventCounters {
    pub(crate) fn record_entry(&mut self, category: ActivityCategory) {
        match category {
            ActivityCategory::Admin => self.admin += 1,
            ActivityCategory::Comms => self.comms += 1,
            ActivityCategory::OnBreak => self.breaks += 1,
            ActivityCategory::QuickReview => self.quick_reviews += 1,
            ActivityCategory::Working | ActivityCategory::Interstitial => {}
        }
    }
}
