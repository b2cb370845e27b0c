//! Session engine: the activity state machine.
//!
//! The engine is a tick-driven reducer. It does not read the clock or spawn
//! threads - the caller invokes [`SessionEngine::tick`] once per elapsed
//! second and passes `now` to the transitions that stamp wall-clock time.
//!
//! ## Categories
//!
//! ```text
//! Idle -> Working <-> Interstitial
//!            |  ^
//!    (auto-pause) (auto-resume)
//!            v  |
//!        Admin / Comms        OnBreak        QuickReview
//! ```
//!
//! The active category is a single `Option<ActivityCategory>`, so two
//! categories can never accrue in the same tick. `paused` and `auto_paused`
//! are flags on the current study, not categories.
//!
//! Guarded transitions return `Err(ActionError)` without touching state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::break_policy::{BreakPolicy, BreakPolicyState};
use super::category::{ActivityCategory, CategoryTotals, EventCounters};
use super::ledger::Ledger;
use crate::error::ActionError;
use crate::events::Event;
use crate::study::{Modifier, Selection, StudyKind};
use crate::valuation::{self, ValuationConfig};

/// A study set aside so another can be read first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSlot {
    pub selection: Selection,
    pub elapsed_secs: u64,
    pub target_secs: u64,
}

/// User and policy actions, for callers that drive the engine from parsed
/// commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectKind(StudyKind),
    ToggleModifier(Modifier),
    SetSelection(Selection),
    StartWork,
    PauseWork,
    CompleteWork,
    Undo,
    DiscardStudy,
    StartAdmin,
    StopAdmin,
    StartComms,
    StopComms,
    StartBreak,
    StopBreak,
    AcceptBreak,
    DeclineBreak,
    StartQuickReview,
    StopQuickReview,
    EnterDraft,
    ResumeDraft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEngine {
    valuation: ValuationConfig,
    policy: BreakPolicy,
    auto_start: bool,

    /// `None` is Idle: nothing has been started yet.
    category: Option<ActivityCategory>,
    paused: bool,
    /// Working was interrupted by Admin/Comms and resumes when it stops.
    auto_paused: bool,

    selection: Selection,
    elapsed_secs: u64,
    draft: Option<DraftSlot>,

    /// Starts with the first study and never stops.
    session_secs: Option<u64>,
    /// Seconds in the current category since it was entered.
    stint_secs: u64,
    totals: CategoryTotals,
    counters: EventCounters,

    ledger: Ledger,
    breaks: BreakPolicyState,
    break_pending: bool,
}

impl SessionEngine {
    pub fn new(valuation: ValuationConfig, policy: BreakPolicy) -> Self {
        Self {
            valuation,
            policy,
            auto_start: false,
            category: None,
            paused: false,
            auto_paused: false,
            selection: Selection::default(),
            elapsed_secs: 0,
            draft: None,
            session_secs: None,
            stint_secs: 0,
            totals: CategoryTotals::default(),
            counters: EventCounters::default(),
            ledger: Ledger::new(),
            breaks: BreakPolicyState::default(),
            break_pending: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn category(&self) -> Option<ActivityCategory> {
        self.category
    }

    pub fn is_working(&self) -> bool {
        self.category == Some(ActivityCategory::Working)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_auto_paused(&self) -> bool {
        self.auto_paused
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn target_secs(&self) -> u64 {
        valuation::target_duration(&self.valuation, &self.selection)
    }

    pub fn current_units(&self) -> f64 {
        valuation::unit_value(&self.valuation, &self.selection)
    }

    /// Elapsed minus target for the study in progress.
    pub fn running_variance_secs(&self) -> i64 {
        self.elapsed_secs as i64 - self.target_secs() as i64
    }

    pub fn session_started(&self) -> bool {
        self.session_secs.is_some()
    }

    pub fn session_secs(&self) -> u64 {
        self.session_secs.unwrap_or(0)
    }

    pub fn stint_secs(&self) -> u64 {
        self.stint_secs
    }

    /// Seconds in the current quick review; 0 when none is running.
    pub fn review_elapsed_secs(&self) -> u64 {
        if self.category == Some(ActivityCategory::QuickReview) {
            self.stint_secs
        } else {
            0
        }
    }

    pub fn totals(&self) -> &CategoryTotals {
        &self.totals
    }

    pub fn counters(&self) -> &EventCounters {
        &self.counters
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn break_state(&self) -> &BreakPolicyState {
        &self.breaks
    }

    pub fn break_pending(&self) -> bool {
        self.break_pending
    }

    pub fn draft(&self) -> Option<&DraftSlot> {
        self.draft.as_ref()
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn valuation(&self) -> &ValuationConfig {
        &self.valuation
    }

    pub fn policy(&self) -> &BreakPolicy {
        &self.policy
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            category: self.category,
            paused: self.paused,
            auto_paused: self.auto_paused,
            selection: self.selection.clone(),
            elapsed_secs: self.elapsed_secs,
            target_secs: self.target_secs(),
            session_secs: self.session_secs(),
            secs_since_break: self.breaks.secs_since_break,
            completed_count: self.ledger.completed_count(),
            cumulative_variance_secs: self.ledger.cumulative_variance_secs(),
            total_units: self.ledger.total_units(),
            units_per_hour: self.ledger.units_per_hour(),
            rolling_units: self.ledger.rolling_units(),
            streak: self.ledger.streak(),
            totals: self.totals,
            counters: self.counters,
            draft: self.draft.as_ref().map(|d| d.selection.clone()),
            break_pending: self.break_pending,
        }
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn set_auto_start(&mut self, enabled: bool) {
        self.auto_start = enabled;
    }

    /// Replace the valuation tables. Takes effect for the study in progress.
    pub fn set_valuation(&mut self, valuation: ValuationConfig) {
        self.valuation = valuation;
    }

    pub fn set_policy(&mut self, policy: BreakPolicy) {
        self.policy = policy;
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// Advance one second. Only counters implied by the current state move.
    pub fn tick(&mut self) {
        if let Some(secs) = self.session_secs.as_mut() {
            *secs += 1;
            if self.category != Some(ActivityCategory::OnBreak) {
                self.breaks.secs_since_break += 1;
            }
        }

        if let Some(category) = self.category {
            self.totals.add_second(category);
            self.stint_secs += 1;
            if category == ActivityCategory::Working {
                self.elapsed_secs += 1;
            }
        }
    }

    pub fn tick_n(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub fn apply(&mut self, action: Action, now: DateTime<Utc>) -> Result<Vec<Event>, ActionError> {
        match action {
            Action::SelectKind(kind) => Ok(self.select_kind(kind)),
            Action::ToggleModifier(modifier) => Ok(self.toggle_modifier(modifier)),
            Action::SetSelection(selection) => Ok(self.set_selection(selection)),
            Action::StartWork => self.start_work(),
            Action::PauseWork => self.pause_work(),
            Action::CompleteWork => self.complete_work(now),
            Action::Undo => self.undo_last_completion(),
            Action::DiscardStudy => self.discard_study(),
            Action::StartAdmin => Ok(self.start_interruption(ActivityCategory::Admin)),
            Action::StopAdmin => self.stop_interruption(ActivityCategory::Admin),
            Action::StartComms => Ok(self.start_interruption(ActivityCategory::Comms)),
            Action::StopComms => self.stop_interruption(ActivityCategory::Comms),
            Action::StartBreak => Ok(self.start_break()),
            Action::StopBreak => self.stop_break(),
            Action::AcceptBreak => self.accept_break(),
            Action::DeclineBreak => self.decline_break(),
            Action::StartQuickReview => self.start_quick_review(),
            Action::StopQuickReview => self.stop_quick_review(),
            Action::EnterDraft => self.enter_draft(),
            Action::ResumeDraft => self.resume_draft(),
        }
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn select_kind(&mut self, kind: StudyKind) -> Vec<Event> {
        self.selection.kind = Some(kind);
        let mut events = vec![self.selection_event()];
        events.extend(self.auto_start_on_select());
        events
    }

    pub fn toggle_modifier(&mut self, modifier: Modifier) -> Vec<Event> {
        self.selection.toggle(modifier);
        vec![self.selection_event()]
    }

    pub fn set_selection(&mut self, selection: Selection) -> Vec<Event> {
        self.selection = selection;
        let mut events = vec![self.selection_event()];
        events.extend(self.auto_start_on_select());
        events
    }

    fn selection_event(&self) -> Event {
        Event::SelectionChanged {
            selection: self.selection.clone(),
            target_secs: self.target_secs(),
            units: self.current_units(),
        }
    }

    fn auto_start_on_select(&mut self) -> Vec<Event> {
        if !self.auto_start || self.is_working() || self.selection.kind.is_none() {
            return Vec::new();
        }
        self.begin_work(true)
    }

    // ── Work ─────────────────────────────────────────────────────────

    pub fn start_work(&mut self) -> Result<Vec<Event>, ActionError> {
        if self.selection.kind.is_none() {
            return Err(ActionError::NoSelection);
        }
        if self.is_working() {
            return Ok(Vec::new());
        }
        Ok(self.begin_work(false))
    }

    fn begin_work(&mut self, automatic: bool) -> Vec<Event> {
        let Some(kind) = self.selection.kind else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if self.session_secs.is_none() {
            self.session_secs = Some(0);
            events.push(Event::SessionStarted);
        }
        events.extend(self.switch_to(ActivityCategory::Working));
        self.paused = false;
        self.auto_paused = false;
        events.push(Event::WorkStarted {
            kind,
            elapsed_secs: self.elapsed_secs,
            target_secs: self.target_secs(),
            automatic,
        });
        events
    }

    pub fn pause_work(&mut self) -> Result<Vec<Event>, ActionError> {
        if !self.is_working() {
            return Err(ActionError::NotWorking);
        }
        let mut events = self.switch_to(ActivityCategory::Interstitial);
        self.paused = true;
        events.push(Event::WorkPaused {
            elapsed_secs: self.elapsed_secs,
            automatic: false,
        });
        Ok(events)
    }

    pub fn complete_work(&mut self, now: DateTime<Utc>) -> Result<Vec<Event>, ActionError> {
        let Some(kind) = self.selection.kind else {
            return Err(ActionError::NoSelection);
        };
        if self.elapsed_secs == 0 && !self.is_working() {
            return Err(ActionError::NoTimerStarted);
        }

        let target_secs = self.target_secs();
        let units = self.current_units();
        let variance_secs = self.elapsed_secs as i64 - target_secs as i64;
        let outcome = self
            .ledger
            .record(variance_secs, units, self.session_secs(), now);

        tracing::info!(
            kind = %kind,
            elapsed = self.elapsed_secs,
            target = target_secs,
            variance = variance_secs,
            units,
            streak = outcome.streak,
            "study completed"
        );

        let mut events = vec![Event::StudyCompleted {
            kind,
            elapsed_secs: self.elapsed_secs,
            target_secs,
            variance_secs,
            units,
            streak: outcome.streak,
            at: now,
        }];
        events.extend(self.switch_to(ActivityCategory::Interstitial));
        self.selection = Selection::default();
        self.elapsed_secs = 0;
        self.paused = false;
        self.auto_paused = false;

        if self.policy.should_suggest(&self.breaks) {
            self.break_pending = true;
            events.push(Event::BreakSuggested {
                minutes_since_break: self.breaks.secs_since_break / 60,
            });
        }
        Ok(events)
    }

    pub fn undo_last_completion(&mut self) -> Result<Vec<Event>, ActionError> {
        let snapshot = self.ledger.undo(self.session_secs())?;
        tracing::info!(
            variance = snapshot.variance_secs,
            units = snapshot.units,
            "completion undone"
        );
        Ok(vec![Event::CompletionUndone {
            variance_secs: snapshot.variance_secs,
            units: snapshot.units,
            streak: self.ledger.streak(),
        }])
    }

    /// Drop the study in progress without scoring it.
    pub fn discard_study(&mut self) -> Result<Vec<Event>, ActionError> {
        if self.selection.kind.is_none() && self.elapsed_secs == 0 {
            return Err(ActionError::NoSelection);
        }
        let mut events = Vec::new();
        if self.is_working() {
            events.extend(self.switch_to(ActivityCategory::Interstitial));
        }
        events.push(Event::StudyDiscarded {
            elapsed_secs: self.elapsed_secs,
        });
        self.selection = Selection::default();
        self.elapsed_secs = 0;
        self.paused = false;
        self.auto_paused = false;
        Ok(events)
    }

    // ── Admin / Comms ────────────────────────────────────────────────

    pub fn start_admin(&mut self) -> Vec<Event> {
        self.start_interruption(ActivityCategory::Admin)
    }

    pub fn stop_admin(&mut self) -> Result<Vec<Event>, ActionError> {
        self.stop_interruption(ActivityCategory::Admin)
    }

    pub fn start_comms(&mut self) -> Vec<Event> {
        self.start_interruption(ActivityCategory::Comms)
    }

    pub fn stop_comms(&mut self) -> Result<Vec<Event>, ActionError> {
        self.stop_interruption(ActivityCategory::Comms)
    }

    fn start_interruption(&mut self, category: ActivityCategory) -> Vec<Event> {
        if self.category == Some(category) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.is_working() {
            self.paused = true;
            self.auto_paused = true;
            events.push(Event::WorkPaused {
                elapsed_secs: self.elapsed_secs,
                automatic: true,
            });
        }
        events.extend(self.switch_to(category));
        self.counters.record_entry(category);
        events
    }

    fn stop_interruption(&mut self, category: ActivityCategory) -> Result<Vec<Event>, ActionError> {
        if self.category != Some(category) {
            return Err(ActionError::NotActive(category));
        }

        let mut events = self.switch_to(ActivityCategory::Interstitial);
        if self.auto_paused {
            self.auto_paused = false;
            events.extend(self.begin_work(true));
        }
        Ok(events)
    }

    // ── Breaks ───────────────────────────────────────────────────────

    pub fn start_break(&mut self) -> Vec<Event> {
        if self.category == Some(ActivityCategory::OnBreak) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.is_working() {
            self.paused = true;
            events.push(Event::WorkPaused {
                elapsed_secs: self.elapsed_secs,
                automatic: false,
            });
        }
        self.auto_paused = false;
        events.extend(self.switch_to(ActivityCategory::OnBreak));
        self.breaks.on_break_started();
        self.counters.record_entry(ActivityCategory::OnBreak);
        self.break_pending = false;
        events
    }

    pub fn stop_break(&mut self) -> Result<Vec<Event>, ActionError> {
        if self.category != Some(ActivityCategory::OnBreak) {
            return Err(ActionError::NotActive(ActivityCategory::OnBreak));
        }
        Ok(self.switch_to(ActivityCategory::Interstitial))
    }

    pub fn accept_break(&mut self) -> Result<Vec<Event>, ActionError> {
        if !self.break_pending {
            return Err(ActionError::NoBreakSuggested);
        }
        Ok(self.start_break())
    }

    pub fn decline_break(&mut self) -> Result<Vec<Event>, ActionError> {
        if !self.break_pending {
            return Err(ActionError::NoBreakSuggested);
        }
        self.break_pending = false;
        self.breaks.on_declined();
        Ok(vec![Event::BreakDeclined {
            minutes_since_break: self.breaks.secs_since_break / 60,
        }])
    }

    // ── Quick review ─────────────────────────────────────────────────

    pub fn start_quick_review(&mut self) -> Result<Vec<Event>, ActionError> {
        if self.selection.kind.is_some() || self.elapsed_secs > 0 {
            return Err(ActionError::StudyInProgress);
        }
        if self.category == Some(ActivityCategory::QuickReview) {
            return Ok(Vec::new());
        }
        let events = self.switch_to(ActivityCategory::QuickReview);
        self.counters.record_entry(ActivityCategory::QuickReview);
        Ok(events)
    }

    pub fn stop_quick_review(&mut self) -> Result<Vec<Event>, ActionError> {
        if self.category != Some(ActivityCategory::QuickReview) {
            return Err(ActionError::NotActive(ActivityCategory::QuickReview));
        }
        Ok(self.switch_to(ActivityCategory::Interstitial))
    }

    // ── Draft slot ───────────────────────────────────────────────────

    pub fn enter_draft(&mut self) -> Result<Vec<Event>, ActionError> {
        if self.selection.kind.is_none() {
            return Err(ActionError::NoSelection);
        }
        if self.draft.is_some() {
            return Err(ActionError::DraftOccupied);
        }

        let target_secs = self.target_secs();
        let slot = DraftSlot {
            selection: std::mem::take(&mut self.selection),
            elapsed_secs: std::mem::take(&mut self.elapsed_secs),
            target_secs,
        };
        let mut events = self.switch_to(ActivityCategory::Interstitial);
        self.paused = false;
        self.auto_paused = false;
        events.push(Event::DraftSaved {
            selection: slot.selection.clone(),
            elapsed_secs: slot.elapsed_secs,
            target_secs: slot.target_secs,
        });
        self.draft = Some(slot);
        Ok(events)
    }

    /// Restore the parked study. Refused while another study holds the
    /// selection or has time on it; complete or discard that one first.
    pub fn resume_draft(&mut self) -> Result<Vec<Event>, ActionError> {
        if self.is_working() {
            return Err(ActionError::WorkingActive);
        }
        if self.draft.is_none() {
            return Err(ActionError::NoDraft);
        }
        if self.selection.kind.is_some() || self.elapsed_secs > 0 {
            return Err(ActionError::StudyInProgress);
        }
        let slot = self.draft.take().ok_or(ActionError::NoDraft)?;

        self.selection = slot.selection;
        self.elapsed_secs = slot.elapsed_secs;
        self.paused = self.elapsed_secs > 0;
        self.auto_paused = false;
        Ok(vec![Event::DraftResumed {
            selection: self.selection.clone(),
            elapsed_secs: self.elapsed_secs,
        }])
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Make `next` the only accruing category. Leaving a category resets
    /// the stint counter, which is also the quick-review elapsed counter.
    fn switch_to(&mut self, next: ActivityCategory) -> Vec<Event> {
        let previous = self.category;
        if previous == Some(next) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(prev) = previous.filter(|c| *c != ActivityCategory::Working) {
            events.push(Event::CategoryStopped {
                category: prev,
                duration_secs: self.stint_secs,
            });
        }
        self.category = Some(next);
        self.stint_secs = 0;
        if next != ActivityCategory::Working {
            events.push(Event::CategoryStarted { category: next });
        }

        tracing::debug!(from = ?previous, to = %next, "category switched");
        events
    }
}
