//! Interactive session loop.
//!
//! The engine is ticked once per wall-clock second while stdin lines are
//! parsed into commands between ticks. Counters reset on every launch; only
//! preferences toggled here are written back to the config file.

use std::error::Error;
use std::io::Write;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Duration, MissedTickBehavior};

use studyclock_core::format;
use studyclock_core::storage::load_engine;
use studyclock_core::timer::{Clock, SystemClock, WallTicker, MAX_STREAK};
use studyclock_core::{
    Action, ActionError, ActivityCategory, Config, ConfigFile, Event, Modifier, Preference,
    PreferenceStore, Selection, SessionEngine, StudyKind,
};

const BELL: &str = "\x07";

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    Start,
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SessionCommand {
    /// Select a study kind, optionally replacing the modifiers
    Select {
        kind: StudyKind,
        /// Modifier slugs: section1, section2, contrast, comparison, bilateral
        modifiers: Vec<Modifier>,
    },
    /// Flip one modifier on the current selection
    Toggle { modifier: Modifier },
    /// Start or resume timing the selected study
    Start,
    /// Pause the running study
    Pause,
    /// Complete the study and score it
    #[command(alias = "complete")]
    Done,
    /// Revert the last completion
    Undo,
    /// Drop the current study without scoring it
    Discard,
    /// Administrative interruption
    Admin {
        #[arg(value_enum, default_value_t = Phase::Start)]
        phase: Phase,
    },
    /// Communications interruption
    Comms {
        #[arg(value_enum, default_value_t = Phase::Start)]
        phase: Phase,
    },
    /// Take a break, pausing any running study
    Break {
        #[arg(value_enum, default_value_t = Phase::Start)]
        phase: Phase,
    },
    /// Timed quick review outside any study
    Review {
        #[arg(value_enum, default_value_t = Phase::Start)]
        phase: Phase,
    },
    /// Park the current study in the draft slot
    Draft,
    /// Restore the parked study
    Resume,
    /// Accept the suggested break
    Yes,
    /// Decline the suggested break
    No,
    /// Toggle auto-start on select (persisted)
    Auto {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Show the session dashboard
    Status,
    /// End the session
    #[command(alias = "exit")]
    Quit,
}

impl SessionCommand {
    /// Engine action for this command, or `None` for commands handled by the
    /// loop itself.
    pub fn action(&self) -> Option<Action> {
        let action = match self {
            SessionCommand::Select { kind, modifiers } if modifiers.is_empty() => {
                Action::SelectKind(*kind)
            }
            SessionCommand::Select { kind, modifiers } => Action::SetSelection(Selection {
                kind: Some(*kind),
                modifiers: modifiers.iter().copied().collect(),
            }),
            SessionCommand::Toggle { modifier } => Action::ToggleModifier(*modifier),
            SessionCommand::Start => Action::StartWork,
            SessionCommand::Pause => Action::PauseWork,
            SessionCommand::Done => Action::CompleteWork,
            SessionCommand::Undo => Action::Undo,
            SessionCommand::Discard => Action::DiscardStudy,
            SessionCommand::Admin { phase: Phase::Start } => Action::StartAdmin,
            SessionCommand::Admin { phase: Phase::Stop } => Action::StopAdmin,
            SessionCommand::Comms { phase: Phase::Start } => Action::StartComms,
            SessionCommand::Comms { phase: Phase::Stop } => Action::StopComms,
            SessionCommand::Break { phase: Phase::Start } => Action::StartBreak,
            SessionCommand::Break { phase: Phase::Stop } => Action::StopBreak,
            SessionCommand::Review { phase: Phase::Start } => Action::StartQuickReview,
            SessionCommand::Review { phase: Phase::Stop } => Action::StopQuickReview,
            SessionCommand::Draft => Action::EnterDraft,
            SessionCommand::Resume => Action::ResumeDraft,
            SessionCommand::Yes => Action::AcceptBreak,
            SessionCommand::No => Action::DeclineBreak,
            SessionCommand::Auto { .. } | SessionCommand::Status | SessionCommand::Quit => {
                return None
            }
        };
        Some(action)
    }
}

/// Result of one input line.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue(Vec<String>),
    Quit,
}

/// Display options fixed for the whole session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Display {
    pub accessible: bool,
}

impl Display {
    fn alert(&self, message: String) -> String {
        if self.accessible {
            format!("! {message}")
        } else {
            format!("{BELL}{message}")
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let store = ConfigFile::default_location()?;
    let engine = load_engine(&store, &store, config.break_policy)?;
    let display = Display {
        accessible: config.preferences.accessible_display,
    };

    tracing::info!(path = %store.path().display(), "session starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session_loop(engine, &store, display))
}

async fn session_loop(
    mut engine: SessionEngine,
    store: &impl PreferenceStore,
    display: Display,
) -> Result<(), Box<dyn Error>> {
    let clock = SystemClock;
    let mut ticker = WallTicker::new(clock.now());
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("studyclock session. Type `help` for commands.");
    prompt()?;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                engine.tick_n(ticker.due_ticks(clock.now()));
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                engine.tick_n(ticker.due_ticks(clock.now()));

                match handle_line(&mut engine, store, &line, clock.now(), display) {
                    Flow::Continue(output) => {
                        for out in output {
                            println!("{out}");
                        }
                        prompt()?;
                    }
                    Flow::Quit => break,
                }
            }
        }
    }

    for line in render_status(&engine, display) {
        println!("{line}");
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

/// Parse and apply one line of input.
pub fn handle_line(
    engine: &mut SessionEngine,
    store: &impl PreferenceStore,
    line: &str,
    now: DateTime<Utc>,
    display: Display,
) -> Flow {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Flow::Continue(Vec::new());
    }

    let command = match SessionLine::try_parse_from(words) {
        Ok(parsed) => parsed.command,
        Err(e) => return Flow::Continue(vec![e.to_string().trim_end().to_string()]),
    };

    match command {
        SessionCommand::Quit => Flow::Quit,
        SessionCommand::Status => Flow::Continue(render_status(engine, display)),
        SessionCommand::Auto { state } => {
            let enabled = state == Switch::On;
            engine.set_auto_start(enabled);
            let mut out = vec![format!(
                "auto-start {}",
                if enabled { "on" } else { "off" }
            )];
            if let Err(e) = store.save_preference(Preference::AutoStart, enabled) {
                tracing::warn!(error = %e, "could not persist auto-start");
                out.push(format!("warning: not saved ({e})"));
            }
            Flow::Continue(out)
        }
        other => {
            let Some(action) = other.action() else {
                return Flow::Continue(Vec::new());
            };
            match engine.apply(action, now) {
                Ok(events) => Flow::Continue(
                    events
                        .iter()
                        .filter_map(|e| render_event(e, display))
                        .collect(),
                ),
                Err(e) => Flow::Continue(vec![render_error(&e, display)]),
            }
        }
    }
}

fn render_error(error: &ActionError, display: Display) -> String {
    if error.is_blocking() {
        display.alert(error.to_string())
    } else {
        error.to_string()
    }
}

/// One line per event worth showing; `None` for silent ones.
pub fn render_event(event: &Event, display: Display) -> Option<String> {
    let line = match event {
        Event::SessionStarted => "session clock started".to_string(),
        Event::SelectionChanged {
            selection,
            target_secs,
            units,
        } => format!(
            "selected {} (target {}, {} units)",
            selection.label(),
            format::clock(*target_secs),
            format::units(*units)
        ),
        Event::WorkStarted {
            kind,
            elapsed_secs,
            automatic,
            ..
        } => {
            let how = if *automatic { " (auto)" } else { "" };
            format!("working on {kind} at {}{how}", format::clock(*elapsed_secs))
        }
        Event::WorkPaused {
            elapsed_secs,
            automatic,
        } => {
            let how = if *automatic { " (auto)" } else { "" };
            format!("paused at {}{how}", format::clock(*elapsed_secs))
        }
        Event::StudyCompleted {
            kind,
            elapsed_secs,
            variance_secs,
            units,
            streak,
            ..
        } => format!(
            "{kind} done in {} ({}) +{} units  {}",
            format::clock(*elapsed_secs),
            format::variance(*variance_secs, display.accessible),
            format::units(*units),
            format::streak(*streak, MAX_STREAK)
        ),
        Event::CompletionUndone {
            variance_secs,
            units,
            streak,
        } => format!(
            "undid completion ({}, -{} units)  {}",
            format::variance(*variance_secs, display.accessible),
            format::units(*units),
            format::streak(*streak, MAX_STREAK)
        ),
        Event::StudyDiscarded { elapsed_secs } => {
            format!("discarded study at {}", format::clock(*elapsed_secs))
        }
        Event::CategoryStarted { category } => match category {
            ActivityCategory::Interstitial => return None,
            other => format!("{other} started"),
        },
        Event::CategoryStopped {
            category,
            duration_secs,
        } => match category {
            ActivityCategory::Interstitial => return None,
            other => format!("{other} stopped after {}", format::clock(*duration_secs)),
        },
        Event::BreakSuggested {
            minutes_since_break,
        } => display.alert(format!(
            "{minutes_since_break} min since your last break. Take one? [yes/no]"
        )),
        Event::BreakDeclined { .. } => "break declined".to_string(),
        Event::DraftSaved {
            selection,
            elapsed_secs,
            ..
        } => format!(
            "parked {} at {}",
            selection.label(),
            format::clock(*elapsed_secs)
        ),
        Event::DraftResumed {
            selection,
            elapsed_secs,
        } => format!(
            "resumed {} at {}",
            selection.label(),
            format::clock(*elapsed_secs)
        ),
        Event::StateSnapshot { .. } => return None,
    };
    Some(line)
}

pub fn render_status(engine: &SessionEngine, display: Display) -> Vec<String> {
    let mut out = Vec::new();

    let state = match engine.category() {
        None => "idle".to_string(),
        Some(category) if engine.is_paused() && category != ActivityCategory::Working => {
            format!("{category} (study paused)")
        }
        Some(category) => category.to_string(),
    };
    out.push(format!("state: {state}"));

    if engine.selection().kind.is_some() || engine.elapsed_secs() > 0 {
        out.push(format!(
            "study: {}  {} / {}  ({})",
            engine.selection().label(),
            format::clock(engine.elapsed_secs()),
            format::clock(engine.target_secs()),
            format::variance(engine.running_variance_secs(), display.accessible)
        ));
    }
    if engine.category() == Some(ActivityCategory::QuickReview) {
        out.push(format!(
            "review: {}",
            format::clock(engine.review_elapsed_secs())
        ));
    }
    if let Some(draft) = engine.draft() {
        out.push(format!(
            "draft: {}  {} / {}",
            draft.selection.label(),
            format::clock(draft.elapsed_secs),
            format::clock(draft.target_secs)
        ));
    }

    let ledger = engine.ledger();
    out.push(format!(
        "session {}  completed {}  units {}  rate {}/h  last hour {}",
        format::clock(engine.session_secs()),
        ledger.completed_count(),
        format::units(ledger.total_units()),
        format::units(ledger.units_per_hour()),
        format::units(ledger.rolling_units())
    ));
    out.push(format!(
        "streak {}  variance {}",
        format::streak(ledger.streak(), MAX_STREAK),
        format::variance(ledger.cumulative_variance_secs(), display.accessible)
    ));

    let totals = engine.totals();
    let counters = engine.counters();
    out.push(format!(
        "working {}  admin {} ({}x)  comms {} ({}x)  break {} ({}x)  review {} ({}x)",
        format::clock(totals.working),
        format::clock(totals.admin),
        counters.admin,
        format::clock(totals.comms),
        counters.comms,
        format::clock(totals.on_break),
        counters.breaks,
        format::clock(totals.quick_review),
        counters.quick_reviews
    ));
    if engine.break_pending() {
        out.push("break suggested: answer yes or no".to_string());
    }
    out
}
