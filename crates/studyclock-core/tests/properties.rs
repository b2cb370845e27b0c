//! Property tests for valuation and the session engine.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use studyclock_core::timer::MAX_STREAK;
use studyclock_core::{
    target_duration, unit_value, Action, BreakPolicy, Modifier, Selection, SessionEngine,
    StudyKind, ValuationConfig,
};

fn kind_strategy() -> impl Strategy<Value = StudyKind> {
    prop::sample::select(StudyKind::ALL.to_vec())
}

fn modifier_strategy() -> impl Strategy<Value = Modifier> {
    prop::sample::select(Modifier::ALL.to_vec())
}

fn selection_strategy() -> impl Strategy<Value = Selection> {
    (
        prop::option::of(kind_strategy()),
        prop::collection::btree_set(modifier_strategy(), 0..5),
    )
        .prop_map(|(kind, modifiers)| Selection { kind, modifiers })
}

fn valuation_strategy() -> impl Strategy<Value = ValuationConfig> {
    prop::collection::vec(0u64..2_000, StudyKind::ALL.len() + Modifier::ALL.len()).prop_map(
        |secs| {
            let mut cfg = ValuationConfig::default();
            let keys = StudyKind::ALL
                .iter()
                .map(|k| k.as_str())
                .chain(Modifier::ALL.iter().map(|m| m.as_str()));
            for (key, s) in keys.zip(secs) {
                cfg.set_target(key, s);
            }
            cfg
        },
    )
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        kind_strategy().prop_map(Action::SelectKind),
        modifier_strategy().prop_map(Action::ToggleModifier),
        Just(Action::StartWork),
        Just(Action::PauseWork),
        Just(Action::CompleteWork),
        Just(Action::Undo),
        Just(Action::DiscardStudy),
        Just(Action::StartAdmin),
        Just(Action::StopAdmin),
        Just(Action::StartComms),
        Just(Action::StopComms),
        Just(Action::StartBreak),
        Just(Action::StopBreak),
        Just(Action::AcceptBreak),
        Just(Action::DeclineBreak),
        Just(Action::StartQuickReview),
        Just(Action::StopQuickReview),
        Just(Action::EnterDraft),
        Just(Action::ResumeDraft),
    ]
}

fn script_strategy() -> impl Strategy<Value = Vec<(Action, u64)>> {
    prop::collection::vec((action_strategy(), 0u64..400), 0..60)
}

proptest! {
    #[test]
    fn target_is_sum_doubled_by_bilateral(cfg in valuation_strategy(), sel in selection_strategy()) {
        let total = target_duration(&cfg, &sel);
        let mut without_flag = sel.clone();
        without_flag.modifiers.remove(&Modifier::Bilateral);
        let base = target_duration(&cfg, &without_flag);

        if sel.kind.is_some() && sel.modifiers.contains(&Modifier::Bilateral) {
            prop_assert_eq!(total, base * 2);
        } else {
            prop_assert_eq!(total, base);
        }
    }

    #[test]
    fn unit_value_ignores_bilateral(sel in selection_strategy()) {
        let cfg = ValuationConfig::default();
        let mut toggled = sel.clone();
        toggled.toggle(Modifier::Bilateral);
        prop_assert!((unit_value(&cfg, &sel) - unit_value(&cfg, &toggled)).abs() < 1e-9);
        prop_assert!(unit_value(&cfg, &sel) >= 0.0);
    }

    #[test]
    fn any_script_keeps_invariants(script in script_strategy()) {
        let mut engine = SessionEngine::new(ValuationConfig::default(), BreakPolicy::default());
        let start = Utc::now();
        let mut elapsed_wall = 0i64;

        for (action, ticks) in script {
            let before = engine.clone();
            let result = engine.apply(action, start + Duration::seconds(elapsed_wall));
            if result.is_err() {
                // Rejected actions leave no trace.
                prop_assert_eq!(
                    serde_json::to_value(&before).unwrap(),
                    serde_json::to_value(&engine).unwrap()
                );
            }

            let working_before = engine.is_working();
            let elapsed_before = engine.elapsed_secs();
            engine.tick_n(ticks);
            elapsed_wall += ticks as i64;

            prop_assert!(engine.ledger().streak() <= MAX_STREAK);
            if !working_before {
                prop_assert_eq!(engine.elapsed_secs(), elapsed_before);
            }
            if engine.session_started() {
                prop_assert!(engine.totals().working <= engine.session_secs());
            }
        }
    }

    #[test]
    fn complete_then_undo_restores_metrics(script in script_strategy(), kind in kind_strategy(), work in 1u64..1_000) {
        let mut engine = SessionEngine::new(ValuationConfig::default(), BreakPolicy::default());
        let now = Utc::now();
        for (action, ticks) in script {
            let _ = engine.apply(action, now);
            engine.tick_n(ticks);
        }

        let _ = engine.resume_draft();
        let _ = engine.discard_study();
        engine.select_kind(kind);
        engine.start_work().unwrap();
        engine.tick_n(work);

        let variance = engine.ledger().cumulative_variance_secs();
        let units = engine.ledger().total_units();
        let streak = engine.ledger().streak();
        let count = engine.ledger().completed_count();

        engine.complete_work(now).unwrap();
        engine.undo_last_completion().unwrap();

        prop_assert_eq!(engine.ledger().cumulative_variance_secs(), variance);
        prop_assert!((engine.ledger().total_units() - units).abs() < 1e-6);
        prop_assert_eq!(engine.ledger().streak(), streak);
        prop_assert_eq!(engine.ledger().completed_count(), count);
        prop_assert!(engine.undo_last_completion().is_err());
    }
}
