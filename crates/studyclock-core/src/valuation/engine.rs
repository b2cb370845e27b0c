use super::table::ValuationConfig;
use crate::study::Selection;

/// Expected seconds for a selection.
///
/// The kind's target plus every additive modifier's target. When the
/// duplicate-side modifier is present the sum is doubled after all additive
/// modifiers are folded in; its own entry never adds anything.
pub fn target_duration(config: &ValuationConfig, selection: &Selection) -> u64 {
    let Some(kind) = selection.kind else {
        return 0;
    };

    let mut total = config.target_for(kind.as_str());
    let mut doubled = false;
    for modifier in &selection.modifiers {
        if modifier.is_duplicate_side() {
            doubled = true;
            continue;
        }
        total = total.saturating_add(config.target_for(modifier.as_str()));
    }

    if doubled {
        total.saturating_mul(2)
    } else {
        total
    }
}

/// Unit value credited when the selection is completed.
///
/// Per-kind modifier entries contribute only their value for the selected
/// kind. The duplicate-side flag has no multiplier here.
pub fn unit_value(config: &ValuationConfig, selection: &Selection) -> f64 {
    let Some(kind) = selection.kind else {
        return 0.0;
    };

    let base = config
        .unit_weight(kind.as_str())
        .map(|w| w.for_kind(kind))
        .unwrap_or(0.0);

    selection.modifiers.iter().fold(base, |acc, modifier| {
        acc + config
            .unit_weight(modifier.as_str())
            .map(|w| w.for_kind(kind))
            .unwrap_or(0.0)
    })
}
