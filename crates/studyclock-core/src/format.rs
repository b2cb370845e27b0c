//! Display helpers shared by front ends.
//!
//! The accessible variants carry meaning in glyphs only: no ANSI color and
//! an explicit `+`/`-` sign on every variance.

/// `m:ss`, or `h:mm:ss` from one hour up.
pub fn clock(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Under,
    Even,
    Over,
}

pub fn tone(variance_secs: i64) -> Tone {
    match variance_secs {
        v if v < 0 => Tone::Under,
        0 => Tone::Even,
        _ => Tone::Over,
    }
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Variance against target.
///
/// Colored magnitude by default (green under, red over). In accessible mode
/// the sign is spelled out and no escape codes are emitted.
pub fn variance(variance_secs: i64, accessible: bool) -> String {
    let magnitude = clock(variance_secs.unsigned_abs());
    match (tone(variance_secs), accessible) {
        (Tone::Under, true) => format!("-{magnitude}"),
        (Tone::Over, true) => format!("+{magnitude}"),
        (Tone::Even, true) => format!("±{magnitude}"),
        (Tone::Under, false) => format!("{GREEN}{magnitude}{RESET}"),
        (Tone::Over, false) => format!("{RED}{magnitude}{RESET}"),
        (Tone::Even, false) => magnitude,
    }
}

pub fn units(value: f64) -> String {
    format!("{value:.2}")
}

/// Streak as filled and empty pips, e.g. `●●●○○○`.
pub fn streak(value: u8, max: u8) -> String {
    let filled = value.min(max) as usize;
    let empty = max as usize - filled;
    format!("{}{}", "●".repeat(filled), "○".repeat(empty))
}
