use dosebench_core::InvocationOutcome;

pub(crate) fn format_secs(secs: f64) -> String {
    if secs.is_finite() {
        format!("{secs:.3}s")
    } else {
        "-".to_string()
    }
}

pub(crate) fn format_rate(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}")
    } else {
        "0".to_string()
    }
}

/// `ok`, or `FAIL (<subtype>)`.
pub(crate) fn format_outcome(outcome: &InvocationOutcome) -> String {
    if outcome.is_success() {
        outcome.to_string()
    } else {
        format!("FAIL ({outcome})")
    }
}
