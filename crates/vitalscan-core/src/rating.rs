//! Core Web Vitals rating engine
//!
//! Pure threshold lookup. Ratings are a function of the raw metric value
//! only; the provider's own 0..=1 score is carried separately and never
//! feeds into the verdict.

use crate::types::Rating;

/// (signal key, good upper bound, poor lower bound)
///
/// Values at the good bound rate good; values at the poor bound still rate
/// needs-improvement. Time-based signals are in milliseconds, CLS is
/// unitless.
const THRESHOLDS: &[(&str, f64, f64)] = &[
    ("lcp", 2500.0, 4000.0),
    ("inp", 200.0, 500.0),
    ("cls", 0.10, 0.25),
    ("fcp", 1800.0, 3000.0),
    ("tbt", 200.0, 600.0),
    ("si", 3400.0, 5800.0),
    ("ttfb", 800.0, 1800.0),
];

/// Rate a metric value against the fixed thresholds for its signal.
///
/// Unknown signal keys fall back to `NeedsImprovement` rather than
/// erroring, so a new provider metric degrades to a neutral verdict.
pub fn rate(signal: &str, value: f64) -> Rating {
    let Some(&(_, good, poor)) = THRESHOLDS.iter().find(|(key, _, _)| *key == signal) else {
        return Rating::NeedsImprovement;
    };

    if value <= good {
        Rating::Good
    } else if value <= poor {
        Rating::NeedsImprovement
    } else {
        Rating::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcp_boundaries_inclusive_good() {
        assert_eq!(rate("lcp", 2500.0), Rating::Good);
        assert_eq!(rate("lcp", 2501.0), Rating::NeedsImprovement);
        assert_eq!(rate("lcp", 4000.0), Rating::NeedsImprovement);
        assert_eq!(rate("lcp", 4001.0), Rating::Poor);
    }

    #[test]
    fn test_inp_boundaries() {
        assert_eq!(rate("inp", 200.0), Rating::Good);
        assert_eq!(rate("inp", 500.0), Rating::NeedsImprovement);
        assert_eq!(rate("inp", 500.1), Rating::Poor);
    }

    #[test]
    fn test_cls_uses_unitless_thresholds() {
        assert_eq!(rate("cls", 0.05), Rating::Good);
        assert_eq!(rate("cls", 0.10), Rating::Good);
        assert_eq!(rate("cls", 0.2), Rating::NeedsImprovement);
        assert_eq!(rate("cls", 0.3), Rating::Poor);
    }

    #[test]
    fn test_remaining_signals() {
        assert_eq!(rate("fcp", 1800.0), Rating::Good);
        assert_eq!(rate("fcp", 3001.0), Rating::Poor);
        assert_eq!(rate("tbt", 450.0), Rating::NeedsImprovement);
        assert_eq!(rate("si", 5801.0), Rating::Poor);
        assert_eq!(rate("ttfb", 799.9), Rating::Good);
        assert_eq!(rate("ttfb", 1800.0), Rating::NeedsImprovement);
    }

    #[test]
    fn test_unknown_signal_defaults_to_needs_improvement() {
        assert_eq!(rate("fid", 10.0), Rating::NeedsImprovement);
        assert_eq!(rate("", 0.0), Rating::NeedsImprovement);
    }

    #[test]
    fn test_zero_values_rate_good_for_known_signals() {
        assert_eq!(rate("lcp", 0.0), Rating::Good);
        assert_eq!(rate("cls", 0.0), Rating::Good);
    }
}
