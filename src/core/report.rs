use serde::Serialize;

use super::types::RiskSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Covered,
    Shortfall,
}

pub fn verdict(summary: &RiskSummary) -> Verdict {
    if summary.budget_gap < 0.0 {
        Verdict::Shortfall
    } else {
        Verdict::Covered
    }
}

/// Fraction of the 95% safe level the budget covers, clamped to [0, 1].
/// Drives the presentation layer's coverage bar.
pub fn coverage_ratio(summary: &RiskSummary, budget: f64) -> f64 {
    if summary.safe_budget_95 <= 0.0 {
        return 1.0;
    }
    (budget / summary.safe_budget_95).clamp(0.0, 1.0)
}

/// Plain-text banner for a finished run. Pure formatting over the summary;
/// no colors, no I/O.
pub fn headline(summary: &RiskSummary, budget: f64) -> String {
    match verdict(summary) {
        Verdict::Shortfall => format!(
            "Budget {budget:.0} is short of the 95% safe level {:.0} by {:.0}; \
             {:.1}% of simulated months run over budget.",
            summary.safe_budget_95,
            -summary.budget_gap,
            summary.exceedance_probability,
        ),
        Verdict::Covered => format!(
            "Budget {budget:.0} covers the 95% safe level {:.0} with {:.0} to spare; \
             {:.1}% of simulated months run over budget.",
            summary.safe_budget_95,
            summary.budget_gap,
            summary.exceedance_probability,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(safe_budget_95: f64, budget: f64) -> RiskSummary {
        RiskSummary {
            exceedance_probability: 12.5,
            safe_budget_95,
            budget_gap: budget - safe_budget_95,
        }
    }

    #[test]
    fn negative_gap_is_a_shortfall() {
        let s = summary(3_000_000.0, 2_500_000.0);
        assert_eq!(verdict(&s), Verdict::Shortfall);
    }

    #[test]
    fn zero_and_positive_gaps_are_covered() {
        assert_eq!(verdict(&summary(2_500_000.0, 2_500_000.0)), Verdict::Covered);
        assert_eq!(verdict(&summary(2_000_000.0, 2_500_000.0)), Verdict::Covered);
    }

    #[test]
    fn coverage_ratio_clamps_to_unit_interval() {
        let short = summary(4_000_000.0, 1_000_000.0);
        assert!((coverage_ratio(&short, 1_000_000.0) - 0.25).abs() < 1e-9);

        let covered = summary(2_000_000.0, 3_000_000.0);
        assert!((coverage_ratio(&covered, 3_000_000.0) - 1.0).abs() < 1e-9);

        let negative = summary(2_000_000.0, -500.0);
        assert!(coverage_ratio(&negative, -500.0) >= 0.0);
    }

    #[test]
    fn coverage_ratio_is_full_when_safe_level_is_non_positive() {
        let s = summary(0.0, 100.0);
        assert!((coverage_ratio(&s, 100.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn headline_names_the_shortfall_amount() {
        let s = summary(3_000_000.0, 2_500_000.0);
        let text = headline(&s, 2_500_000.0);
        assert!(text.contains("short"));
        assert!(text.contains("500000"));
        assert!(text.contains("12.5%"));
    }

    #[test]
    fn headline_names_the_surplus_amount() {
        let s = summary(2_000_000.0, 2_600_000.0);
        let text = headline(&s, 2_600_000.0);
        assert!(text.contains("to spare"));
        assert!(text.contains("600000"));
    }
}
