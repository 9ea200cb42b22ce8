//! Strategy classification policies. The thresholds are shared; the category
//! sets and projected-outcome tables differ per evaluator instantiation.

use std::collections::BTreeMap;

use contracts::{StrategyAssessment, StrategyKind};

const HIGH_RISK_SHARE_THRESHOLD: f64 = 60.0;
const SUSTAINABLE_SHARE_THRESHOLD: f64 = 50.0;
const FOCUS_SHARE_THRESHOLD: f64 = 40.0;
const SPREAD_SHARE_THRESHOLD: f64 = 25.0;

#[derive(Debug, Clone, Copy)]
struct StrategyProfile {
    monetary_outcome: i64,
    impact_score: i64,
    insight: &'static str,
}

/// Category sets and outcome table for one domain of allocations.
#[derive(Debug, Clone)]
pub struct StrategyPolicy {
    pub scheme: &'static str,
    high_risk_categories: &'static [&'static str],
    sustainable_categories: &'static [&'static str],
    conservative: StrategyProfile,
    aggressive: StrategyProfile,
    innovative: StrategyProfile,
    sustainable: StrategyProfile,
    balanced: StrategyProfile,
}

impl StrategyPolicy {
    /// Policy for the staged household budget frames.
    pub fn household_budget() -> Self {
        Self {
            scheme: "household_budget",
            high_risk_categories: &["discretionary", "social"],
            sustainable_categories: &["savings", "essential"],
            conservative: StrategyProfile {
                monetary_outcome: 8500,
                impact_score: 6500,
                insight: "Cautious spending spread with little committed anywhere.",
            },
            aggressive: StrategyProfile {
                monetary_outcome: 11_000,
                impact_score: 4500,
                insight: "Discretionary-heavy budget vulnerable to income shocks.",
            },
            innovative: StrategyProfile {
                monetary_outcome: 9500,
                impact_score: 7000,
                insight: "Concentrated commitment to a single budget priority.",
            },
            sustainable: StrategyProfile {
                monetary_outcome: 7500,
                impact_score: 8500,
                insight: "Savings-first budget that absorbs shocks well.",
            },
            balanced: StrategyProfile {
                monetary_outcome: 9000,
                impact_score: 7000,
                insight: "Even coverage of essentials with room for flexibility.",
            },
        }
    }

    /// Policy for the standalone venture portfolio exercise.
    pub fn venture_portfolio() -> Self {
        Self {
            scheme: "venture_portfolio",
            high_risk_categories: &["AI Research", "Blockchain", "Quantum Computing"],
            sustainable_categories: &["Sustainable Tech", "Environmental Conservation"],
            conservative: StrategyProfile {
                monetary_outcome: 8000,
                impact_score: 7000,
                insight: "Lower risk with stable returns. Good for uncertain markets.",
            },
            aggressive: StrategyProfile {
                monetary_outcome: 12_000,
                impact_score: 5000,
                insight: "High potential returns but increased volatility.",
            },
            innovative: StrategyProfile {
                monetary_outcome: 10_000,
                impact_score: 8000,
                insight: "Good balance of innovation and stability.",
            },
            sustainable: StrategyProfile {
                monetary_outcome: 7000,
                impact_score: 9000,
                insight: "Strong long-term impact focus with moderate returns.",
            },
            balanced: StrategyProfile {
                monetary_outcome: 9000,
                impact_score: 7500,
                insight: "Well-rounded approach with good risk management.",
            },
        }
    }

    /// Classify percentage shares into a strategy. First matching rule wins,
    /// and that ordering is the tie-break policy. Total over any input,
    /// including an empty map, which classifies as the widest spread.
    pub fn classify(&self, percentages: &BTreeMap<String, f64>) -> StrategyAssessment {
        let high_risk_share = combined_share(percentages, self.high_risk_categories);
        let sustainable_share = combined_share(percentages, self.sustainable_categories);
        let largest_share = percentages.values().copied().fold(0.0_f64, f64::max);

        let strategy = if high_risk_share > HIGH_RISK_SHARE_THRESHOLD {
            StrategyKind::Aggressive
        } else if sustainable_share > SUSTAINABLE_SHARE_THRESHOLD {
            StrategyKind::Sustainable
        } else if largest_share > FOCUS_SHARE_THRESHOLD {
            StrategyKind::Innovative
        } else if largest_share < SPREAD_SHARE_THRESHOLD {
            StrategyKind::Conservative
        } else {
            StrategyKind::Balanced
        };

        let profile = self.profile(strategy);
        StrategyAssessment {
            strategy,
            monetary_outcome: profile.monetary_outcome,
            impact_score: profile.impact_score,
            insight: profile.insight.to_string(),
        }
    }

    fn profile(&self, strategy: StrategyKind) -> StrategyProfile {
        match strategy {
            StrategyKind::Conservative => self.conservative,
            StrategyKind::Aggressive => self.aggressive,
            StrategyKind::Innovative => self.innovative,
            StrategyKind::Sustainable => self.sustainable,
            StrategyKind::Balanced => self.balanced,
        }
    }
}

fn combined_share(percentages: &BTreeMap<String, f64>, categories: &[&str]) -> f64 {
    categories
        .iter()
        .map(|category| percentages.get(*category).copied().unwrap_or(0.0))
        .sum()
}
