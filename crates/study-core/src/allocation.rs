//! Allocation evaluation: validate a submission against the shocked budget,
//! derive percentage shares, and attach the strategy read.

use std::collections::BTreeMap;

use contracts::{Allocation, ConditionConfig, ConditionVariant, EvaluationResult};
use rand::Rng;

use crate::shock;
use crate::strategy::StrategyPolicy;
use crate::EngineError;

const HEAVY_SHARE_THRESHOLD: f64 = 30.0;
const LIGHT_SHARE_THRESHOLD: f64 = 10.0;

/// Evaluate one allocation round against the condition's shocked budget.
///
/// Participant mistakes (overspend, unknown category, negative amount, a
/// budget the shock wiped out) come back as `valid: false` results with a
/// message; only a condition that cannot take allocations at all is an error.
pub fn evaluate_allocation(
    condition: &ConditionConfig,
    policy: &StrategyPolicy,
    allocation: &Allocation,
    fixed_shock: Option<i64>,
    rng: &mut impl Rng,
) -> Result<EvaluationResult, EngineError> {
    let (categories, frame_note) = match &condition.variant {
        ConditionVariant::Allocation {
            categories,
            frame_note,
        } => (categories, frame_note),
        ConditionVariant::Trust { .. } => {
            return Err(EngineError::ConditionMismatch {
                condition_id: condition.condition_id.clone(),
                expected: "allocation",
            });
        }
    };

    let shock_amount = match fixed_shock {
        Some(shock_amount) => shock_amount,
        None => shock::draw_range_shock(condition.shock_range, rng),
    };
    let net_amount = condition
        .total_available()
        .checked_sub(shock_amount)
        .ok_or(EngineError::ShockOutOfRange { shock_amount })?;
    // A sum past i64::MAX must still read as an overspend, not wrap under
    // the guard below.
    let total_allocated = allocation
        .values()
        .fold(0_i64, |total, amount| total.saturating_add(*amount));

    if net_amount <= 0 {
        return Ok(EvaluationResult::rejected(
            condition,
            shock_amount,
            net_amount,
            total_allocated,
            format!("Net amount ({net_amount}) leaves nothing to allocate"),
        ));
    }

    for (category, amount) in allocation {
        if !categories.iter().any(|known| known == category) {
            return Ok(EvaluationResult::rejected(
                condition,
                shock_amount,
                net_amount,
                total_allocated,
                format!("Unknown category ({category})"),
            ));
        }
        if *amount < 0 {
            return Ok(EvaluationResult::rejected(
                condition,
                shock_amount,
                net_amount,
                total_allocated,
                format!("Negative amount ({amount}) for {category}"),
            ));
        }
    }

    if total_allocated > net_amount {
        return Ok(EvaluationResult::rejected(
            condition,
            shock_amount,
            net_amount,
            total_allocated,
            format!("Total allocation ({total_allocated}) exceeds available amount ({net_amount})"),
        ));
    }

    // Shares are taken over the post-shock budget, not over the allocated
    // total, so underspending shows up as percentage mass below 100.
    let mut percentages = BTreeMap::new();
    for (category, amount) in allocation {
        percentages.insert(category.clone(), *amount as f64 / net_amount as f64 * 100.0);
    }

    let assessment = policy.classify(&percentages);

    let mut analysis = Vec::new();
    if let Some(note) = frame_note {
        analysis.push(note.clone());
    }
    analysis.push(assessment.insight.clone());
    for (category, share) in &percentages {
        if *share > HEAVY_SHARE_THRESHOLD {
            analysis.push(format!("Heavy investment in {category} ({share:.1}%)"));
        } else if *share < LIGHT_SHARE_THRESHOLD {
            analysis.push(format!("Conservative position in {category} ({share:.1}%)"));
        }
    }

    Ok(EvaluationResult::accepted(
        condition,
        shock_amount,
        net_amount,
        total_allocated,
        percentages,
        analysis,
        assessment,
    ))
}

/// Rejection for payloads that never parsed into amounts. No shock is drawn
/// and the budget is reported unshocked, since no round was actually played.
pub fn rejected_payload(condition: &ConditionConfig, message: impl Into<String>) -> EvaluationResult {
    EvaluationResult::rejected(condition, 0, condition.total_available(), 0, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConditionCatalog, PORTFOLIO_CONDITION_ID};
    use contracts::StrategyKind;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn test_rng() -> SmallRng {
        SmallRng::seed_from_u64(21)
    }

    fn condition(condition_id: &str) -> ConditionConfig {
        ConditionCatalog::builtin()
            .condition(condition_id)
            .expect("condition should exist")
            .clone()
    }

    fn allocation(entries: &[(&str, i64)]) -> Allocation {
        entries
            .iter()
            .map(|(category, amount)| (category.to_string(), *amount))
            .collect()
    }

    #[test]
    fn full_allocation_with_pinned_shock_matches_hand_math() {
        let config = condition("condition_a");
        let policy = StrategyPolicy::household_budget();
        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("savings", 3000), ("essential", 6000)]),
            Some(1000),
            &mut test_rng(),
        )
        .expect("evaluation should succeed");

        assert!(result.valid);
        assert_eq!(result.total_available, 10_000);
        assert_eq!(result.shock_amount, 1000);
        assert_eq!(result.net_amount, 9000);
        assert_eq!(result.total_allocated, 9000);
        assert_eq!(result.unallocated, Some(0));

        let savings = result.percentages["savings"];
        let essential = result.percentages["essential"];
        assert!((savings - 33.333_333).abs() < 0.001, "savings={savings}");
        assert!((essential - 66.666_667).abs() < 0.001, "essential={essential}");

        assert_eq!(result.analysis[0], "Response to temporal payment structure");
        assert!(
            result
                .analysis
                .contains(&"Heavy investment in essential (66.7%)".to_string()),
            "analysis={:?}",
            result.analysis
        );
    }

    #[test]
    fn overspending_is_rejected_with_amounts_in_the_message() {
        let config = condition("condition_a");
        let policy = StrategyPolicy::household_budget();
        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("savings", 9500)]),
            Some(1000),
            &mut test_rng(),
        )
        .expect("evaluation should succeed");

        assert!(!result.valid);
        assert_eq!(
            result.message.as_deref(),
            Some("Total allocation (9500) exceeds available amount (9000)")
        );
        assert!(result.percentages.is_empty());
        assert!(result.strategy.is_none());
        assert_eq!(result.unallocated, None);
    }

    #[test]
    fn unknown_categories_and_negative_amounts_are_rejected() {
        let config = condition("baseline");
        let policy = StrategyPolicy::household_budget();

        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("rent", 100)]),
            Some(0),
            &mut test_rng(),
        )
        .expect("evaluation should succeed");
        assert!(!result.valid);
        assert_eq!(result.message.as_deref(), Some("Unknown category (rent)"));

        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("savings", -5)]),
            Some(0),
            &mut test_rng(),
        )
        .expect("evaluation should succeed");
        assert!(!result.valid);
        assert_eq!(
            result.message.as_deref(),
            Some("Negative amount (-5) for savings")
        );
    }

    #[test]
    fn a_wiped_out_budget_is_rejected_before_any_division() {
        let config = condition("condition_a");
        let policy = StrategyPolicy::household_budget();

        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("savings", 100)]),
            Some(10_000),
            &mut test_rng(),
        )
        .expect("evaluation should succeed");
        assert!(!result.valid);
        assert_eq!(result.net_amount, 0);
        assert_eq!(
            result.message.as_deref(),
            Some("Net amount (0) leaves nothing to allocate")
        );

        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[]),
            Some(12_000),
            &mut test_rng(),
        )
        .expect("evaluation should succeed");
        assert!(!result.valid);
        assert_eq!(result.net_amount, -2000);
    }

    #[test]
    fn trust_conditions_cannot_take_allocations() {
        let config = condition("A");
        let policy = StrategyPolicy::household_budget();
        let err = evaluate_allocation(&config, &policy, &allocation(&[]), Some(0), &mut test_rng())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::ConditionMismatch {
                condition_id: "A".to_string(),
                expected: "allocation",
            }
        );
    }

    #[test]
    fn undrawn_shock_stays_within_the_stage_range() {
        let config = condition("condition_b");
        let policy = StrategyPolicy::household_budget();
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..32 {
            let result = evaluate_allocation(&config, &policy, &allocation(&[]), None, &mut rng)
                .expect("evaluation should succeed");
            assert!(
                (2000..=3000).contains(&result.shock_amount),
                "shock={}",
                result.shock_amount
            );
            assert_eq!(result.net_amount, 10_000 - result.shock_amount);
        }
    }

    #[test]
    fn portfolio_policy_flags_heavy_and_light_positions() {
        let config = condition(PORTFOLIO_CONDITION_ID);
        let policy = StrategyPolicy::venture_portfolio();
        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("AI Research", 7000), ("Blockchain", 0)]),
            None,
            &mut test_rng(),
        )
        .expect("evaluation should succeed");

        assert!(result.valid);
        // The portfolio frame has no shock, so the pool is the full lump sum.
        assert_eq!(result.shock_amount, 0);
        assert_eq!(result.net_amount, 10_000);

        let strategy = result.strategy.expect("accepted rounds carry a strategy");
        assert_eq!(strategy.strategy, StrategyKind::Aggressive);
        assert_eq!(strategy.monetary_outcome, 12_000);

        assert!(
            result
                .analysis
                .contains(&"Heavy investment in AI Research (70.0%)".to_string()),
            "analysis={:?}",
            result.analysis
        );
        assert!(
            result
                .analysis
                .contains(&"Conservative position in Blockchain (0.0%)".to_string()),
            "analysis={:?}",
            result.analysis
        );
    }

    #[test]
    fn overflowing_totals_still_reject_as_overspend() {
        let config = condition("condition_a");
        let policy = StrategyPolicy::household_budget();
        let result = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("savings", i64::MAX), ("essential", i64::MAX)]),
            Some(1000),
            &mut test_rng(),
        )
        .expect("evaluation should succeed");

        assert!(!result.valid);
        assert_eq!(result.total_allocated, i64::MAX);
        assert_eq!(
            result.message.as_deref(),
            Some("Total allocation (9223372036854775807) exceeds available amount (9000)")
        );
        assert!(result.percentages.is_empty());
        assert!(result.strategy.is_none());
    }

    #[test]
    fn pinned_shocks_that_overflow_the_budget_are_errors() {
        let config = condition("condition_a");
        let policy = StrategyPolicy::household_budget();
        let err = evaluate_allocation(
            &config,
            &policy,
            &allocation(&[("savings", 100)]),
            Some(i64::MIN),
            &mut test_rng(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::ShockOutOfRange {
                shock_amount: i64::MIN
            }
        );
    }

    #[test]
    fn rejected_payload_reports_the_unshocked_budget() {
        let config = condition("condition_c");
        let result = rejected_payload(&config, "Invalid amount for savings");
        assert!(!result.valid);
        assert_eq!(result.shock_amount, 0);
        assert_eq!(result.net_amount, 10_000);
        assert_eq!(result.total_allocated, 0);
        assert_eq!(result.message.as_deref(), Some("Invalid amount for savings"));
    }
}
