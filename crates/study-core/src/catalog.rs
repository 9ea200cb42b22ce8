//! Builtin condition catalog: the four trust conditions, the five staged
//! allocation frames, and the standalone portfolio exercise.

use std::collections::BTreeMap;

use contracts::{ConditionConfig, ConditionVariant, ShockRange, SCHEMA_VERSION_V1};

use crate::EngineError;

pub const PORTFOLIO_CONDITION_ID: &str = "venture_portfolio";

const BUDGET_CATEGORIES: [&str; 6] = [
    "discretionary",
    "savings",
    "essential",
    "transportation",
    "social",
    "work",
];

const PORTFOLIO_CATEGORIES: [&str; 5] = [
    "AI Research",
    "Blockchain",
    "Quantum Computing",
    "Sustainable Tech",
    "Environmental Conservation",
];

/// Every condition the engine knows about, keyed by condition id, plus the
/// fixed order the staged allocation frames are played in.
#[derive(Debug, Clone)]
pub struct ConditionCatalog {
    conditions: BTreeMap<String, ConditionConfig>,
    stage_order: Vec<String>,
}

impl ConditionCatalog {
    pub fn builtin() -> Self {
        let mut conditions = BTreeMap::new();
        for config in builtin_trust_conditions() {
            conditions.insert(config.condition_id.clone(), config);
        }

        let stages = builtin_stages();
        let stage_order = stages
            .iter()
            .map(|config| config.condition_id.clone())
            .collect();
        for config in stages {
            conditions.insert(config.condition_id.clone(), config);
        }

        let portfolio = portfolio_condition();
        conditions.insert(portfolio.condition_id.clone(), portfolio);

        Self {
            conditions,
            stage_order,
        }
    }

    pub fn condition(&self, condition_id: &str) -> Result<&ConditionConfig, EngineError> {
        self.conditions
            .get(condition_id)
            .ok_or_else(|| EngineError::UnknownCondition {
                condition_id: condition_id.to_string(),
            })
    }

    /// Like [`Self::condition`], but only resolves ids that belong to the
    /// staged sequence.
    pub fn stage(&self, stage_id: &str) -> Result<&ConditionConfig, EngineError> {
        if !self.stage_order.iter().any(|stage| stage == stage_id) {
            return Err(EngineError::UnknownStage {
                stage_id: stage_id.to_string(),
            });
        }
        self.conditions
            .get(stage_id)
            .ok_or_else(|| EngineError::UnknownStage {
                stage_id: stage_id.to_string(),
            })
    }

    pub fn stage_order(&self) -> &[String] {
        &self.stage_order
    }

    pub fn first_stage(&self) -> Option<&str> {
        self.stage_order.first().map(String::as_str)
    }

    pub fn conditions(&self) -> impl Iterator<Item = &ConditionConfig> {
        self.conditions.values()
    }

    pub fn trust_condition_ids(&self) -> Vec<&str> {
        self.conditions
            .values()
            .filter(|config| config.is_trust())
            .map(|config| config.condition_id.as_str())
            .collect()
    }
}

fn trust_condition(
    condition_id: &str,
    payment_type: &str,
    description: &str,
    base_salary: i64,
    additional_payment: i64,
    shock_probability: f64,
    shock_range: ShockRange,
    bonus_multiplier: f64,
    penalty_multiplier: f64,
) -> ConditionConfig {
    ConditionConfig {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        condition_id: condition_id.to_string(),
        payment_type: payment_type.to_string(),
        description: description.to_string(),
        base_salary,
        additional_payment,
        bonus_payment: 0,
        lump_sum: 0,
        shock_range,
        variant: ConditionVariant::Trust {
            shock_probability,
            bonus_multiplier,
            penalty_multiplier,
        },
    }
}

fn builtin_trust_conditions() -> Vec<ConditionConfig> {
    vec![
        trust_condition(
            "A",
            "Segmented (Neutral)",
            "Segmented payment without bonus framing.",
            6000,
            4000,
            0.5,
            ShockRange::new(1000, 5000),
            1.2,
            0.5,
        ),
        trust_condition(
            "B",
            "Lump Sum",
            "Single lump-sum payment.",
            10_000,
            0,
            0.5,
            ShockRange::new(1000, 5000),
            1.2,
            0.5,
        ),
        trust_condition(
            "C",
            "Segmented (Bonus Framed)",
            "Segmented payment with bonus framing.",
            6000,
            4000,
            0.5,
            ShockRange::new(1000, 5000),
            1.2,
            0.5,
        ),
        trust_condition(
            "Salary_Increase",
            "Salary Increase",
            "Special condition with a higher base salary.",
            9000,
            4000,
            0.3,
            ShockRange::new(3000, 5000),
            1.3,
            0.6,
        ),
    ]
}

fn budget_stage(
    condition_id: &str,
    payment_type: &str,
    description: &str,
    base_salary: i64,
    additional_payment: i64,
    bonus_payment: i64,
    lump_sum: i64,
    shock_range: ShockRange,
    frame_note: &str,
) -> ConditionConfig {
    ConditionConfig {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        condition_id: condition_id.to_string(),
        payment_type: payment_type.to_string(),
        description: description.to_string(),
        base_salary,
        additional_payment,
        bonus_payment,
        lump_sum,
        shock_range,
        variant: ConditionVariant::Allocation {
            categories: BUDGET_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect(),
            frame_note: Some(frame_note.to_string()),
        },
    }
}

fn builtin_stages() -> Vec<ConditionConfig> {
    vec![
        budget_stage(
            "baseline",
            "Base Salary",
            "Your monthly base salary is 6,000 NGN.",
            6000,
            0,
            0,
            0,
            ShockRange::new(0, 0),
            "Baseline allocation pattern",
        ),
        budget_stage(
            "condition_a",
            "Monthly Payment Schedule",
            "Your monthly income consists of a base salary of 6,000 NGN plus a temporal payment of 4,000 NGN.",
            6000,
            4000,
            0,
            0,
            ShockRange::new(1000, 2000),
            "Response to temporal payment structure",
        ),
        budget_stage(
            "condition_b",
            "Performance Bonus",
            "Congratulations! You have received a performance bonus of 10,000 NGN for your excellent work.",
            0,
            0,
            10_000,
            0,
            ShockRange::new(2000, 3000),
            "Bonus payment allocation strategy",
        ),
        budget_stage(
            "condition_c",
            "One-Time Payment",
            "You have received a one-time lump sum payment of 10,000 NGN.",
            0,
            0,
            0,
            10_000,
            ShockRange::new(2000, 3000),
            "Lump-sum payment behavior",
        ),
        budget_stage(
            "condition_d",
            "Salary Adjustment",
            "Your base salary has been permanently increased to 5,000 NGN monthly.",
            5000,
            0,
            0,
            0,
            ShockRange::new(2000, 3000),
            "Permanent income change adaptation",
        ),
    ]
}

fn portfolio_condition() -> ConditionConfig {
    ConditionConfig {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        condition_id: PORTFOLIO_CONDITION_ID.to_string(),
        payment_type: "Strategic Allocation".to_string(),
        description: "Allocate an investment pool of 10,000 across venture categories.".to_string(),
        base_salary: 0,
        additional_payment: 0,
        bonus_payment: 0,
        lump_sum: 10_000,
        shock_range: ShockRange::new(0, 0),
        variant: ConditionVariant::Allocation {
            categories: PORTFOLIO_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect(),
            frame_note: None,
        },
    }
}
