//! Pure evaluation engine for the payment-framing experiment.
//!
//! Holds the condition catalog, the shock draws, trust round resolution,
//! allocation evaluation, and the stage sequencer. The crate never touches
//! the network or the clock, and every random draw goes through a
//! caller-supplied `Rng`, so any run can be replayed from a seed.

pub mod allocation;
pub mod catalog;
pub mod sequence;
pub mod shock;
pub mod strategy;
pub mod trust;

use std::fmt;

use contracts::{Allocation, ConditionConfig, EvaluationResult, TrustOutcome};
use rand::Rng;

use catalog::ConditionCatalog;
use strategy::StrategyPolicy;

pub use catalog::PORTFOLIO_CONDITION_ID;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    UnknownCondition {
        condition_id: String,
    },
    UnknownStage {
        stage_id: String,
    },
    ConditionMismatch {
        condition_id: String,
        expected: &'static str,
    },
    InvalidChoice {
        field: &'static str,
        token: String,
    },
    ShockOutOfRange {
        shock_amount: i64,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCondition { condition_id } => {
                write!(f, "unknown condition: {condition_id}")
            }
            Self::UnknownStage { stage_id } => write!(f, "unknown stage: {stage_id}"),
            Self::ConditionMismatch {
                condition_id,
                expected,
            } => write!(f, "condition {condition_id} is not a {expected} condition"),
            Self::InvalidChoice { field, token } => write!(f, "invalid {field}: {token:?}"),
            Self::ShockOutOfRange { shock_amount } => {
                write!(f, "shock amount out of range: {shock_amount}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Facade bundling the builtin catalog with the two strategy policies. The
/// HTTP API and the CLI both drive the experiment through this type.
#[derive(Debug, Clone)]
pub struct StudyEngine {
    catalog: ConditionCatalog,
    household_policy: StrategyPolicy,
    portfolio_policy: StrategyPolicy,
}

impl StudyEngine {
    pub fn new() -> Self {
        Self {
            catalog: ConditionCatalog::builtin(),
            household_policy: StrategyPolicy::household_budget(),
            portfolio_policy: StrategyPolicy::venture_portfolio(),
        }
    }

    pub fn catalog(&self) -> &ConditionCatalog {
        &self.catalog
    }

    /// Uniform draw over the trust conditions, used when a participant is
    /// enrolled without a pinned condition.
    pub fn assign_condition(&self, rng: &mut impl Rng) -> Option<&ConditionConfig> {
        let ids = self.catalog.trust_condition_ids();
        if ids.is_empty() {
            return None;
        }
        let index = rng.random_range(0..ids.len());
        self.catalog.condition(ids[index]).ok()
    }

    /// Resolve a condition id that must name a trust condition.
    pub fn trust_condition(&self, condition_id: &str) -> Result<&ConditionConfig, EngineError> {
        let config = self.catalog.condition(condition_id)?;
        if !config.is_trust() {
            return Err(EngineError::ConditionMismatch {
                condition_id: condition_id.to_string(),
                expected: "trust",
            });
        }
        Ok(config)
    }

    pub fn play_trust(
        &self,
        condition_id: &str,
        buyer_choice: &str,
        seller_choice: Option<&str>,
        fixed_shock: Option<i64>,
        rng: &mut impl Rng,
    ) -> Result<TrustOutcome, EngineError> {
        let condition = self.catalog.condition(condition_id)?;
        trust::resolve_trust(condition, buyer_choice, seller_choice, fixed_shock, rng)
    }

    pub fn evaluate_stage_allocation(
        &self,
        stage_id: &str,
        allocation: &Allocation,
        fixed_shock: Option<i64>,
        rng: &mut impl Rng,
    ) -> Result<EvaluationResult, EngineError> {
        let condition = self.catalog.stage(stage_id)?;
        allocation::evaluate_allocation(condition, &self.household_policy, allocation, fixed_shock, rng)
    }

    pub fn evaluate_portfolio(
        &self,
        allocation: &Allocation,
        fixed_shock: Option<i64>,
        rng: &mut impl Rng,
    ) -> Result<EvaluationResult, EngineError> {
        let condition = self.catalog.condition(PORTFOLIO_CONDITION_ID)?;
        allocation::evaluate_allocation(condition, &self.portfolio_policy, allocation, fixed_shock, rng)
    }

    pub fn next_stage(&self, current_stage: &str) -> Option<&str> {
        sequence::next_stage(current_stage, self.catalog.stage_order())
    }

    /// Zero-based stage index and the total stage count.
    pub fn stage_position(&self, current_stage: &str) -> (usize, usize) {
        (
            sequence::stage_index(current_stage, self.catalog.stage_order()),
            self.catalog.stage_order().len(),
        )
    }

    pub fn first_stage(&self) -> Option<&str> {
        self.catalog.first_stage()
    }
}

impl Default for StudyEngine {
    fn default() -> Self {
        Self::new()
    }
}
