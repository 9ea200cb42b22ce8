//! Versioned data contracts shared by the engine, the HTTP API, and the CLI.
//!
//! Everything that crosses a crate boundary is defined here: condition
//! configuration, participant choices, trust outcomes, allocation evaluation
//! results, and the API error envelope. The wire shape of these types is the
//! compatibility surface, so field names and serde renames are deliberate.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Category name to whole-currency amount, as submitted by a participant.
pub type Allocation = BTreeMap<String, i64>;

/// Inclusive bounds for a negative income shock draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShockRange {
    pub min: i64,
    pub max: i64,
}

impl ShockRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// The per-condition parameters that differ between the two experiment arms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionVariant {
    Trust {
        shock_probability: f64,
        bonus_multiplier: f64,
        penalty_multiplier: f64,
    },
    Allocation {
        categories: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frame_note: Option<String>,
    },
}

/// One experimental condition: the framing text, the payment components, and
/// the variant-specific parameters. Payment fields default to zero so a
/// condition only states the components its framing mentions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionConfig {
    pub schema_version: String,
    pub condition_id: String,
    pub payment_type: String,
    pub description: String,
    #[serde(default)]
    pub base_salary: i64,
    #[serde(default)]
    pub additional_payment: i64,
    #[serde(default)]
    pub bonus_payment: i64,
    #[serde(default)]
    pub lump_sum: i64,
    pub shock_range: ShockRange,
    pub variant: ConditionVariant,
}

impl ConditionConfig {
    /// Sum of every payment component, before any shock.
    pub fn total_available(&self) -> i64 {
        self.base_salary + self.additional_payment + self.bonus_payment + self.lump_sum
    }

    pub fn allocation_categories(&self) -> Option<&[String]> {
        match &self.variant {
            ConditionVariant::Allocation { categories, .. } => Some(categories),
            ConditionVariant::Trust { .. } => None,
        }
    }

    pub fn is_trust(&self) -> bool {
        matches!(self.variant, ConditionVariant::Trust { .. })
    }
}

impl fmt::Display for ConditionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "condition_id={} payment_type={:?} total_available={}",
            self.condition_id,
            self.payment_type,
            self.total_available()
        )
    }
}

/// First move in a trust round. Tokens match exactly; anything else is
/// rejected before payoff math runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BuyerChoice {
    #[serde(rename = "Trust")]
    Trust,
    #[serde(rename = "Not trust")]
    NotTrust,
}

impl BuyerChoice {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Trust" => Some(Self::Trust),
            "Not trust" => Some(Self::NotTrust),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trust => "Trust",
            Self::NotTrust => "Not trust",
        }
    }
}

/// Counter-move in a trust round, only meaningful after the buyer trusted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SellerChoice {
    #[serde(rename = "Honor")]
    Honor,
    #[serde(rename = "Abuse")]
    Abuse,
}

impl SellerChoice {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Honor" => Some(Self::Honor),
            "Abuse" => Some(Self::Abuse),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Honor => "Honor",
            Self::Abuse => "Abuse",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TrustLabel {
    #[serde(rename = "Opt-out")]
    OptOut,
    #[serde(rename = "Trustworthy Transaction")]
    TrustworthyTransaction,
    #[serde(rename = "Trust Betrayed")]
    TrustBetrayed,
}

impl TrustLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OptOut => "Opt-out",
            Self::TrustworthyTransaction => "Trustworthy Transaction",
            Self::TrustBetrayed => "Trust Betrayed",
        }
    }

    /// Participant-facing narration attached to every resolved round.
    pub fn message(self) -> &'static str {
        match self {
            Self::OptOut => "You chose not to engage, preserving your initial resources.",
            Self::TrustworthyTransaction => "Trust leads to mutual benefit!",
            Self::TrustBetrayed => "Your trust was exploited, resulting in significant loss.",
        }
    }
}

/// Outcome of a trust round. A round still waiting on the seller serializes
/// as a stage marker instead of a payoff, so the two shapes share one type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TrustOutcome {
    AwaitingSeller {
        stage: String,
        message: String,
    },
    Resolved {
        label: TrustLabel,
        payoff: f64,
        message: String,
    },
}

impl TrustOutcome {
    pub fn awaiting_seller() -> Self {
        Self::AwaitingSeller {
            stage: "seller".to_string(),
            message: "Waiting for seller's decision...".to_string(),
        }
    }

    pub fn resolved(label: TrustLabel, payoff: f64) -> Self {
        Self::Resolved {
            label,
            payoff,
            message: label.message().to_string(),
        }
    }

    pub fn label(&self) -> Option<TrustLabel> {
        match self {
            Self::Resolved { label, .. } => Some(*label),
            Self::AwaitingSeller { .. } => None,
        }
    }

    pub fn payoff(&self) -> Option<f64> {
        match self {
            Self::Resolved { payoff, .. } => Some(*payoff),
            Self::AwaitingSeller { .. } => None,
        }
    }
}

/// Behavioral strategy inferred from percentage shares.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Conservative,
    Aggressive,
    Innovative,
    Sustainable,
    Balanced,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Aggressive => "Aggressive",
            Self::Innovative => "Innovative",
            Self::Sustainable => "Sustainable",
            Self::Balanced => "Balanced",
        }
    }
}

/// Strategy classification plus the policy's projected outcomes for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyAssessment {
    pub strategy: StrategyKind,
    pub monetary_outcome: i64,
    pub impact_score: i64,
    pub insight: String,
}

/// Full evaluation of one allocation round. `valid: false` carries the
/// rejection message and the amounts that triggered it; the derived fields
/// (`unallocated`, `percentages`, `analysis`, `strategy`) only appear on
/// accepted rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub schema_version: String,
    pub valid: bool,
    pub stage: String,
    pub frame: String,
    pub total_available: i64,
    pub net_amount: i64,
    pub shock_amount: i64,
    pub total_allocated: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unallocated: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub percentages: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analysis: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EvaluationResult {
    pub fn accepted(
        condition: &ConditionConfig,
        shock_amount: i64,
        net_amount: i64,
        total_allocated: i64,
        percentages: BTreeMap<String, f64>,
        analysis: Vec<String>,
        strategy: StrategyAssessment,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            valid: true,
            stage: condition.condition_id.clone(),
            frame: condition.payment_type.clone(),
            total_available: condition.total_available(),
            net_amount,
            shock_amount,
            total_allocated,
            unallocated: Some(net_amount - total_allocated),
            percentages,
            analysis,
            strategy: Some(strategy),
            message: None,
        }
    }

    pub fn rejected(
        condition: &ConditionConfig,
        shock_amount: i64,
        net_amount: i64,
        total_allocated: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            valid: false,
            stage: condition.condition_id.clone(),
            frame: condition.payment_type.clone(),
            total_available: condition.total_available(),
            net_amount,
            shock_amount,
            total_allocated,
            unallocated: None,
            percentages: BTreeMap::new(),
            analysis: Vec::new(),
            strategy: None,
            message: Some(message.into()),
        }
    }
}

/// Public view of one participant session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub schema_version: String,
    pub session_id: String,
    pub condition_id: String,
    pub current_stage: String,
    pub experiment_complete: bool,
}

/// Position of a session inside the staged allocation sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageProgress {
    pub schema_version: String,
    pub session_id: String,
    pub current_stage: String,
    pub progress: f64,
    pub total_stages: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SessionNotFound,
    ConditionNotFound,
    StageNotFound,
    InvalidChoice,
    ConditionMismatch,
    InvalidRequest,
    InternalError,
}

/// Error envelope returned by every failing API route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation_condition() -> ConditionConfig {
        ConditionConfig {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            condition_id: "condition_b".to_string(),
            payment_type: "Performance Bonus".to_string(),
            description: "bonus stage".to_string(),
            base_salary: 0,
            additional_payment: 0,
            bonus_payment: 10_000,
            lump_sum: 0,
            shock_range: ShockRange::new(2000, 3000),
            variant: ConditionVariant::Allocation {
                categories: vec!["savings".to_string(), "essential".to_string()],
                frame_note: Some("Bonus payment allocation strategy".to_string()),
            },
        }
    }

    #[test]
    fn total_available_treats_missing_payment_fields_as_zero() {
        let raw = r#"{
            "schema_version": "1.0",
            "condition_id": "condition_b",
            "payment_type": "Performance Bonus",
            "description": "bonus stage",
            "bonus_payment": 10000,
            "shock_range": {"min": 2000, "max": 3000},
            "variant": {"type": "allocation", "categories": ["savings"]}
        }"#;
        let config: ConditionConfig = serde_json::from_str(raw).expect("config should parse");
        assert_eq!(config.base_salary, 0);
        assert_eq!(config.lump_sum, 0);
        assert_eq!(config.total_available(), 10_000);
    }

    #[test]
    fn condition_variant_round_trips_with_type_tag() {
        let config = ConditionConfig {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            condition_id: "A".to_string(),
            payment_type: "Segmented (Neutral)".to_string(),
            description: "segmented pay".to_string(),
            base_salary: 6000,
            additional_payment: 4000,
            bonus_payment: 0,
            lump_sum: 0,
            shock_range: ShockRange::new(1000, 5000),
            variant: ConditionVariant::Trust {
                shock_probability: 0.5,
                bonus_multiplier: 1.2,
                penalty_multiplier: 0.5,
            },
        };

        let encoded = serde_json::to_string(&config).expect("config should encode");
        assert!(encoded.contains(r#""type":"trust""#), "encoded={encoded}");

        let decoded: ConditionConfig = serde_json::from_str(&encoded).expect("config should decode");
        assert_eq!(decoded, config);
    }

    #[test]
    fn trust_outcome_serializes_flat_wire_keys() {
        let resolved = TrustOutcome::resolved(TrustLabel::TrustworthyTransaction, 10_800.0);
        let value = serde_json::to_value(&resolved).expect("outcome should encode");
        assert_eq!(value["label"], "Trustworthy Transaction");
        assert_eq!(value["payoff"], 10_800.0);
        assert_eq!(value["message"], "Trust leads to mutual benefit!");

        let waiting = TrustOutcome::awaiting_seller();
        let value = serde_json::to_value(&waiting).expect("outcome should encode");
        assert_eq!(value["stage"], "seller");
        assert_eq!(value["message"], "Waiting for seller's decision...");
        assert!(value.get("payoff").is_none());
    }

    #[test]
    fn choice_tokens_parse_exactly_or_not_at_all() {
        assert_eq!(BuyerChoice::parse("Trust"), Some(BuyerChoice::Trust));
        assert_eq!(BuyerChoice::parse("Not trust"), Some(BuyerChoice::NotTrust));
        assert_eq!(BuyerChoice::parse("trust"), None);
        assert_eq!(BuyerChoice::parse("Not Trust"), None);
        assert_eq!(SellerChoice::parse("Honor"), Some(SellerChoice::Honor));
        assert_eq!(SellerChoice::parse("Betray"), None);
    }

    #[test]
    fn rejected_results_omit_the_derived_fields() {
        let condition = allocation_condition();
        let rejected = EvaluationResult::rejected(
            &condition,
            2000,
            8000,
            9500,
            "Total allocation (9500) exceeds available amount (8000)",
        );

        let value = serde_json::to_value(&rejected).expect("result should encode");
        assert_eq!(value["valid"], false);
        assert_eq!(value["net_amount"], 8000);
        assert!(value.get("percentages").is_none());
        assert!(value.get("unallocated").is_none());
        assert!(value.get("strategy").is_none());
        assert_eq!(
            value["message"],
            "Total allocation (9500) exceeds available amount (8000)"
        );
    }

    #[test]
    fn error_codes_encode_screaming_snake_case() {
        let error = ApiError::new(ErrorCode::SessionNotFound, "no such session", None);
        let value = serde_json::to_value(&error).expect("error should encode");
        assert_eq!(value["error_code"], "SESSION_NOT_FOUND");
        assert!(value.get("details").is_none());
    }
}
