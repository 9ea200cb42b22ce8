//! Trust round resolution: buyer and seller choices mapped onto payoffs over
//! a shocked payment base.

use contracts::{BuyerChoice, ConditionConfig, ConditionVariant, SellerChoice, TrustLabel, TrustOutcome};
use rand::Rng;

use crate::shock;
use crate::EngineError;

/// Resolve one trust round.
///
/// Both choice tokens are parsed before any payoff math, so a malformed
/// token can never produce a payoff. The shocked base is drawn fresh on every
/// call; callers that need a stable base across the buyer/seller round trip
/// pass `fixed_shock` to pin it.
pub fn resolve_trust(
    condition: &ConditionConfig,
    buyer_choice: &str,
    seller_choice: Option<&str>,
    fixed_shock: Option<i64>,
    rng: &mut impl Rng,
) -> Result<TrustOutcome, EngineError> {
    let (shock_probability, bonus_multiplier, penalty_multiplier) = match &condition.variant {
        ConditionVariant::Trust {
            shock_probability,
            bonus_multiplier,
            penalty_multiplier,
        } => (*shock_probability, *bonus_multiplier, *penalty_multiplier),
        ConditionVariant::Allocation { .. } => {
            return Err(EngineError::ConditionMismatch {
                condition_id: condition.condition_id.clone(),
                expected: "trust",
            });
        }
    };

    let buyer = BuyerChoice::parse(buyer_choice).ok_or_else(|| EngineError::InvalidChoice {
        field: "buyer_choice",
        token: buyer_choice.to_string(),
    })?;
    let seller = seller_choice
        .map(|token| {
            SellerChoice::parse(token).ok_or_else(|| EngineError::InvalidChoice {
                field: "seller_choice",
                token: token.to_string(),
            })
        })
        .transpose()?;

    let shocked_base = match fixed_shock {
        Some(shock_amount) => condition
            .total_available()
            .checked_sub(shock_amount)
            .ok_or(EngineError::ShockOutOfRange { shock_amount })?,
        None => shock::apply_shock(
            condition.total_available(),
            shock_probability,
            condition.shock_range,
            rng,
        ),
    };

    Ok(match (buyer, seller) {
        (BuyerChoice::NotTrust, _) => {
            TrustOutcome::resolved(TrustLabel::OptOut, shocked_base as f64)
        }
        (BuyerChoice::Trust, None) => TrustOutcome::awaiting_seller(),
        (BuyerChoice::Trust, Some(SellerChoice::Honor)) => TrustOutcome::resolved(
            TrustLabel::TrustworthyTransaction,
            shocked_base as f64 * bonus_multiplier,
        ),
        (BuyerChoice::Trust, Some(SellerChoice::Abuse)) => TrustOutcome::resolved(
            TrustLabel::TrustBetrayed,
            shocked_base as f64 * penalty_multiplier,
        ),
    })
}
