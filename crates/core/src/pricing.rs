//! Deterministic pricing over externally supplied rate data. Pure functions so
//! they can be unit-tested independently of the conversation flow and of
//! persistence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::DeliveryTier;
use crate::domain::service::{RateCard, ServiceKind, ServiceSelection};
use crate::weight::{MAX_WEIGHT_KG, MIN_WEIGHT_KG};

/// Surcharge applied on top of the standard total for express delivery.
const EXPRESS_SURCHARGE_PCT: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub weight_kg: Decimal,
    pub total: Decimal,
    pub express_fee: Decimal,
}

pub fn clamp_weight(weight_kg: Decimal) -> Decimal {
    weight_kg.max(MIN_WEIGHT_KG).min(MAX_WEIGHT_KG).round_dp(2)
}

/// total = clamped weight × Σ(rate/kg of each selected service), plus a 30%
/// fee when express. Unknown selections fall back to the plain wash rate;
/// `None` means pricing is unavailable (empty catalog), which the caller must
/// treat as degraded service rather than an error.
pub fn estimate(
    selection: ServiceSelection,
    weight_kg: Decimal,
    tier: DeliveryTier,
    rates: &RateCard,
) -> Option<PriceEstimate> {
    let mut per_kg: Vec<Decimal> =
        selection.codes().iter().filter_map(|kind| rates.rate(*kind)).collect();
    if per_kg.is_empty() {
        per_kg = rates.rate(ServiceKind::Wash).into_iter().collect();
    }
    if per_kg.is_empty() {
        return None;
    }

    let weight_kg = clamp_weight(weight_kg);
    let rate_sum: Decimal = per_kg.iter().copied().sum();
    let mut total = (weight_kg * rate_sum).round_dp(2);

    let mut express_fee = Decimal::ZERO;
    if tier == DeliveryTier::Express {
        express_fee = (total * EXPRESS_SURCHARGE_PCT).round_dp(2);
        total = (total + express_fee).round_dp(2);
    }

    Some(PriceEstimate { weight_kg, total, express_fee })
}
