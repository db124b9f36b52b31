use serde::{Deserialize, Serialize};

use crate::domain::order::{OrderId, OrderNumber};
use crate::weight::TextileKind;

/// One step of the booking conversation. Every inbound message is interpreted
/// against exactly one of these; the terminal step is `AwaitingRating`, which
/// survives the order being persisted so one star rating can be collected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingState {
    CollectingName,
    CollectingAddress,
    CollectingPhone,
    CollectingDeliveryTier,
    CollectingService,
    CollectingShoeQuantity,
    CollectingTextileType,
    CollectingTextileQuantity { kind: TextileKind },
    CollectingIronQuantity,
    CollectingWeight,
    CollectingPickupMode,
    CollectingHomeAddress,
    CollectingPickupWindow,
    CollectingDeliveryWindow,
    CollectingInstructions,
    CollectingPaymentMethod,
    AwaitingRating { order_id: OrderId, order_number: OrderNumber },
}

impl BookingState {
    /// Stable identifier used in logs.
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::CollectingName => "collecting_name",
            Self::CollectingAddress => "collecting_address",
            Self::CollectingPhone => "collecting_phone",
            Self::CollectingDeliveryTier => "collecting_delivery_tier",
            Self::CollectingService => "collecting_service",
            Self::CollectingShoeQuantity => "collecting_shoe_quantity",
            Self::CollectingTextileType => "collecting_textile_type",
            Self::CollectingTextileQuantity { .. } => "collecting_textile_quantity",
            Self::CollectingIronQuantity => "collecting_iron_quantity",
            Self::CollectingWeight => "collecting_weight",
            Self::CollectingPickupMode => "collecting_pickup_mode",
            Self::CollectingHomeAddress => "collecting_home_address",
            Self::CollectingPickupWindow => "collecting_pickup_window",
            Self::CollectingDeliveryWindow => "collecting_delivery_window",
            Self::CollectingInstructions => "collecting_instructions",
            Self::CollectingPaymentMethod => "collecting_payment_method",
            Self::AwaitingRating { .. } => "awaiting_rating",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AwaitingRating { .. })
    }
}
