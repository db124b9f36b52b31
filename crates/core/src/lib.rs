pub mod assignment;
pub mod collab;
pub mod config;
pub mod domain;
pub mod faq;
pub mod flows;
pub mod history;
pub mod intent;
pub mod pricing;
pub mod session;
pub mod weight;

pub use assignment::{assign_outlet, serves_address, AssignmentError, OutletAssignment};
pub use collab::{BookingStore, CollabError, FaqOutcome, FaqResponder, OrderDirectory};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::customer::{ConversationId, Customer, CustomerId};
pub use domain::order::{
    CreatedOrder, DeliveryTier, OrderDraft, OrderId, OrderNumber, OrderSummary, PaymentMethod,
    PickupMode,
};
pub use domain::outlet::{AreaMapping, Outlet, OutletId};
pub use domain::service::{RateCard, ServiceKind, ServiceSelection};
pub use faq::StaticFaqResponder;
pub use flows::engine::BookingEngine;
pub use flows::states::BookingState;
pub use intent::{classify, Intent};
pub use pricing::{estimate, PriceEstimate};
pub use session::{Session, SessionSlot, SessionStore};
pub use weight::{parse_weight, ParsedWeight, TextileKind};
