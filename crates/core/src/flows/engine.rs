//! The conversation engine: one entry point, [`BookingEngine::handle`], which
//! takes an inbound message and returns the reply text. All booking state
//! lives in the session store; persistence only happens at the terminal
//! payment step.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::assignment::{self, AssignmentError};
use crate::collab::{BookingStore, CollabError, FaqOutcome, FaqResponder, OrderDirectory};
use crate::domain::customer::{normalize_phone, ConversationId};
use crate::domain::order::{
    DeliveryTier, OrderDraft, OrderNumber, PaymentMethod, PickupMode,
};
use crate::domain::service::{RateCard, ServiceSelection};
use crate::flows::prompts;
use crate::flows::states::BookingState;
use crate::intent::{self, Intent};
use crate::session::{Session, SessionSlot, SessionStore};
use crate::weight::{
    parse_weight, weight_from_iron_pieces, weight_from_shoe_pairs, weight_from_textiles,
    TextileKind,
};

/// How many orders an order-history question lists.
const RECENT_ORDER_LIMIT: usize = 3;

pub struct BookingEngine<S, D, F> {
    store: Arc<S>,
    directory: Arc<D>,
    faq: Arc<F>,
    sessions: SessionStore,
}

impl<S, D, F> BookingEngine<S, D, F>
where
    S: BookingStore,
    D: OrderDirectory,
    F: FaqResponder,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, faq: Arc<F>) -> Self {
        Self { store, directory, faq, sessions: SessionStore::new() }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one inbound message and returns the reply. Messages from the
    /// same conversation are serialized on the per-conversation slot lock;
    /// different conversations proceed concurrently.
    pub async fn handle(&self, chat_id: &ConversationId, text: &str) -> String {
        let slot = self.sessions.slot(chat_id);
        let mut guard = slot.lock().await;
        self.handle_locked(chat_id, text, &mut guard).await
    }

    async fn handle_locked(
        &self,
        chat_id: &ConversationId,
        text: &str,
        slot: &mut SessionSlot,
    ) -> String {
        let trimmed = text.trim();
        let lower = trimmed.to_ascii_lowercase();

        if intent::is_restart_command(&lower) {
            let had_session = slot.session.take().is_some();
            tracing::info!(
                event_name = "conversation.restarted",
                chat = %chat_id,
                had_session,
            );
            if had_session && lower == "cancel" {
                return prompts::booking_cancelled();
            }
            return prompts::welcome(self.known_name(chat_id).await.as_deref());
        }

        if let Some(session) = slot.session.take() {
            let step = session.state.step_name();
            let (next, reply) = if session.state.is_terminal() {
                self.handle_rating(session, trimmed).await
            } else {
                self.advance(session, trimmed).await
            };
            tracing::debug!(
                event_name = "booking.step_handled",
                chat = %chat_id,
                from_step = step,
                to_step = next.as_ref().map(|session| session.state.step_name()),
            );
            slot.session = next;
            return reply;
        }

        self.route(chat_id, trimmed, slot).await
    }

    async fn route(
        &self,
        chat_id: &ConversationId,
        text: &str,
        slot: &mut SessionSlot,
    ) -> String {
        match intent::classify(text) {
            Intent::Greeting => prompts::welcome(self.known_name(chat_id).await.as_deref()),
            Intent::RecentQuestions => {
                if slot.recent.is_empty() {
                    prompts::no_recent_questions()
                } else {
                    let newest: Vec<_> = slot.recent.newest_first().collect();
                    prompts::recent_questions(&newest)
                }
            }
            Intent::OrderQuery => {
                let reply = match self.directory.list_recent_for(chat_id, RECENT_ORDER_LIMIT).await
                {
                    Ok(summaries) if summaries.is_empty() => prompts::no_orders_yet(),
                    Ok(summaries) => prompts::recent_orders(&summaries),
                    Err(error) => self.degraded_reply(chat_id, "order_query", &error),
                };
                slot.recent.record(text, &reply);
                reply
            }
            Intent::StartBooking => {
                tracing::info!(event_name = "booking.started", chat = %chat_id);
                slot.session = Some(Session::begin(chat_id.clone()));
                prompts::ask_name()
            }
            Intent::TrackByNumber(number) => match self.directory.find_by_number(&number).await {
                Ok(Some(summary)) => prompts::order_status(&summary),
                Ok(None) => prompts::order_not_found(&number),
                Err(error) => self.degraded_reply(chat_id, "tracking", &error),
            },
            Intent::TrackPrompt => prompts::ask_for_order_number(),
            Intent::Question => {
                let reply = match self.faq.answer(text, &slot.recent).await {
                    Ok(FaqOutcome::Answered(answer)) => answer,
                    Ok(FaqOutcome::NoContext) => prompts::question_fallback(),
                    Err(error) => self.degraded_reply(chat_id, "faq", &error),
                };
                slot.recent.record(text, &reply);
                reply
            }
        }
    }

    async fn known_name(&self, chat_id: &ConversationId) -> Option<String> {
        match self.store.find_customer_by_chat(chat_id).await {
            Ok(customer) => customer.map(|customer| customer.full_name),
            Err(error) => {
                tracing::warn!(
                    event_name = "customer.lookup_failed",
                    chat = %chat_id,
                    error = %error,
                );
                None
            }
        }
    }

    fn degraded_reply(&self, chat_id: &ConversationId, context: &str, error: &CollabError) -> String {
        tracing::warn!(
            event_name = "collaborator.degraded",
            chat = %chat_id,
            context,
            error = %error,
        );
        match error {
            CollabError::Setup { .. } => prompts::setup_problem(),
            CollabError::Unavailable => prompts::temporarily_unavailable(),
            CollabError::Integration(_) => prompts::integration_problem(),
        }
    }

    /// One booking step: consumes the session, returns the replacement (or
    /// `None` when the flow ended) and the reply.
    async fn advance(&self, mut session: Session, text: &str) -> (Option<Session>, String) {
        match session.state.clone() {
            BookingState::CollectingName => {
                if text.is_empty() || text.eq_ignore_ascii_case("skip") {
                    return (Some(session), prompts::ask_name());
                }
                session.fields.full_name = Some(text.to_string());
                session.state = BookingState::CollectingAddress;
                (Some(session), prompts::ask_address())
            }
            BookingState::CollectingAddress => {
                let areas = match self.store.list_area_map().await {
                    Ok(areas) => areas,
                    Err(error) => {
                        tracing::warn!(
                            event_name = "reference.area_map_failed",
                            error = %error,
                        );
                        Vec::new()
                    }
                };
                let area_names: Vec<String> =
                    areas.iter().map(|mapping| mapping.area_name.clone()).collect();
                if !assignment::serves_address(text, &area_names) {
                    let known = if area_names.is_empty() {
                        assignment::FALLBACK_AREAS.iter().map(|area| area.to_string()).collect()
                    } else {
                        area_names
                    };
                    return (Some(session), prompts::outside_service_area(&known));
                }
                let nearby = match self.store.list_outlets().await {
                    Ok(outlets) => assignment::nearby_outlet(text, &areas, &outlets)
                        .map(|(_, outlet)| outlet.name.clone()),
                    Err(_) => None,
                };
                session.fields.address = Some(text.to_string());
                session.state = BookingState::CollectingPhone;
                (Some(session), prompts::address_accepted(nearby.as_deref()))
            }
            BookingState::CollectingPhone => {
                let digits: String = text.chars().filter(char::is_ascii_digit).collect();
                if digits.len() < 10 {
                    return (Some(session), prompts::invalid_phone());
                }
                let phone = normalize_phone(text, &session.chat_id);
                let returning = match self.store.find_customer_by_phone(&phone).await {
                    Ok(customer) => customer.map(|customer| customer.full_name),
                    Err(_) => None,
                };
                session.fields.phone_number = Some(phone);
                session.state = BookingState::CollectingDeliveryTier;
                (Some(session), prompts::ask_delivery_tier(returning.as_deref()))
            }
            BookingState::CollectingDeliveryTier => {
                let tier = match text {
                    "1" => DeliveryTier::Standard,
                    "2" => DeliveryTier::Express,
                    _ => return (Some(session), prompts::invalid_delivery_tier()),
                };
                session.fields.tier = Some(tier);
                session.state = BookingState::CollectingService;
                (Some(session), prompts::ask_service())
            }
            BookingState::CollectingService => {
                let Some(selection) = ServiceSelection::from_menu_choice(text) else {
                    return (Some(session), prompts::invalid_service());
                };
                session.fields.selection = Some(selection);
                let (state, reply) = match selection {
                    ServiceSelection::ShoeClean => {
                        (BookingState::CollectingShoeQuantity, prompts::ask_shoe_quantity())
                    }
                    ServiceSelection::DryClean => {
                        (BookingState::CollectingTextileType, prompts::ask_textile_type())
                    }
                    ServiceSelection::IronOnly => {
                        (BookingState::CollectingIronQuantity, prompts::ask_iron_quantity())
                    }
                    ServiceSelection::WashOnly | ServiceSelection::WashIron => {
                        (BookingState::CollectingWeight, prompts::ask_weight())
                    }
                };
                session.state = state;
                (Some(session), reply)
            }
            BookingState::CollectingShoeQuantity => {
                let Some(weight) = weight_from_shoe_pairs(text) else {
                    return (Some(session), prompts::invalid_quantity());
                };
                session.fields.weight = Some(weight);
                session.state = BookingState::CollectingPickupMode;
                let estimated = self.estimated_total(&session).await;
                (Some(session), prompts::ask_pickup_mode(estimated))
            }
            BookingState::CollectingTextileType => {
                let Some(kind) = TextileKind::from_menu_choice(text) else {
                    return (Some(session), prompts::invalid_textile_type());
                };
                session.state = BookingState::CollectingTextileQuantity { kind };
                (Some(session), prompts::ask_textile_quantity(kind))
            }
            BookingState::CollectingTextileQuantity { kind } => {
                let Some(weight) = weight_from_textiles(kind, text) else {
                    return (Some(session), prompts::invalid_quantity());
                };
                session.fields.weight = Some(weight);
                session.state = BookingState::CollectingPickupMode;
                let estimated = self.estimated_total(&session).await;
                (Some(session), prompts::ask_pickup_mode(estimated))
            }
            BookingState::CollectingIronQuantity => {
                let Some(weight) = weight_from_iron_pieces(text) else {
                    return (Some(session), prompts::invalid_quantity());
                };
                session.fields.weight = Some(weight);
                session.state = BookingState::CollectingPickupMode;
                let estimated = self.estimated_total(&session).await;
                (Some(session), prompts::ask_pickup_mode(estimated))
            }
            BookingState::CollectingWeight => {
                let Some(weight) = parse_weight(text) else {
                    return (Some(session), prompts::invalid_weight());
                };
                session.fields.weight = Some(weight);
                session.state = BookingState::CollectingPickupMode;
                let estimated = self.estimated_total(&session).await;
                (Some(session), prompts::ask_pickup_mode(estimated))
            }
            BookingState::CollectingPickupMode => {
                let mode = match text {
                    "1" => PickupMode::SelfDrop,
                    "2" => PickupMode::HomePickup,
                    _ => return (Some(session), prompts::invalid_pickup_mode()),
                };
                session.fields.pickup_mode = Some(mode);
                let (state, reply) = match mode {
                    PickupMode::HomePickup => {
                        (BookingState::CollectingHomeAddress, prompts::ask_home_address())
                    }
                    PickupMode::SelfDrop => {
                        (BookingState::CollectingPickupWindow, prompts::ask_pickup_window())
                    }
                };
                session.state = state;
                (Some(session), reply)
            }
            BookingState::CollectingHomeAddress => {
                if text.is_empty() || text.eq_ignore_ascii_case("skip") {
                    return (Some(session), prompts::ask_home_address());
                }
                session.fields.pickup_address = Some(text.to_string());
                session.state = BookingState::CollectingPickupWindow;
                (Some(session), prompts::ask_pickup_window())
            }
            BookingState::CollectingPickupWindow => {
                if text.is_empty() {
                    return (Some(session), prompts::ask_pickup_window());
                }
                session.fields.pickup_window = Some(text.to_string());
                session.state = BookingState::CollectingDeliveryWindow;
                (Some(session), prompts::ask_delivery_window())
            }
            BookingState::CollectingDeliveryWindow => {
                if text.is_empty() {
                    return (Some(session), prompts::ask_delivery_window());
                }
                session.fields.delivery_window = Some(text.to_string());
                session.state = BookingState::CollectingInstructions;
                (Some(session), prompts::ask_instructions())
            }
            BookingState::CollectingInstructions => {
                let lower = text.to_ascii_lowercase();
                session.fields.instructions = match lower.as_str() {
                    "" | "no" | "none" | "skip" | "-" | "nope" => None,
                    _ => Some(text.to_string()),
                };
                session.state = BookingState::CollectingPaymentMethod;
                let estimated = self.estimated_total(&session).await;
                (Some(session), prompts::ask_payment(estimated))
            }
            BookingState::CollectingPaymentMethod => {
                let Some(method) = PaymentMethod::from_menu_choice(text) else {
                    return (Some(session), prompts::invalid_payment());
                };
                session.fields.payment_method = Some(method);
                self.complete_booking(session).await
            }
            BookingState::AwaitingRating { .. } => self.handle_rating(session, text).await,
        }
    }

    /// Estimate surfaced right after the weight is known and again with the
    /// payment menu. Best effort: a read failure just drops the preview.
    async fn estimated_total(&self, session: &Session) -> Option<Decimal> {
        let (selection, weight, tier) = match (
            session.fields.selection,
            session.fields.weight.as_ref(),
            session.fields.tier,
        ) {
            (Some(selection), Some(weight), Some(tier)) => (selection, weight, tier),
            _ => return None,
        };
        let rates = self.rate_card().await.ok()?;
        crate::pricing::estimate(selection, weight.kilograms, tier, &rates)
            .map(|estimate| estimate.total)
    }

    async fn rate_card(&self) -> Result<RateCard, CollabError> {
        let rows = self.store.list_service_rates().await?;
        Ok(RateCard::new(
            rows.into_iter().map(|(kind, rate)| (kind.code().to_string(), rate)),
        ))
    }

    /// Terminal transition: prices the order, assigns an outlet, persists, and
    /// moves to the rating step. Any collaborator failure clears the session
    /// and surfaces the matching degradation reply; there is no retry state.
    async fn complete_booking(&self, mut session: Session) -> (Option<Session>, String) {
        let chat_id = session.chat_id.clone();

        let fields = session.fields.clone();
        let (Some(full_name), Some(address), Some(phone), Some(tier), Some(selection), Some(weight), Some(pickup_mode), Some(pickup_window), Some(delivery_window), Some(payment_method)) = (
            fields.full_name,
            fields.address,
            fields.phone_number,
            fields.tier,
            fields.selection,
            fields.weight,
            fields.pickup_mode,
            fields.pickup_window,
            fields.delivery_window,
            fields.payment_method,
        ) else {
            tracing::error!(
                event_name = "booking.fields_incomplete",
                chat = %chat_id,
                step = session.state.step_name(),
            );
            return (None, prompts::integration_problem());
        };

        let rates = match self.rate_card().await {
            Ok(rates) => rates,
            Err(error) => {
                let reply = self.degraded_reply(&chat_id, "rates", &error);
                return (None, reply);
            }
        };
        let Some(estimate) = crate::pricing::estimate(selection, weight.kilograms, tier, &rates)
        else {
            tracing::error!(event_name = "pricing.catalog_empty", chat = %chat_id);
            return (None, self.degraded_reply(&chat_id, "pricing", &CollabError::Unavailable));
        };

        let (areas, outlets) = match (
            self.store.list_area_map().await,
            self.store.list_outlets().await,
        ) {
            (Ok(areas), Ok(outlets)) => (areas, outlets),
            (Err(error), _) | (_, Err(error)) => {
                let reply = self.degraded_reply(&chat_id, "outlets", &error);
                return (None, reply);
            }
        };
        let assigned = match assignment::assign_outlet(&address, &areas, &outlets) {
            Ok(assigned) => assigned,
            Err(AssignmentError::NoActiveOutlets) => {
                tracing::warn!(event_name = "assignment.no_active_outlets", chat = %chat_id);
                return (None, prompts::no_outlets_available());
            }
        };

        let draft = OrderDraft {
            order_number: OrderNumber::generate(),
            chat_id: chat_id.clone(),
            full_name,
            phone_number: phone,
            address: address.clone(),
            outlet_id: assigned.outlet.id.clone(),
            tier,
            selection,
            weight_kg: estimate.weight_kg,
            weight_note: weight.note.clone(),
            total_price: estimate.total,
            express_fee: estimate.express_fee,
            payment_method,
            pickup_mode,
            pickup_address: fields.pickup_address.clone(),
            delivery_address: fields.pickup_address.or(Some(address)),
            pickup_window,
            delivery_window,
            instructions: fields.instructions,
            delivery_time: Utc::now() + Duration::hours(tier.expected_hours()),
        };

        let created = match self.store.create_order(&draft).await {
            Ok(created) => created,
            Err(error) => {
                let reply = self.degraded_reply(&chat_id, "create_order", &error);
                return (None, reply);
            }
        };

        tracing::info!(
            event_name = "booking.order_created",
            chat = %chat_id,
            order_number = %created.order_number,
            total = %draft.total_price,
            outlet = %assigned.outlet.name,
            existing_customer = created.existing_customer,
        );

        let reply = prompts::order_confirmed(
            &created.order_number,
            draft.total_price,
            draft.express_fee,
            tier,
            draft.weight_kg,
            draft.weight_note.as_deref(),
            &assigned.outlet.name,
            assigned.note.as_deref(),
        );
        session.state = BookingState::AwaitingRating {
            order_id: created.order_id,
            order_number: created.order_number,
        };
        (Some(session), reply)
    }

    /// Rating step: a star count records feedback; anything else, "skip"
    /// included, ends the conversation politely. This step never re-prompts,
    /// so the session is gone whatever the customer sends.
    async fn handle_rating(&self, session: Session, text: &str) -> (Option<Session>, String) {
        let BookingState::AwaitingRating { order_id, order_number } = &session.state else {
            return (None, prompts::rating_skipped());
        };

        let stars = match text.parse::<u8>() {
            Ok(stars) if (1..=5).contains(&stars) => stars,
            _ => return (None, prompts::rating_skipped()),
        };

        if let Err(error) = self.store.record_feedback(order_id, stars).await {
            tracing::warn!(
                event_name = "feedback.record_failed",
                order_number = %order_number,
                error = %error,
            );
        }
        (None, prompts::rating_thanks(stars))
    }
}
