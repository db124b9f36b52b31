//! Canned question answering over a rate-card snapshot. No retrieval backend:
//! pricing, turnaround, and coverage questions are answered from static text
//! plus the live rates, and everything else reports no context so the caller
//! can send the generic fallback.

use async_trait::async_trait;

use crate::assignment::SERVICED_REGION;
use crate::collab::{CollabError, FaqOutcome, FaqResponder};
use crate::domain::service::{RateCard, ServiceKind};
use crate::history::RecentExchanges;

#[derive(Clone, Debug, Default)]
pub struct StaticFaqResponder {
    rates: RateCard,
}

impl StaticFaqResponder {
    pub fn new(rates: RateCard) -> Self {
        Self { rates }
    }

    fn pricing_answer(&self) -> String {
        if self.rates.is_empty() {
            return "Pricing depends on weight and the services you pick. Send \"book\" and I will quote your order before you confirm.".to_string();
        }
        let mut lines = vec!["Our rates per kilogram:".to_string()];
        for kind in
            [ServiceKind::Wash, ServiceKind::Iron, ServiceKind::DryClean, ServiceKind::ShoeClean]
        {
            if let Some(rate) = self.rates.rate(kind) {
                lines.push(format!("- {}: ₹{rate}/kg", kind.display_name()));
            }
        }
        lines.push("Express delivery adds 30% and arrives in about 24 hours.".to_string());
        lines.join("\n")
    }

    fn turnaround_answer(&self) -> String {
        "Standard delivery takes about 48 hours. Express takes about 24 hours and adds a 30% fee."
            .to_string()
    }

    fn coverage_answer(&self) -> String {
        format!(
            "We currently serve {} and its nearby areas only. Send \"book\" with your address and I will check it for you.",
            capitalize(SERVICED_REGION)
        )
    }
}

#[async_trait]
impl FaqResponder for StaticFaqResponder {
    async fn answer(
        &self,
        question: &str,
        _recent: &RecentExchanges,
    ) -> Result<FaqOutcome, CollabError> {
        let lower = question.trim().to_ascii_lowercase();
        if lower.is_empty() {
            return Ok(FaqOutcome::NoContext);
        }

        if contains_any(&lower, &["price", "pricing", "cost", "rate", "how much", "charge"]) {
            return Ok(FaqOutcome::Answered(self.pricing_answer()));
        }
        if contains_any(&lower, &["how long", "turnaround", "delivery time", "express", "when will"])
        {
            return Ok(FaqOutcome::Answered(self.turnaround_answer()));
        }
        if contains_any(&lower, &["area", "areas", "location", "where do you", "serve", "city"]) {
            return Ok(FaqOutcome::Answered(self.coverage_answer()));
        }

        Ok(FaqOutcome::NoContext)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::collab::{FaqOutcome, FaqResponder};
    use crate::domain::service::RateCard;
    use crate::history::RecentExchanges;

    use super::StaticFaqResponder;

    fn responder() -> StaticFaqResponder {
        StaticFaqResponder::new(RateCard::new([
            ("wash".to_string(), Decimal::new(5000, 2)),
            ("iron".to_string(), Decimal::new(2000, 2)),
        ]))
    }

    async fn ask(responder: &StaticFaqResponder, question: &str) -> FaqOutcome {
        responder.answer(question, &RecentExchanges::default()).await.expect("answer")
    }

    #[tokio::test]
    async fn pricing_questions_list_live_rates() {
        match ask(&responder(), "how much does a wash cost?").await {
            FaqOutcome::Answered(text) => {
                assert!(text.contains("₹50.00/kg"));
                assert!(text.contains("30%"));
            }
            FaqOutcome::NoContext => panic!("pricing question should be answered"),
        }
    }

    #[tokio::test]
    async fn coverage_and_turnaround_are_answered() {
        let responder = responder();
        assert!(matches!(
            ask(&responder, "which areas do you serve?").await,
            FaqOutcome::Answered(_)
        ));
        assert!(matches!(
            ask(&responder, "how long does delivery take").await,
            FaqOutcome::Answered(_)
        ));
    }

    #[tokio::test]
    async fn unknown_topics_report_no_context() {
        assert_eq!(ask(&responder(), "do you iron silk sarees?").await, FaqOutcome::NoContext);
    }
}
