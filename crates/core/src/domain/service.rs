use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog service codes as stored in the `services` reference table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Wash,
    Iron,
    DryClean,
    ShoeClean,
}

impl ServiceKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Wash => "wash",
            Self::Iron => "iron",
            Self::DryClean => "dry_clean",
            Self::ShoeClean => "shoe_clean",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "wash" => Some(Self::Wash),
            "iron" => Some(Self::Iron),
            "dry_clean" => Some(Self::DryClean),
            "shoe_clean" => Some(Self::ShoeClean),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Wash => "Wash",
            Self::Iron => "Iron",
            Self::DryClean => "Dry Clean",
            Self::ShoeClean => "Shoe Clean",
        }
    }
}

/// What the customer picked from the service menu. A selection may map to
/// multiple catalog codes (wash + iron is billed as both rates per kg).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceSelection {
    WashOnly,
    WashIron,
    DryClean,
    ShoeClean,
    IronOnly,
}

impl ServiceSelection {
    pub fn codes(&self) -> &'static [ServiceKind] {
        match self {
            Self::WashOnly => &[ServiceKind::Wash],
            Self::WashIron => &[ServiceKind::Wash, ServiceKind::Iron],
            Self::DryClean => &[ServiceKind::DryClean],
            Self::ShoeClean => &[ServiceKind::ShoeClean],
            Self::IronOnly => &[ServiceKind::Iron],
        }
    }

    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::WashOnly),
            "2" => Some(Self::WashIron),
            "3" => Some(Self::DryClean),
            "4" => Some(Self::ShoeClean),
            "5" => Some(Self::IronOnly),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WashOnly => "Wash only",
            Self::WashIron => "Wash + Iron",
            Self::DryClean => "Dry clean",
            Self::ShoeClean => "Shoe clean",
            Self::IronOnly => "Iron only",
        }
    }
}

/// Per-kilogram rates keyed by catalog service code. Read-only reference data
/// supplied by the repository collaborator; an empty card means pricing is
/// unavailable, not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCard {
    rates: BTreeMap<String, Decimal>,
}

impl RateCard {
    pub fn new(rates: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self { rates: rates.into_iter().collect() }
    }

    pub fn rate(&self, kind: ServiceKind) -> Option<Decimal> {
        self.rates.get(kind.code()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{RateCard, ServiceKind, ServiceSelection};

    #[test]
    fn wash_iron_maps_to_both_catalog_codes() {
        assert_eq!(
            ServiceSelection::WashIron.codes(),
            &[ServiceKind::Wash, ServiceKind::Iron]
        );
    }

    #[test]
    fn menu_choices_map_one_to_one() {
        assert_eq!(ServiceSelection::from_menu_choice("1"), Some(ServiceSelection::WashOnly));
        assert_eq!(ServiceSelection::from_menu_choice("5"), Some(ServiceSelection::IronOnly));
        assert_eq!(ServiceSelection::from_menu_choice("6"), None);
        assert_eq!(ServiceSelection::from_menu_choice("wash"), None);
    }

    #[test]
    fn rate_card_lookup_by_code() {
        let card = RateCard::new([("wash".to_string(), Decimal::new(5000, 2))]);
        assert_eq!(card.rate(ServiceKind::Wash), Some(Decimal::new(5000, 2)));
        assert_eq!(card.rate(ServiceKind::Iron), None);
    }
}
