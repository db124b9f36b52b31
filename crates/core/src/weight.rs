//! Best-effort weight extraction from free text: either a bare number of
//! kilograms, or counted items converted through per-unit weight constants.
//! Ambiguous text fails and the caller re-prompts; this is not a grammar.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MIN_WEIGHT_KG: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
pub const MAX_WEIGHT_KG: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Per-unit weights in hundredths of a kilogram.
const SHIRT_KG_CENTI: i64 = 20;
const PANT_KG_CENTI: i64 = 25;
const PIECE_KG_CENTI: i64 = 20;
const SHOE_PAIR_KG_CENTI: i64 = 60;
const IRON_PIECE_KG_CENTI: i64 = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedWeight {
    pub kilograms: Decimal,
    /// Human-readable derivation, e.g. "5 shirts, 2 pants". Absent when the
    /// customer gave kilograms directly.
    pub note: Option<String>,
}

/// Textile categories collected in the dry-clean sub-flow, each with its own
/// per-unit weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextileKind {
    Bedsheet,
    Carpet,
    Curtain,
}

impl TextileKind {
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::Bedsheet),
            "2" => Some(Self::Carpet),
            "3" => Some(Self::Curtain),
            _ => None,
        }
    }

    pub fn per_unit_kg(&self) -> Decimal {
        match self {
            Self::Bedsheet => Decimal::new(100, 2),
            Self::Carpet => Decimal::new(400, 2),
            Self::Curtain => Decimal::new(150, 2),
        }
    }

    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::Bedsheet => "bedsheet",
            Self::Carpet => "carpet",
            Self::Curtain => "curtain",
        }
    }
}

/// Parses the free-form weight step: a bare decimal in [0.5, 100] kg wins,
/// otherwise counted shirts/pants/pieces/clothes are summed through the unit
/// constants. A summed weight below 0.5 kg is a failed parse.
pub fn parse_weight(raw: &str) -> Option<ParsedWeight> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Plain number first: "2", "3.5", "3,5".
    if let Ok(kilograms) = trimmed.replace(',', ".").parse::<Decimal>() {
        if kilograms >= MIN_WEIGHT_KG && kilograms <= MAX_WEIGHT_KG {
            return Some(ParsedWeight { kilograms: kilograms.round_dp(2), note: None });
        }
        return None;
    }

    let mut shirts = 0u32;
    let mut pants = 0u32;
    let mut pieces = 0u32;
    for (count, unit) in counted_units(trimmed) {
        match unit {
            CountedUnit::Shirt => shirts += count,
            CountedUnit::Pant => pants += count,
            CountedUnit::Piece => pieces += count,
        }
    }

    let total_centi = i64::from(shirts) * SHIRT_KG_CENTI
        + i64::from(pants) * PANT_KG_CENTI
        + i64::from(pieces) * PIECE_KG_CENTI;
    let total = Decimal::new(total_centi, 2);
    if total < MIN_WEIGHT_KG {
        return None;
    }

    let mut parts = Vec::new();
    if shirts > 0 {
        parts.push(pluralize(shirts, "shirt"));
    }
    if pants > 0 {
        parts.push(pluralize(pants, "pant"));
    }
    if pieces > 0 {
        parts.push(pluralize(pieces, "piece"));
    }

    Some(ParsedWeight {
        kilograms: total.min(MAX_WEIGHT_KG).round_dp(2),
        note: Some(parts.join(", ")),
    })
}

/// Weight for the shoe-clean sub-flow: a count of pairs, given either as a
/// bare integer or as "3 pairs".
pub fn weight_from_shoe_pairs(raw: &str) -> Option<ParsedWeight> {
    let pairs = parse_unit_count(raw)?;
    let kilograms = Decimal::new(i64::from(pairs) * SHOE_PAIR_KG_CENTI, 2);
    clamped_itemized(kilograms, pluralize(pairs, "pair"))
}

/// Weight for the iron-only sub-flow: a count of pieces to press.
pub fn weight_from_iron_pieces(raw: &str) -> Option<ParsedWeight> {
    let count = parse_unit_count(raw)?;
    let kilograms = Decimal::new(i64::from(count) * IRON_PIECE_KG_CENTI, 2);
    clamped_itemized(kilograms, pluralize(count, "piece"))
}

/// Weight for the textile sub-flow once the category is known.
pub fn weight_from_textiles(kind: TextileKind, raw: &str) -> Option<ParsedWeight> {
    let count = parse_unit_count(raw)?;
    let kilograms = kind.per_unit_kg() * Decimal::from(count);
    clamped_itemized(kilograms, pluralize(count, kind.unit_label()))
}

/// Extracts the leading item count from text like "3", "3 pairs", "3pairs".
pub fn parse_unit_count(raw: &str) -> Option<u32> {
    for token in tokens(raw) {
        let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
        if !digits.is_empty() {
            let count = digits.parse::<u32>().ok()?;
            return (count >= 1).then_some(count);
        }
    }
    None
}

fn clamped_itemized(kilograms: Decimal, note: String) -> Option<ParsedWeight> {
    if kilograms < MIN_WEIGHT_KG {
        return None;
    }
    Some(ParsedWeight { kilograms: kilograms.min(MAX_WEIGHT_KG).round_dp(2), note: Some(note) })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CountedUnit {
    Shirt,
    Pant,
    Piece,
}

fn unit_from_word(word: &str) -> Option<CountedUnit> {
    let singular = word.trim_end_matches('s');
    match singular {
        "shirt" | "tshirt" => Some(CountedUnit::Shirt),
        "pant" | "trouser" => Some(CountedUnit::Pant),
        "piece" | "cloth" | "clothe" | "item" => Some(CountedUnit::Piece),
        _ => None,
    }
}

fn tokens(raw: &str) -> Vec<String> {
    raw.to_ascii_lowercase()
        .replace(',', " ")
        .split_whitespace()
        .map(|token| token.to_string())
        .collect()
}

/// Pairs each number with its unit word, tolerating "5shirts" as well as
/// "5 shirts".
fn counted_units(raw: &str) -> Vec<(u32, CountedUnit)> {
    let tokens = tokens(raw);
    let mut out = Vec::new();
    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            index += 1;
            continue;
        }
        let Ok(count) = digits.parse::<u32>() else {
            index += 1;
            continue;
        };

        let suffix = &token[digits.len()..];
        if !suffix.is_empty() {
            if let Some(unit) = unit_from_word(suffix) {
                out.push((count, unit));
            }
            index += 1;
            continue;
        }

        if let Some(next) = tokens.get(index + 1) {
            if let Some(unit) = unit_from_word(next) {
                out.push((count, unit));
                index += 2;
                continue;
            }
        }
        index += 1;
    }
    out
}

fn pluralize(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        parse_unit_count, parse_weight, weight_from_iron_pieces, weight_from_shoe_pairs,
        weight_from_textiles, TextileKind,
    };

    #[test]
    fn bare_numbers_pass_through_without_a_note() {
        let parsed = parse_weight("3.5").expect("in range");
        assert_eq!(parsed.kilograms, Decimal::new(350, 2));
        assert_eq!(parsed.note, None);

        let parsed = parse_weight("2").expect("in range");
        assert_eq!(parsed.kilograms, Decimal::new(200, 2));
    }

    #[test]
    fn decimal_comma_is_accepted() {
        let parsed = parse_weight("3,5").expect("comma decimal");
        assert_eq!(parsed.kilograms, Decimal::new(350, 2));
    }

    #[test]
    fn out_of_range_numbers_fail() {
        assert!(parse_weight("0.3").is_none());
        assert!(parse_weight("150").is_none());
    }

    #[test]
    fn itemized_counts_sum_per_unit_weights() {
        let parsed = parse_weight("5 shirts, 2 pants").expect("itemized");
        // 5 * 0.2 + 2 * 0.25
        assert_eq!(parsed.kilograms, Decimal::new(150, 2));
        assert_eq!(parsed.note.as_deref(), Some("5 shirts, 2 pants"));
    }

    #[test]
    fn generic_pieces_and_clothes_count_as_pieces() {
        let parsed = parse_weight("8 pieces").expect("pieces");
        assert_eq!(parsed.kilograms, Decimal::new(160, 2));
        assert_eq!(parsed.note.as_deref(), Some("8 pieces"));

        let parsed = parse_weight("10 clothes").expect("clothes");
        assert_eq!(parsed.kilograms, Decimal::new(200, 2));
        assert_eq!(parsed.note.as_deref(), Some("10 pieces"));
    }

    #[test]
    fn glued_count_and_unit_is_tolerated() {
        let parsed = parse_weight("5shirts").expect("glued token");
        assert_eq!(parsed.kilograms, Decimal::new(100, 2));
        assert_eq!(parsed.note.as_deref(), Some("5 shirts"));
    }

    #[test]
    fn tiny_itemized_totals_fail_the_parse() {
        // 2 shirts = 0.4 kg, below the billable minimum.
        assert!(parse_weight("2 shirts").is_none());
        assert!(parse_weight("socks maybe").is_none());
    }

    #[test]
    fn itemized_totals_clamp_at_the_ceiling() {
        let parsed = parse_weight("900 shirts").expect("clamped");
        assert_eq!(parsed.kilograms, Decimal::new(10_000, 2));
    }

    #[test]
    fn shoe_pairs_use_their_own_unit_weight() {
        let parsed = weight_from_shoe_pairs("3 pairs").expect("pairs");
        assert_eq!(parsed.kilograms, Decimal::new(180, 2));
        assert_eq!(parsed.note.as_deref(), Some("3 pairs"));

        let parsed = weight_from_shoe_pairs("1").expect("bare count");
        assert_eq!(parsed.kilograms, Decimal::new(60, 2));
        assert_eq!(parsed.note.as_deref(), Some("1 pair"));
    }

    #[test]
    fn two_iron_pieces_are_below_the_minimum() {
        assert!(weight_from_iron_pieces("2").is_none());
        let parsed = weight_from_iron_pieces("12 pieces").expect("enough pieces");
        assert_eq!(parsed.kilograms, Decimal::new(240, 2));
    }

    #[test]
    fn textiles_carry_category_specific_weights() {
        let parsed = weight_from_textiles(TextileKind::Carpet, "2").expect("carpets");
        assert_eq!(parsed.kilograms, Decimal::new(800, 2));
        assert_eq!(parsed.note.as_deref(), Some("2 carpets"));

        let parsed = weight_from_textiles(TextileKind::Bedsheet, "1").expect("bedsheet");
        assert_eq!(parsed.kilograms, Decimal::new(100, 2));
        assert_eq!(parsed.note.as_deref(), Some("1 bedsheet"));
    }

    #[test]
    fn unit_count_requires_a_leading_number() {
        assert_eq!(parse_unit_count("3 pairs"), Some(3));
        assert_eq!(parse_unit_count("3pairs"), Some(3));
        assert_eq!(parse_unit_count("a few"), None);
        assert_eq!(parse_unit_count("0"), None);
    }
}
