use super::Status;
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use std::sync::OnceLock;

/// Phrases meaning rooms can be booked (Korean and English variants seen on
/// Agoda, Booking.com, and official hotel pages).
const AVAILABLE_SIGNALS: [&str; 8] = [
    r"객실\s*선택",
    r"객실\s*남음",
    r"예약\s*가능",
    r"지금\s*예약",
    r"Select\s*room",
    r"Available",
    r"Book\s*now",
    r"Rooms?\s+available",
];

/// Phrases meaning inventory is exhausted.
const SOLDOUT_SIGNALS: [&str; 8] = [
    r"매진",
    r"매진되었습니다",
    r"객실이\s*없습니다",
    r"품절",
    r"객실\s*없음",
    r"Sold\s*out",
    r"No\s+rooms\s+available",
    r"Fully\s+booked",
];

/// Currency-prefixed amount of at least two digits. Pages routinely keep
/// showing prices while the booking widget is the only soldout marker.
const PRICE_TOKEN: &str = r"(₩|KRW|NZD|\$)\s?\d{2,}";

/// What the pattern groups saw in one page text.
#[derive(Debug, Clone, Copy)]
struct Signals {
    available: bool,
    soldout: bool,
    priced: bool,
}

/// One row of the ordered decision table. Rows are evaluated top to bottom;
/// the first match decides the status.
struct DecisionRule {
    name: &'static str,
    applies: fn(Signals) -> bool,
    verdict: Status,
}

/// Tie-break order is a contract: exclusive primary signals first, then the
/// weaker price fallback for ambiguous pages. The fallback row is the
/// tunable part of the heuristic.
const DECISION_TABLE: [DecisionRule; 3] = [
    DecisionRule {
        name: "exclusive-available",
        applies: |s| s.available && !s.soldout,
        verdict: Status::Available,
    },
    DecisionRule {
        name: "exclusive-soldout",
        applies: |s| s.soldout && !s.available,
        verdict: Status::SoldOut,
    },
    DecisionRule {
        name: "price-fallback",
        applies: |s| s.priced && !s.soldout,
        verdict: Status::Available,
    },
];

struct PatternSets {
    available: RegexSet,
    soldout: RegexSet,
    price: Regex,
}

fn patterns() -> &'static PatternSets {
    static PATTERNS: OnceLock<PatternSets> = OnceLock::new();
    PATTERNS.get_or_init(|| PatternSets {
        available: RegexSetBuilder::new(AVAILABLE_SIGNALS)
            .case_insensitive(true)
            .build()
            .expect("available signal patterns compile"),
        soldout: RegexSetBuilder::new(SOLDOUT_SIGNALS)
            .case_insensitive(true)
            .build()
            .expect("soldout signal patterns compile"),
        price: RegexBuilder::new(PRICE_TOKEN)
            .case_insensitive(true)
            .build()
            .expect("price pattern compiles"),
    })
}

/// Classifies rendered page text into a coarse availability status.
/// Pure and deterministic; whitespace runs are collapsed first so layout
/// noise cannot split a phrase across matches.
pub fn classify(text: &str) -> Status {
    let normalized = normalize_whitespace(text);
    let sets = patterns();

    let signals = Signals {
        available: sets.available.is_match(&normalized),
        soldout: sets.soldout.is_match(&normalized),
        priced: sets.price.is_match(&normalized),
    };

    DECISION_TABLE
        .iter()
        .find(|rule| (rule.applies)(signals))
        .map(|rule| {
            tracing::debug!(rule = rule.name, "classifier rule matched");
            rule.verdict
        })
        .unwrap_or(Status::Unknown)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_signal_alone_classifies_available() {
        assert_eq!(classify("Hurry, book now for the weekend"), Status::Available);
        assert_eq!(classify("객실 선택 후 결제"), Status::Available);
    }

    #[test]
    fn soldout_signal_alone_classifies_soldout() {
        assert_eq!(classify("This property is sold out for your dates"), Status::SoldOut);
        assert_eq!(classify("죄송합니다. 매진되었습니다."), Status::SoldOut);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("FULLY BOOKED"), Status::SoldOut);
        assert_eq!(classify("rooms available tonight"), Status::Available);
    }

    #[test]
    fn whitespace_runs_do_not_break_phrases() {
        assert_eq!(classify("Sold\n\t  out"), Status::SoldOut);
        assert_eq!(classify("객실\n선택"), Status::Available);
    }

    #[test]
    fn both_signals_without_price_is_unknown() {
        let text = "Rooms available at sister hotels. This property: sold out.";
        assert_eq!(classify(text), Status::Unknown);
    }

    #[test]
    fn both_signals_never_reach_price_fallback() {
        // Soldout signal present blocks the price row even with a price.
        let text = "Rooms available elsewhere. Sold out here. From $120 last week.";
        assert_eq!(classify(text), Status::Unknown);
    }

    #[test]
    fn price_fallback_rescues_ambiguous_page() {
        assert_eq!(classify("Deluxe double from $150 per night"), Status::Available);
        assert_eq!(classify("스탠다드 트윈 ₩ 120,000"), Status::Available);
        assert_eq!(classify("from NZD 245 incl. taxes"), Status::Available);
    }

    #[test]
    fn single_digit_price_is_not_a_signal() {
        assert_eq!(classify("parking fee $5 per day"), Status::Unknown);
    }

    #[test]
    fn empty_text_is_unknown() {
        assert_eq!(classify(""), Status::Unknown);
    }

    #[test]
    fn unrelated_text_is_unknown() {
        assert_eq!(classify("Welcome to our lakefront resort"), Status::Unknown);
    }
}
