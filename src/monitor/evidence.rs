use regex::Regex;
use std::sync::OnceLock;

/// First visible currency chunk, commas allowed, for human diagnostics.
const PRICE_EVIDENCE: &str = r"(₩|KRW|NZD|\$)\s?[\d,]{2,}";

/// Known external booking providers, tagged in notifications so the reader
/// knows which widget produced the page.
const PROVIDER_TAGS: [(&str, &str); 2] = [("agoda.com", "Agoda"), ("booking.com", "Booking")];

fn price_pattern() -> &'static Regex {
    static PRICE: OnceLock<Regex> = OnceLock::new();
    PRICE.get_or_init(|| Regex::new(PRICE_EVIDENCE).expect("price evidence pattern compiles"))
}

/// Builds a short diagnostic string for the notification body. Purely
/// informational; never feeds back into classification. An empty result is
/// valid and means nothing noteworthy was found.
pub fn extract_evidence(text: &str, source_url: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(found) = price_pattern().find(text) {
        parts.push(format!("price_hint={}", found.as_str()));
    }

    for (needle, tag) in PROVIDER_TAGS {
        if source_url.contains(needle) {
            parts.push(format!("[{tag}]"));
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_first_price_token() {
        let evidence = extract_evidence("Standard ₩ 120,000 Deluxe ₩ 180,000", "https://hotel.example");
        assert_eq!(evidence, "price_hint=₩ 120,000");
    }

    #[test]
    fn tags_known_providers() {
        let evidence = extract_evidence("from $150", "https://www.agoda.com/some-hotel");
        assert_eq!(evidence, "price_hint=$150 [Agoda]");

        let evidence = extract_evidence("no prices here", "https://www.booking.com/hotel/kr/x");
        assert_eq!(evidence, "[Booking]");
    }

    #[test]
    fn empty_when_nothing_found() {
        assert_eq!(extract_evidence("plain marketing copy", "https://hotel.example"), "");
    }
}
