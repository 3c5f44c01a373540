use super::Status;
use crate::config::Site;
use chrono::{DateTime, Local, SecondsFormat};

/// Decides whether a status transition deserves an alert.
///
/// Only transitions into a conclusive state notify: an inconclusive read is
/// usually a transient render failure, and alerting on it would be noise.
/// Dropping from a conclusive state to `unknown` stays silent for the same
/// reason, while `unknown` to a conclusive state is the first confident
/// reading and does notify.
pub fn should_notify(previous: Status, current: Status) -> bool {
    current != previous && current.is_conclusive()
}

/// Everything the delivery channel needs to tell a human what changed.
/// Built only after a positive gating decision and discarded after delivery.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub site_name: String,
    pub url: String,
    pub previous: Status,
    pub current: Status,
    pub evidence: String,
    pub observed_at: DateTime<Local>,
}

impl NotificationEvent {
    pub fn new(site: &Site, previous: Status, current: Status, evidence: &str) -> Self {
        Self {
            site_name: site.display_name().to_string(),
            url: site.url.clone(),
            previous,
            current,
            evidence: evidence.to_string(),
            observed_at: Local::now(),
        }
    }

    /// Telegram HTML message body.
    pub fn message(&self) -> String {
        let mut body = format!(
            "🏨 <b>{}</b>\nStatus change: <b>{} ➜ {}</b>",
            self.site_name, self.previous, self.current
        );
        if !self.evidence.is_empty() {
            body.push('\n');
            body.push_str(&self.evidence);
        }
        body.push_str("\n\n");
        body.push_str(&self.url);
        body
    }

    pub fn observed_at_iso(&self) -> String {
        self.observed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        Site {
            url: "https://www.agoda.com/lakeside".to_string(),
            name: Some("Lakeside Hotel".to_string()),
        }
    }

    #[test]
    fn unchanged_status_never_notifies() {
        assert!(!should_notify(Status::Unknown, Status::Unknown));
        assert!(!should_notify(Status::Available, Status::Available));
        assert!(!should_notify(Status::SoldOut, Status::SoldOut));
    }

    #[test]
    fn first_conclusive_reading_notifies() {
        assert!(should_notify(Status::Unknown, Status::Available));
        assert!(should_notify(Status::Unknown, Status::SoldOut));
    }

    #[test]
    fn conclusive_flip_notifies_both_ways() {
        assert!(should_notify(Status::Available, Status::SoldOut));
        assert!(should_notify(Status::SoldOut, Status::Available));
    }

    #[test]
    fn losing_the_signal_stays_silent() {
        assert!(!should_notify(Status::Available, Status::Unknown));
        assert!(!should_notify(Status::SoldOut, Status::Unknown));
    }

    #[test]
    fn message_carries_transition_evidence_and_url() {
        let event = NotificationEvent::new(
            &site(),
            Status::Unknown,
            Status::SoldOut,
            "price_hint=$150 [Agoda]",
        );
        let message = event.message();
        assert!(message.contains("<b>Lakeside Hotel</b>"));
        assert!(message.contains("unknown ➜ soldout"));
        assert!(message.contains("price_hint=$150 [Agoda]"));
        assert!(message.ends_with("https://www.agoda.com/lakeside"));
    }

    #[test]
    fn message_skips_empty_evidence_line() {
        let event = NotificationEvent::new(&site(), Status::SoldOut, Status::Available, "");
        assert!(!event.message().contains("\n\n\n"));
    }
}
