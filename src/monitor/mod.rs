pub mod classifier;
pub mod evidence;
pub mod gating;
pub mod state;

pub use classifier::classify;
pub use evidence::extract_evidence;
pub use gating::{should_notify, NotificationEvent};
pub use state::{PersistenceError, StateRecord, StateStore};

use crate::config::Site;
use crate::notify::DeliveryChannel;
use crate::render::{PageRenderer, RenderError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Coarse availability inferred from page text. `Unknown` is a real,
/// persisted value, not the absence of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "soldout")]
    SoldOut,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Status {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::SoldOut => "soldout",
            Self::Unknown => "unknown",
        }
    }

    /// Available and soldout are confident readings; unknown is not.
    pub const fn is_conclusive(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one notification attempt during a run.
#[derive(Debug, Clone)]
pub struct NotificationOutcome {
    pub site_name: String,
    pub url: String,
    pub previous: Status,
    pub current: Status,
    pub delivered: bool,
}

/// Aggregate view of one complete pass over the site list.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub checked: usize,
    pub available: usize,
    pub soldout: usize,
    pub unknown: usize,
    pub render_failures: usize,
    pub notifications: Vec<NotificationOutcome>,
}

impl RunSummary {
    fn count(&mut self, status: Status) {
        match status {
            Status::Available => self.available += 1,
            Status::SoldOut => self.soldout += 1,
            Status::Unknown => self.unknown += 1,
        }
    }
}

/// Drives one pass over the configured sites: render, classify, compare
/// against the run-start snapshot, notify on gated transitions, and commit
/// the staged record once at the end.
pub struct Monitor<R, D> {
    renderer: R,
    delivery: D,
    store: StateStore,
}

impl<R, D> Monitor<R, D>
where
    R: PageRenderer,
    D: DeliveryChannel,
{
    pub fn new(renderer: R, delivery: D, store: StateStore) -> Self {
        Self {
            renderer,
            delivery,
            store,
        }
    }

    pub async fn run(&self, sites: &[Site]) -> Result<RunSummary, PersistenceError> {
        let previous = self.store.load();
        let mut staged = previous.clone();
        let mut summary = RunSummary {
            checked: sites.len(),
            ..RunSummary::default()
        };

        for site in sites {
            let name = site.display_name();
            info!(site = name, url = %site.url, "checking site");

            let (status, evidence) = match self.renderer.render(&site.url).await {
                Ok(page) => {
                    let status = classify(&page.text);
                    (status, extract_evidence(&page.text, &site.url))
                }
                Err(err) => {
                    // A failed render is an explicit unknown observation for
                    // this run; it is staged like any other status.
                    summary.render_failures += 1;
                    warn!(site = name, url = %site.url, error = %err, "render failed");
                    (Status::Unknown, render_failure_evidence(&err))
                }
            };

            let prev = previous
                .get(&site.url)
                .copied()
                .unwrap_or(Status::Unknown);
            staged.insert(site.url.clone(), status);
            summary.count(status);

            let notify = should_notify(prev, status);
            if notify {
                let event = NotificationEvent::new(site, prev, status, &evidence);
                let delivered = match self.delivery.deliver(&event.message()).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(site = name, url = %site.url, error = %err, "notification delivery failed");
                        false
                    }
                };
                info!(
                    site = name,
                    previous = %prev,
                    current = %status,
                    delivered,
                    at = %event.observed_at_iso(),
                    "status change"
                );
                summary.notifications.push(NotificationOutcome {
                    site_name: event.site_name,
                    url: event.url,
                    previous: prev,
                    current: status,
                    delivered,
                });
            }

            info!(
                site = name,
                status = %status,
                previous = %prev,
                evidence = %evidence,
                notified = notify,
                "site observed"
            );
        }

        // Single commit after the full pass; a mid-pass crash leaves the
        // previous run's record untouched.
        self.store.save(&staged)?;
        Ok(summary)
    }
}

fn render_failure_evidence(err: &RenderError) -> String {
    match err {
        RenderError::Timeout { .. } => "timeout".to_string(),
        other => format!("error: {other}"),
    }
}
