use super::{PageRenderer, RenderError, RenderedPage};
use crate::config::RendererConfig;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect;
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

/// Overlay and consent chrome to drop before text extraction, tried in
/// order, failures ignored. Booking widgets bury the actual availability
/// text under this noise.
const DISMISS_SELECTORS: [&str; 6] = [
    "[data-testid='cookie-accept']",
    "#onetrust-banner-sdk",
    "#cookie-banner",
    ".cookie-consent",
    ".consent-overlay",
    ".modal-overlay",
];

/// Best-effort implementation of the external page-renderer capability over
/// plain HTTP: browser-like headers, bounded redirects, no script execution.
/// Single-page-app listings that only materialize after script execution
/// will come back inconclusive and classify as unknown.
pub struct HttpRenderer {
    client: reqwest::Client,
    settle: Duration,
    nav_timeout: Duration,
    dismiss: Vec<Selector>,
}

impl HttpRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en;q=0.6"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.nav_timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(5))
            .build()
            .map_err(|source| RenderError::Transport { source })?;

        Ok(Self {
            client,
            settle: config.settle,
            nav_timeout: config.nav_timeout,
            dismiss: dismiss_selectors(),
        })
    }

    fn fetch_error(&self, err: reqwest::Error) -> RenderError {
        if err.is_timeout() {
            RenderError::Timeout {
                seconds: self.nav_timeout.as_secs(),
            }
        } else {
            RenderError::Transport { source: err }
        }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage, RenderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.fetch_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::BadStatus {
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|err| self.fetch_error(err))?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        Ok(RenderedPage {
            text: collect_visible_text(&html, &self.dismiss),
        })
    }
}

fn body_selector() -> &'static Selector {
    static BODY: OnceLock<Selector> = OnceLock::new();
    BODY.get_or_init(|| Selector::parse("body").expect("body selector parses"))
}

fn dismiss_selectors() -> Vec<Selector> {
    DISMISS_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .collect()
}

/// Visible body text with overlay subtrees and script/style content
/// excluded, chunks joined by single spaces.
fn collect_visible_text(html: &str, dismiss: &[Selector]) -> String {
    let document = Html::parse_document(html);

    let mut skip = HashSet::new();
    for selector in dismiss {
        for element in document.select(selector) {
            skip.insert(element.id());
        }
    }

    let root = document
        .select(body_selector())
        .next()
        .map(|element| *element)
        .unwrap_or_else(|| document.tree.root());

    let mut text = String::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if skip.contains(&node.id()) {
            continue;
        }
        match node.value() {
            Node::Text(chunk) => {
                let trimmed = chunk.trim();
                if !trimmed.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(trimmed);
                }
            }
            Node::Element(element) => {
                if matches!(element.name(), "script" | "style" | "noscript" | "template") {
                    continue;
                }
                stack.extend(node.children().rev());
            }
            _ => stack.extend(node.children().rev()),
        }
    }
    text
}
