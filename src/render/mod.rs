//! Boundary to the page-rendering capability. The engine only needs final
//! visible text per url; how it is produced (plain HTTP here, a
//! script-executing browser elsewhere) stays behind [`PageRenderer`].

mod http;

pub use http::HttpRenderer;

use async_trait::async_trait;
use std::fmt;

/// Final rendered page content. Empty text is a successful render of an
/// empty page, never an error.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub text: String,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage, RenderError>;
}

#[derive(Debug)]
pub enum RenderError {
    Timeout { seconds: u64 },
    Transport { source: reqwest::Error },
    BadStatus { status: u16 },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Timeout { seconds } => {
                write!(f, "render timed out after {seconds}s")
            }
            RenderError::Transport { source } => write!(f, "transport failure: {source}"),
            RenderError::BadStatus { status } => write!(f, "unexpected HTTP status {status}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Transport { source } => Some(source),
            _ => None,
        }
    }
}
