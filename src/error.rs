use crate::config::{ConfigError, SiteListError};
use crate::monitor::PersistenceError;
use crate::render::RenderError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Sites(SiteListError),
    Telemetry(TelemetryError),
    Render(RenderError),
    Persistence(PersistenceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Sites(err) => write!(f, "site list error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Render(err) => write!(f, "renderer setup error: {err}"),
            AppError::Persistence(err) => write!(f, "state persistence error: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Sites(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Render(err) => Some(err),
            AppError::Persistence(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SiteListError> for AppError {
    fn from(value: SiteListError) -> Self {
        Self::Sites(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<RenderError> for AppError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

impl From<PersistenceError> for AppError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}
