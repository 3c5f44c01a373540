//! Availability change-detection and notification engine: renders booking
//! pages, classifies their text into a coarse availability status, and
//! alerts on status transitions.

pub mod config;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod render;
pub mod telemetry;
