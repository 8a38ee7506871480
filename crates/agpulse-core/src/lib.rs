//! Core library for agpulse.
//!
//! Discovers the local Antigravity language server, polls its quota API,
//! and derives what a display surface should show.

pub mod config;
pub mod discovery;
pub mod error;
pub mod monitor;
pub mod presentation;
pub mod quota;

use config::Settings;
use discovery::ProcessLocator;
use monitor::{ControllerHandle, PollController};
use quota::HttpQuotaClient;

/// Controller wired to the real process locator and HTTP client
pub type DefaultController = PollController<ProcessLocator, HttpQuotaClient>;

/// Build a controller from validated settings
pub fn controller_from_settings(settings: &Settings) -> (DefaultController, ControllerHandle) {
    let locator = ProcessLocator::with_probe_timeout(settings.probe_timeout()).with_override(
        settings.companion.port,
        settings.companion.csrf_token.clone(),
    );
    let client = HttpQuotaClient::with_timeout(settings.request_timeout());
    PollController::new(locator, client, settings.poll_interval_secs)
}
