use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::sync::Arc;

use agpulse_core::monitor::{DisplayState, INTERVAL_FLOOR_SECS};
use agpulse_core::presentation::{derive, Representation};

/// Step applied by the interval keys
pub const INTERVAL_STEP_SECS: u64 = 30;

/// Shared state type
pub type SharedState = Arc<RwLock<AppState>>;

/// UI state, derived from the controller's published display state
#[derive(Debug)]
pub struct AppState {
    /// Whether the app is running
    pub running: bool,
    /// Current representation
    pub representation: Representation,
    /// Polling interval as last requested
    pub interval_secs: u64,
    /// When the last Ready state arrived
    pub last_update: Option<DateTime<Local>>,
    /// Whether the detail panel is expanded
    pub show_detail: bool,
}

impl AppState {
    /// Create a new state for the given polling interval
    pub fn new(interval_secs: u64) -> Self {
        Self {
            running: true,
            representation: derive(&DisplayState::Loading),
            interval_secs: interval_secs.max(INTERVAL_FLOOR_SECS),
            last_update: None,
            show_detail: true,
        }
    }

    /// Create a shared state
    pub fn shared(interval_secs: u64) -> SharedState {
        Arc::new(RwLock::new(Self::new(interval_secs)))
    }

    /// Replace the representation with one derived from a new display state
    pub fn apply(&mut self, display: &DisplayState) {
        self.representation = derive(display);
        if matches!(display, DisplayState::Ready(_)) {
            self.last_update = Some(Local::now());
        }
    }

    /// Lengthen the interval by one step, returning the new value
    pub fn increase_interval(&mut self) -> u64 {
        self.interval_secs = self.interval_secs.saturating_add(INTERVAL_STEP_SECS);
        self.interval_secs
    }

    /// Shorten the interval by one step, never below the floor
    pub fn decrease_interval(&mut self) -> u64 {
        self.interval_secs = self
            .interval_secs
            .saturating_sub(INTERVAL_STEP_SECS)
            .max(INTERVAL_FLOOR_SECS);
        self.interval_secs
    }

    /// Toggle the detail panel
    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.running = false;
    }
}
