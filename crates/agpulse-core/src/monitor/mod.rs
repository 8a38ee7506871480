mod controller;
mod state;

pub use controller::{
    clamp_interval, ControlCommand, ControllerHandle, PollController, RefreshTrigger,
    DEFAULT_INTERVAL_SECS, INTERVAL_FLOOR_SECS, MAX_FETCH_ATTEMPTS, MAX_REDISCOVERIES,
};
pub use state::{CredentialState, DisplayState};
