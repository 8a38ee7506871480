mod app;
pub mod components;
mod layout;
mod state;

pub use app::App;
pub use layout::{Layout, LayoutAreas};
pub use state::{AppState, SharedState, INTERVAL_STEP_SECS};
