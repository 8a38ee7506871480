mod detail_panel;
mod status_bar;

pub use detail_panel::DetailPanel;
pub use status_bar::StatusBar;
