use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use agpulse_core::config::Settings;
use agpulse_core::controller_from_settings;
use agpulse_core::monitor::{ControllerHandle, DisplayState};

use super::components::{DetailPanel, StatusBar};
use super::state::{AppState, SharedState};
use super::Layout;

/// How long to wait for the controller task after stopping it
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Refresh,
    IncreaseInterval,
    DecreaseInterval,
    ToggleDetail,
    Quit,
}

impl KeyAction {
    /// Map a key press to an action
    pub fn from_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Self> {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Quit),
            KeyCode::Char('q') | KeyCode::Esc => Some(Self::Quit),
            KeyCode::Char('r') | KeyCode::Enter | KeyCode::Char(' ') => Some(Self::Refresh),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Self::IncreaseInterval),
            KeyCode::Char('-') => Some(Self::DecreaseInterval),
            KeyCode::Char('d') => Some(Self::ToggleDetail),
            _ => None,
        }
    }
}

/// Main application
pub struct App {
    state: SharedState,
    settings: Settings,
    layout: Layout,
}

impl App {
    /// Create a new application
    pub fn new(settings: Settings) -> Self {
        let state = AppState::shared(settings.poll_interval_secs);
        Self {
            state,
            settings,
            layout: Layout::new(),
        }
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        // Start the controller before taking over the terminal
        let (controller, handle) = controller_from_settings(&self.settings);
        let mut display_rx = handle.subscribe();
        let task = tokio::spawn(controller.run());

        // Setup terminal
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self
            .main_loop(&mut terminal, &handle, &mut display_rx)
            .await;

        // Stop polling; late results are discarded by the controller
        handle.stop();

        // Restore terminal
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
            warn!("Controller did not stop within {:?}", SHUTDOWN_TIMEOUT);
        }

        result
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        handle: &ControllerHandle,
        display_rx: &mut watch::Receiver<DisplayState>,
    ) -> Result<()> {
        // Show whatever was published before the first frame
        self.state.write().apply(&display_rx.borrow_and_update());

        loop {
            // Check if we should quit
            if !self.state.read().running {
                break;
            }

            // Pick up the latest published state
            if display_rx.has_changed().unwrap_or(false) {
                let new_display = display_rx.borrow_and_update().clone();
                debug!("Display state changed: {:?}", new_display);
                self.state.write().apply(&new_display);
            }

            // Draw UI
            terminal.draw(|frame| {
                let state = self.state.read();
                let areas = self.layout.calculate(frame.area(), state.show_detail);

                StatusBar::render(frame, areas.indicator, &state);
                if let Some(detail_area) = areas.detail {
                    DetailPanel::render(frame, detail_area, &state);
                }
                StatusBar::render_hints(frame, areas.hints);
            })?;

            // Handle events with timeout
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers, handle);
                    }
                }
            }

            // Let the controller task make progress on single-threaded runtimes
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers, handle: &ControllerHandle) {
        let Some(action) = KeyAction::from_key(code, modifiers) else {
            return;
        };

        let mut state = self.state.write();
        match action {
            KeyAction::Quit => state.quit(),
            KeyAction::Refresh => handle.refresh(),
            KeyAction::IncreaseInterval => handle.set_interval(state.increase_interval()),
            KeyAction::DecreaseInterval => handle.set_interval(state.decrease_interval()),
            KeyAction::ToggleDetail => state.toggle_detail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_keys() {
        for code in [KeyCode::Char('r'), KeyCode::Enter, KeyCode::Char(' ')] {
            assert_eq!(
                KeyAction::from_key(code, KeyModifiers::NONE),
                Some(KeyAction::Refresh)
            );
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('q'), KeyModifiers::NONE),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Esc, KeyModifiers::NONE),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(KeyAction::Quit)
        );
    }

    #[test]
    fn test_interval_keys() {
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('+'), KeyModifiers::NONE),
            Some(KeyAction::IncreaseInterval)
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('-'), KeyModifiers::NONE),
            Some(KeyAction::DecreaseInterval)
        );
    }

    #[test]
    fn test_unbound_key() {
        assert_eq!(KeyAction::from_key(KeyCode::Char('x'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_new_app_uses_settings_interval() {
        let settings = Settings {
            poll_interval_secs: 300,
            ..Settings::default()
        };
        let app = App::new(settings);
        assert_eq!(app.state.read().interval_secs, 300);
    }
}
