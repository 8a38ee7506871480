//! Discovery-and-polling state machine.
//!
//! The controller runs as a single tokio task. Timer ticks and commands from
//! [`ControllerHandle`]s are handled one at a time, so refresh cycles never
//! overlap and the credential is always replaced as a whole value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Notify};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::state::{CredentialState, DisplayState};
use crate::discovery::{EndpointCredential, Locator};
use crate::error::PulseError;
use crate::quota::{QuotaSnapshot, QuotaSource};

/// Minimum polling interval in seconds
pub const INTERVAL_FLOOR_SECS: u64 = 30;

/// Polling interval used when nothing is configured
pub const DEFAULT_INTERVAL_SECS: u64 = 120;

/// Upper bound on fetch attempts in one refresh cycle
pub const MAX_FETCH_ATTEMPTS: usize = 2;

/// Upper bound on re-discovery attempts in one refresh cycle
pub const MAX_REDISCOVERIES: usize = 1;

/// Command channel capacity
const COMMAND_BUFFER: usize = 16;

/// Clamp a configured interval to the polling floor
pub fn clamp_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.max(INTERVAL_FLOOR_SECS))
}

/// What caused a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The recurring timer fired
    Timer,
    /// The user asked for it (display surface activated)
    Manual,
}

/// Commands accepted by a running controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Manual refresh
    Refresh,
    /// Change the polling interval (seconds, clamped)
    SetInterval(u64),
}

/// Event handled by one iteration of the run loop
enum LoopEvent {
    Halt,
    Command(Option<ControlCommand>),
    Tick,
}

/// Stop signal shared between the controller and its handles.
///
/// Setting the flag never goes through the command channel, so a full
/// buffer cannot delay or drop it.
#[derive(Debug, Default)]
struct Halt {
    flag: AtomicBool,
    wake: Notify,
}

impl Halt {
    fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // Stores a permit if the run loop is not waiting yet
        self.wake.notify_one();
    }

    fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Cloneable handle used by the display surface to drive the controller
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<ControlCommand>,
    halt: Arc<Halt>,
    display: watch::Receiver<DisplayState>,
}

impl ControllerHandle {
    /// Request a manual refresh
    pub fn refresh(&self) {
        self.send(ControlCommand::Refresh);
    }

    /// Request a new polling interval
    pub fn set_interval(&self, secs: u64) {
        self.send(ControlCommand::SetInterval(secs));
    }

    /// Stop polling. No refresh starts afterwards and results of cycles
    /// already in flight are discarded.
    pub fn stop(&self) {
        self.halt.set();
    }

    /// Whether the controller has been stopped
    pub fn is_stopped(&self) -> bool {
        self.halt.is_set()
    }

    /// Current display state
    pub fn display(&self) -> DisplayState {
        self.display.borrow().clone()
    }

    /// Subscribe to display state changes
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.display.clone()
    }

    fn send(&self, command: ControlCommand) {
        if self.is_stopped() {
            return;
        }
        if let Err(e) = self.commands.try_send(command) {
            debug!("Controller command dropped: {}", e);
        }
    }
}

/// Owns the discovery state and drives quota refreshes
pub struct PollController<L, Q> {
    locator: L,
    client: Q,
    credential: Option<EndpointCredential>,
    interval: Duration,
    ticker: Option<Interval>,
    display_tx: watch::Sender<DisplayState>,
    commands: mpsc::Receiver<ControlCommand>,
    halt: Arc<Halt>,
}

impl<L: Locator, Q: QuotaSource> PollController<L, Q> {
    /// Create a controller in the `NoCredential / Loading` state
    pub fn new(locator: L, client: Q, interval_secs: u64) -> (Self, ControllerHandle) {
        let (display_tx, display_rx) = watch::channel(DisplayState::Loading);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let halt = Arc::new(Halt::default());

        let controller = Self {
            locator,
            client,
            credential: None,
            interval: clamp_interval(interval_secs),
            ticker: None,
            display_tx,
            commands: command_rx,
            halt: halt.clone(),
        };
        let handle = ControllerHandle {
            commands: command_tx,
            halt,
            display: display_rx,
        };
        (controller, handle)
    }

    /// Whether an endpoint is currently known
    pub fn credential_state(&self) -> CredentialState {
        if self.credential.is_some() {
            CredentialState::Credentialed
        } else {
            CredentialState::NoCredential
        }
    }

    /// Currently held endpoint
    pub fn credential(&self) -> Option<&EndpointCredential> {
        self.credential.as_ref()
    }

    /// Whether the recurring timer is armed
    pub fn is_timer_armed(&self) -> bool {
        self.ticker.is_some()
    }

    /// Effective polling interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Discover the companion and, if found, refresh and arm the timer
    pub async fn start(&mut self) {
        if self.is_halted() {
            return;
        }
        self.publish(DisplayState::Loading);

        self.credential = self.locator.locate().await;
        if self.credential.is_none() {
            warn!("Antigravity language server not found");
            self.publish(DisplayState::Error(
                PulseError::DiscoveryNotFound.to_string(),
            ));
            return;
        }

        self.refresh_cycle().await;
        self.arm_timer();
    }

    /// Run one refresh.
    ///
    /// A manual refresh shows Loading immediately and discovers first when no
    /// endpoint is known; a timer refresh never discovers from scratch.
    /// Nothing happens once stopped.
    pub async fn refresh(&mut self, trigger: RefreshTrigger) {
        if self.is_halted() {
            debug!("Ignoring {:?} refresh after stop", trigger);
            return;
        }

        if trigger == RefreshTrigger::Manual {
            self.publish(DisplayState::Loading);
            if self.credential.is_none() {
                self.credential = self.locator.locate().await;
            }
        }

        self.refresh_cycle().await;

        if trigger == RefreshTrigger::Manual && self.credential.is_some() && !self.is_timer_armed()
        {
            self.arm_timer();
        }
    }

    /// Change the polling interval, clamped to the floor, re-arming the timer
    pub fn set_interval(&mut self, secs: u64) {
        self.interval = clamp_interval(secs);
        info!("Polling interval set to {}s", self.interval.as_secs());
        if self.ticker.is_some() {
            self.arm_timer();
        }
    }

    /// Cancel the timer and invalidate in-flight cycles. Idempotent.
    pub fn stop(&mut self) {
        if !self.is_halted() {
            debug!("Controller stopped");
        }
        self.halt.set();
        self.ticker = None;
    }

    /// Start, then serve timer ticks and commands until stopped
    pub async fn run(mut self) {
        self.start().await;

        while !self.is_halted() {
            let event = tokio::select! {
                biased;
                _ = self.halt.wake.notified() => LoopEvent::Halt,
                command = self.commands.recv() => LoopEvent::Command(command),
                _ = next_tick(&mut self.ticker) => LoopEvent::Tick,
            };

            // A stop may have landed while another branch was ready
            if self.is_halted() {
                break;
            }

            match event {
                LoopEvent::Halt | LoopEvent::Command(None) => break,
                LoopEvent::Tick => self.refresh(RefreshTrigger::Timer).await,
                LoopEvent::Command(Some(ControlCommand::Refresh)) => {
                    self.refresh(RefreshTrigger::Manual).await
                }
                LoopEvent::Command(Some(ControlCommand::SetInterval(secs))) => {
                    self.set_interval(secs)
                }
            }
        }

        self.stop();
    }

    /// Fetch with the bounded recovery policy and publish the outcome
    async fn refresh_cycle(&mut self) {
        let state = match self.fetch_with_recovery().await {
            Ok(snapshot) => DisplayState::Ready(snapshot),
            Err(e) => {
                warn!("Refresh failed: {:?}", e);
                DisplayState::Error(e.to_string())
            }
        };
        self.publish(state);
    }

    /// At most [`MAX_FETCH_ATTEMPTS`] fetches and [`MAX_REDISCOVERIES`]
    /// discoveries. The credential ends as the last discovery returned it.
    async fn fetch_with_recovery(&mut self) -> Result<QuotaSnapshot, PulseError> {
        let Some(mut credential) = self.credential.clone() else {
            return Err(PulseError::NoCredential);
        };

        let mut attempts = 0;
        let mut rediscoveries = 0;
        loop {
            attempts += 1;
            let err = match self.client.fetch(&credential).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => e,
            };
            debug!("Fetch attempt {} failed: {}", attempts, err);

            if attempts >= MAX_FETCH_ATTEMPTS
                || rediscoveries >= MAX_REDISCOVERIES
                || self.is_halted()
            {
                return Err(PulseError::FetchFailed(err));
            }

            // The companion may have restarted with a new port or token
            rediscoveries += 1;
            self.credential = self.locator.locate().await;
            match &self.credential {
                Some(found) => credential = found.clone(),
                None => return Err(PulseError::FetchFailed(err)),
            }
        }
    }

    fn is_halted(&self) -> bool {
        self.halt.is_set()
    }

    fn publish(&self, state: DisplayState) {
        if self.is_halted() {
            debug!("Discarding result of a cycle that outlived stop");
        } else {
            self.display_tx.send_replace(state);
        }
    }

    fn arm_timer(&mut self) {
        if self.is_halted() {
            return;
        }
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        debug!("Timer armed every {}s", self.interval.as_secs());
    }
}

/// Wait for the next tick, or forever when the timer is not armed
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
