//! The locally-known session snapshot.
//!
//! [`SessionStore`] is the single aggregate that every update source
//! (status pulls, push messages, optimistic actions) writes through. It
//! does no I/O. Derived fields are recomputed inside each setter that
//! touches their inputs, so a reader can never observe a balance or a
//! selection together with a stale projection.

use kiosk_sync_types::{KioskStatus, Program, ProgramId, SessionId, SessionState};
use serde::Serialize;

use crate::projection::{self, DisplayStatus};

/// State of the push connection, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionStatus {
    /// No socket.
    #[default]
    Disconnected,
    /// Socket opening.
    Connecting,
    /// Socket open.
    Connected,
}

/// Canonical local mirror of the controller session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session_id: Option<SessionId>,
    session_state: Option<SessionState>,
    kiosk_state: i64,
    balance: f64,
    programs: Vec<Program>,
    selected_program: Option<ProgramId>,
    running: bool,
    high_water_balance: f64,
    // Derived from balance and selected_program.
    time_remaining: u64,
    max_time: u64,
    connection: ConnectionStatus,
    retry_count: u32,
    initialized: bool,
    in_flight: u32,
    currency: String,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new(currency: &str) -> Self {
        Self {
            session_id: None,
            session_state: None,
            kiosk_state: 0,
            balance: 0.0,
            programs: Vec::new(),
            selected_program: None,
            running: false,
            high_water_balance: 0.0,
            time_remaining: 0,
            max_time: 0,
            connection: ConnectionStatus::Disconnected,
            retry_count: 0,
            initialized: false,
            in_flight: 0,
            currency: currency.to_string(),
        }
    }

    // ===========================================
    // Setters
    // ===========================================

    /// Overwrite local state from an authoritative status response.
    ///
    /// Returns `true` when the response shows the session has just
    /// completed, in which case the local session was reset first.
    pub fn apply_status(&mut self, status: &KioskStatus) -> bool {
        let finished = status.session_state == Some(SessionState::Completed)
            && self.session_state != Some(SessionState::Completed);
        if finished {
            self.reset_session();
        }

        self.kiosk_state = status.kiosk_state;
        self.programs = status.programs.clone();
        self.session_id = status.session_id.clone();
        self.session_state = status.session_state;
        if let Some(state) = status.session_state {
            self.running = state == SessionState::Active;
        }
        self.initialized = true;

        match status.balance_value() {
            Some(balance) => self.set_balance(balance),
            // Catalog may have changed the selected program's rate.
            None => self.reproject(),
        }
        finished
    }

    /// Replace the balance with an absolute value (clamped at zero).
    pub fn set_balance(&mut self, balance: f64) {
        self.balance = if balance.is_finite() { balance.max(0.0) } else { 0.0 };
        if self.balance > self.high_water_balance {
            self.high_water_balance = self.balance;
        }
        self.reproject();
    }

    /// Add to the balance.
    pub fn add_balance(&mut self, amount: f64) {
        self.set_balance(self.balance + amount);
    }

    /// Record the session state reported alongside a push.
    pub fn set_session_state(&mut self, state: SessionState) {
        self.session_state = Some(state);
    }

    /// Select a program.
    pub fn select_program(&mut self, program_id: ProgramId) {
        self.selected_program = Some(program_id);
        self.reproject();
    }

    /// Set the running flag.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Back to baseline: no program, zero balance, zero time.
    ///
    /// This is the only operation that lowers the high-water marks.
    pub fn reset_session(&mut self) {
        self.selected_program = None;
        self.running = false;
        self.balance = 0.0;
        self.high_water_balance = 0.0;
        self.time_remaining = 0;
        self.max_time = 0;
    }

    /// Record the push connection status and its retry counter.
    pub fn set_connection(&mut self, status: ConnectionStatus, retry_count: u32) {
        self.connection = status;
        self.retry_count = retry_count;
    }

    /// Mark a request as in flight.
    pub fn begin_request(&mut self) {
        self.in_flight += 1;
    }

    /// Mark a request as finished.
    pub fn end_request(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn reproject(&mut self) {
        let rate = self.selected().and_then(Program::rate);
        self.time_remaining = projection::time_remaining(self.balance, rate);
        self.max_time = self.max_time.max(self.time_remaining);
    }

    // ===========================================
    // Reads
    // ===========================================

    /// Current balance.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Highest balance seen since the last reset.
    pub fn high_water_balance(&self) -> f64 {
        self.high_water_balance
    }

    /// Seconds the balance buys with the selected program.
    pub fn time_remaining(&self) -> u64 {
        self.time_remaining
    }

    /// Highest `time_remaining` since the last reset.
    pub fn max_time(&self) -> u64 {
        self.max_time
    }

    /// Selected program id.
    pub fn selected_program(&self) -> Option<&ProgramId> {
        self.selected_program.as_ref()
    }

    /// Selected program's catalog entry, if it is in the catalog.
    pub fn selected(&self) -> Option<&Program> {
        self.selected_program
            .as_ref()
            .and_then(|id| self.program(id))
    }

    /// Look up a program in the catalog.
    pub fn program(&self, id: &ProgramId) -> Option<&Program> {
        self.programs.iter().find(|p| &p.id == id)
    }

    /// Whether a program is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current session id.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Whether at least one status fetch has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Currency label.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// A consistent read of everything, derived fields included.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            session_state: self.session_state,
            kiosk_state: self.kiosk_state,
            balance: self.balance,
            high_water_balance: self.high_water_balance,
            programs: self.programs.clone(),
            selected_program: self.selected_program.clone(),
            running: self.running,
            status: DisplayStatus::derive(self.balance, self.running),
            time_remaining: self.time_remaining,
            max_time: self.max_time,
            time_display: projection::format_time(self.time_remaining),
            balance_progress: projection::progress(self.balance, self.high_water_balance),
            time_progress: projection::progress(self.time_remaining as f64, self.max_time as f64),
            connection: self.connection,
            retry_count: self.retry_count,
            initialized: self.initialized,
            loading: self.in_flight > 0,
            currency: self.currency.clone(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new("UZS")
    }
}

/// Read-only copy of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Current session id.
    pub session_id: Option<SessionId>,
    /// Authoritative session state, as last reported.
    pub session_state: Option<SessionState>,
    /// Controller kiosk state code.
    pub kiosk_state: i64,
    /// Current balance.
    pub balance: f64,
    /// Highest balance since the last reset.
    pub high_water_balance: f64,
    /// Program catalog.
    pub programs: Vec<Program>,
    /// Selected program id.
    pub selected_program: Option<ProgramId>,
    /// Whether a program is running.
    pub running: bool,
    /// Simplified status.
    pub status: DisplayStatus,
    /// Seconds of use left.
    pub time_remaining: u64,
    /// Highest `time_remaining` since the last reset.
    pub max_time: u64,
    /// `time_remaining` as `m:ss`.
    pub time_display: String,
    /// Balance bar fill ratio.
    pub balance_progress: f64,
    /// Time bar fill ratio.
    pub time_progress: f64,
    /// Push connection status.
    pub connection: ConnectionStatus,
    /// Push channel retry counter.
    pub retry_count: u32,
    /// Whether a status fetch has succeeded.
    pub initialized: bool,
    /// Whether any request is in flight.
    pub loading: bool,
    /// Currency label.
    pub currency: String,
}
