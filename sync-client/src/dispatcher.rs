//! Action dispatcher: optimistic user commands.
//!
//! Every action follows one template:
//!
//! 1. Check local policy. A violation is rejected before any request and
//!    costs no retry budget.
//! 2. Apply the optimistic mutation to the store.
//! 3. Send the command.
//! 4. On success reset this action's retry counter; on failure warn and
//!    re-send with backoff until the policy runs out, then raise
//!    [`Notice::ActionAbandoned`]. The optimistic state stays; the next
//!    resync corrects any divergence.
//!
//! Each [`ActionKind`] has its own retry counter and timer. Invoking an
//! action manually resets its counter and cancels its pending retry.

use kiosk_sync_core::{ActionKind, Notice, RetryPolicy, Violation};
use kiosk_sync_types::{Command, ProgramId};
use std::sync::Arc;
use std::time::Duration;

use crate::api::ControllerApi;
use crate::engine::Inner;
use crate::fetcher::FetchTrigger;
use crate::push::PushConnector;
use crate::timer::TimerSlot;

/// Result of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The controller accepted the command.
    Confirmed,
    /// Rejected locally; nothing was sent.
    Rejected(Violation),
    /// The command failed; a re-send is scheduled.
    RetryScheduled {
        /// Retry number (1-based).
        attempt: u32,
        /// Delay before it.
        delay: Duration,
    },
    /// The command failed and no retry is left.
    Abandoned,
    /// The engine was shut down; the result was dropped.
    Discarded,
}

/// Retry bookkeeping for one action kind.
#[derive(Debug)]
pub(crate) struct ActionSlot {
    retry: RetryPolicy,
    timer: TimerSlot,
}

impl ActionSlot {
    fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            timer: TimerSlot::default(),
        }
    }

    pub(crate) fn cancel_retry(&mut self) {
        self.timer.cancel();
    }
}

impl<A: ControllerApi, C: PushConnector> Inner<A, C> {
    pub(crate) async fn select_program(self: &Arc<Self>, program_id: ProgramId) -> ActionOutcome {
        if !self.is_live() {
            return ActionOutcome::Discarded;
        }

        let violation = {
            let mut store = self.store.lock().await;
            let violation = if store.program(&program_id).is_none() {
                Some(Violation::UnknownProgram(program_id.clone()))
            } else if store.is_running() {
                match store.selected_program() {
                    Some(active) if *active == program_id => None,
                    Some(active) => Some(Violation::ProgramAlreadyActive {
                        active: active.clone(),
                    }),
                    // Running per the controller, but the selection was never seen here.
                    None => Some(Violation::ProgramRunning),
                }
            } else {
                None
            };
            if violation.is_none() {
                store.select_program(program_id.clone());
                store.set_running(true);
            }
            violation
        };
        if let Some(violation) = violation {
            return self.reject(violation);
        }

        self.run_action(ActionKind::SelectProgram, Command::SelectProgram { program_id })
            .await
    }

    pub(crate) async fn start_program(self: &Arc<Self>) -> ActionOutcome {
        if !self.is_live() {
            return ActionOutcome::Discarded;
        }

        let selected = {
            let mut store = self.store.lock().await;
            let selected = store.selected_program().cloned();
            if selected.is_some() {
                store.set_running(true);
            }
            selected
        };
        let Some(program_id) = selected else {
            return self.reject(Violation::NoProgramSelected);
        };

        // The controller has no separate start endpoint; selecting starts.
        self.run_action(ActionKind::StartProgram, Command::SelectProgram { program_id })
            .await
    }

    pub(crate) async fn pause_program(self: &Arc<Self>) -> ActionOutcome {
        if !self.is_live() {
            return ActionOutcome::Discarded;
        }
        self.store.lock().await.set_running(false);
        self.run_action(ActionKind::PauseProgram, Command::Pause).await
    }

    pub(crate) async fn finish_session(self: &Arc<Self>) -> ActionOutcome {
        if !self.is_live() {
            return ActionOutcome::Discarded;
        }
        self.store.lock().await.reset_session();
        self.run_action(ActionKind::FinishSession, Command::Finish).await
    }

    pub(crate) async fn credit_loyalty(self: &Arc<Self>, card_id: &str) -> ActionOutcome {
        if !self.is_live() {
            return ActionOutcome::Discarded;
        }
        let card_id = card_id.trim();
        if card_id.is_empty() {
            return self.reject(Violation::MissingCardId);
        }
        let command = Command::CreditLoyalty {
            card_id: card_id.to_string(),
        };
        self.run_action(ActionKind::CreditLoyalty, command).await
    }

    pub(crate) async fn decline_credit(self: &Arc<Self>) -> ActionOutcome {
        if !self.is_live() {
            return ActionOutcome::Discarded;
        }
        self.run_action(ActionKind::DeclineCredit, Command::DeclineCredit)
            .await
    }

    fn reject(&self, violation: Violation) -> ActionOutcome {
        tracing::info!("Rejected locally: {}", violation);
        self.notify(Notice::PolicyViolation(violation.clone()));
        ActionOutcome::Rejected(violation)
    }

    /// Fresh invocation: reset this action's retries, then send.
    pub(crate) async fn run_action(self: &Arc<Self>, kind: ActionKind, command: Command) -> ActionOutcome {
        if !self.is_live() {
            return ActionOutcome::Discarded;
        }
        {
            let mut actions = self.actions.lock().await;
            let slot = actions
                .entry(kind)
                .or_insert_with(|| ActionSlot::new(self.config.retry_policy()));
            slot.retry.reset();
            slot.timer.cancel();
        }
        self.send_command(kind, command).await
    }

    async fn send_command(self: &Arc<Self>, kind: ActionKind, command: Command) -> ActionOutcome {
        tracing::debug!("Sending {}", command);
        self.store.lock().await.begin_request();
        let result = self.api.send(&command).await;

        if !self.is_live() {
            tracing::debug!("Discarding {} result that arrived after shutdown", kind);
            return ActionOutcome::Discarded;
        }
        self.store.lock().await.end_request();

        match result {
            Ok(()) => {
                if let Some(slot) = self.actions.lock().await.get_mut(&kind) {
                    slot.retry.reset();
                }
                self.on_confirmed(kind).await;
                ActionOutcome::Confirmed
            }
            Err(error) => {
                tracing::warn!("Could not {}: {}", kind, error);
                let mut actions = self.actions.lock().await;
                let slot = actions
                    .entry(kind)
                    .or_insert_with(|| ActionSlot::new(self.config.retry_policy()));
                match slot.retry.next_delay() {
                    Some(delay) => {
                        let attempt = slot.retry.attempt();
                        self.schedule_action_retry(&mut slot.timer, kind, command, delay);
                        drop(actions);
                        self.notify(Notice::ActionFailed { action: kind });
                        ActionOutcome::RetryScheduled { attempt, delay }
                    }
                    None => {
                        drop(actions);
                        self.notify(Notice::ActionAbandoned { action: kind });
                        ActionOutcome::Abandoned
                    }
                }
            }
        }
    }

    async fn on_confirmed(self: &Arc<Self>, kind: ActionKind) {
        match kind {
            // Finished must read as finished even if pushes raced the request.
            ActionKind::FinishSession => self.store.lock().await.reset_session(),
            ActionKind::StartSession => self.spawn_fetch(FetchTrigger::Resync),
            _ => {}
        }
    }

    fn schedule_action_retry(
        self: &Arc<Self>,
        timer: &mut TimerSlot,
        kind: ActionKind,
        command: Command,
        delay: Duration,
    ) {
        let inner = Arc::clone(self);
        timer.schedule(delay, move |generation| async move {
            let claimed = match inner.actions.lock().await.get_mut(&kind) {
                Some(slot) => slot.timer.claim(generation),
                None => false,
            };
            if claimed && inner.is_live() {
                tracing::info!("Retrying {}", kind);
                inner.send_command(kind, command).await;
            }
        });
    }
}
