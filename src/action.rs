// Copyright (c) 2025 - Cowboy AI, Inc.
//! Action Completion Waiter
//!
//! Every mutation returns an [`Action`]. The network stays locked until that
//! action resolves, so a mutation is complete only once the action has been
//! polled to a terminal status.
//!
//! ```text
//! running ──poll──▶ running ──poll──▶ success  → Ok(())
//!                                  └─▶ error    → ActionFailed
//!                   (gone)                      → Unknown
//!   deadline or cancellation while polling      → Cancelled
//! ```

use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{Action, ActionStatus, NetworkApi};
use crate::errors::{SubnetError, SubnetResult};

/// Configuration for action polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between polls
    pub poll_interval: Duration,
    /// Budget for the whole wait, measured from its start
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Polls actions until they reach a terminal status
pub struct ActionWaiter<'a> {
    api: &'a dyn NetworkApi,
    config: WaitConfig,
}

impl<'a> ActionWaiter<'a> {
    pub fn new(api: &'a dyn NetworkApi, config: WaitConfig) -> Self {
        Self { api, config }
    }

    /// Block until `action` finishes
    ///
    /// `subject` names what the action works on and is used for diagnostics.
    pub async fn wait_for_completion(
        &self,
        action: &Action,
        subject: &str,
        cancel: &CancellationToken,
    ) -> SubnetResult<()> {
        // A timeout past the clock's range means no deadline at all.
        let deadline = Instant::now().checked_add(self.config.timeout);
        let mut current = action.clone();
        let mut polls = 0u32;

        loop {
            match current.status {
                ActionStatus::Success => {
                    debug!(
                        "Action {} ({}) on {} succeeded after {} poll(s)",
                        current.id, current.command, subject, polls
                    );
                    return Ok(());
                }
                ActionStatus::Error => {
                    let (code, message) = current
                        .error
                        .map(|e| (e.code, e.message))
                        .unwrap_or_else(|| ("unknown".to_string(), "action failed".to_string()));
                    warn!(
                        "Action {} ({}) on {} failed: {} ({})",
                        current.id, current.command, subject, message, code
                    );
                    return Err(SubnetError::ActionFailed {
                        action_id: current.id,
                        command: current.command,
                        code,
                        message,
                    });
                }
                ActionStatus::Running => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(&current, subject, "cancelled")),
                _ = deadline_reached(deadline) => return Err(self.cancelled(&current, subject, "timed out")),
                _ = sleep(self.config.poll_interval) => {}
            }

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(&current, subject, "cancelled")),
                _ = deadline_reached(deadline) => return Err(self.cancelled(&current, subject, "timed out")),
                polled = self.api.get_action(current.id) => polled?,
            };
            polls += 1;

            current = match polled {
                Some(next) => next,
                None => {
                    warn!(
                        "Action {} ({}) on {} disappeared while running",
                        current.id, current.command, subject
                    );
                    return Err(SubnetError::Unknown(format!(
                        "action {} ({}) on {} disappeared while running",
                        current.id, current.command, subject
                    )));
                }
            };
            debug!(
                "Action {} on {}: {} ({}%)",
                current.id, subject, current.status, current.progress
            );
        }
    }

    fn cancelled(&self, action: &Action, subject: &str, why: &str) -> SubnetError {
        warn!(
            "Stopped waiting for action {} ({}) on {}: {}",
            action.id, action.command, subject, why
        );
        SubnetError::Cancelled(format!(
            "waiting for action {} ({}) on {} {}",
            action.id, action.command, subject, why
        ))
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ActionError, ActionOutcome, ActionPlan, InMemoryNetworkApi, Operation};

    fn running(id: u64) -> Action {
        Action {
            id,
            command: "add_subnet".to_string(),
            status: ActionStatus::Running,
            progress: 0,
            started: None,
            finished: None,
            resources: vec![],
            error: None,
        }
    }

    fn waiter(api: &InMemoryNetworkApi) -> ActionWaiter<'_> {
        ActionWaiter::new(
            api,
            WaitConfig {
                poll_interval: Duration::from_millis(100),
                timeout: Duration::from_secs(10),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_action_needs_no_poll() {
        let api = InMemoryNetworkApi::new();
        let mut action = running(1);
        action.status = ActionStatus::Success;

        let result = waiter(&api)
            .wait_for_completion(&action, "network 1", &CancellationToken::new())
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(api.calls(Operation::GetAction), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_success() {
        let api = InMemoryNetworkApi::new();
        api.track_action(running(7), ActionPlan::success_after(3));

        let result = waiter(&api)
            .wait_for_completion(&running(7), "network 1", &CancellationToken::new())
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(api.calls(Operation::GetAction), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_is_action_failed() {
        let api = InMemoryNetworkApi::new();
        api.track_action(
            running(7),
            ActionPlan::error_after(1, "service_error", "subnet could not be added"),
        );

        let result = waiter(&api)
            .wait_for_completion(&running(7), "network 1", &CancellationToken::new())
            .await;

        assert_eq!(
            result,
            Err(SubnetError::ActionFailed {
                action_id: 7,
                command: "add_subnet".to_string(),
                code: "service_error".to_string(),
                message: "subnet could not be added".to_string(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_error_uses_attached_error() {
        let api = InMemoryNetworkApi::new();
        let mut action = running(3);
        action.status = ActionStatus::Error;
        action.error = Some(ActionError {
            code: "invalid_input".to_string(),
            message: "bad".to_string(),
        });

        let result = waiter(&api)
            .wait_for_completion(&action, "network 1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SubnetError::ActionFailed { action_id: 3, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disappearing_action_is_unknown() {
        let api = InMemoryNetworkApi::new();
        api.track_action(
            running(7),
            ActionPlan {
                running_polls: 2,
                outcome: ActionOutcome::Vanish,
            },
        );

        let result = waiter(&api)
            .wait_for_completion(&running(7), "network 1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SubnetError::Unknown(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_while_polling() {
        let api = InMemoryNetworkApi::new();
        api.track_action(running(7), ActionPlan::stalled());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(350)).await;
            trigger.cancel();
        });

        let result = waiter(&api)
            .wait_for_completion(&running(7), "network 1", &cancel)
            .await;

        assert!(matches!(result, Err(SubnetError::Cancelled(_))));
        assert!(api.calls(Operation::GetAction) <= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_while_polling() {
        let api = InMemoryNetworkApi::new();
        api.track_action(running(7), ActionPlan::stalled());

        let result = waiter(&api)
            .wait_for_completion(&running(7), "network 1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SubnetError::Cancelled(msg)) if msg.contains("timed out")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_still_completes() {
        let api = InMemoryNetworkApi::new();
        api.track_action(running(7), ActionPlan::success_after(2));
        let waiter = ActionWaiter::new(
            &api,
            WaitConfig {
                poll_interval: Duration::from_millis(100),
                timeout: Duration::from_secs(u64::MAX),
            },
        );

        let result = waiter
            .wait_for_completion(&running(7), "network 1", &CancellationToken::new())
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(api.calls(Operation::GetAction), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_propagates() {
        let api = InMemoryNetworkApi::new();
        api.track_action(running(7), ActionPlan::success_after(2));
        api.fail_next(
            Operation::GetAction,
            crate::errors::ApiError::new(crate::errors::ApiErrorCode::Transport, "reset"),
        );

        let result = waiter(&api)
            .wait_for_completion(&running(7), "network 1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SubnetError::Unknown(_))));
    }
}
