// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Network API
//!
//! Holds networks and actions in process. Mutations are applied immediately
//! when their planned outcome is success; the returned action then reports
//! `running` for a configurable number of polls before turning terminal.
//!
//! Failures can be injected per [`Operation`] to exercise conflict, lock and
//! detach-in-progress handling.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::IpAddr;
use tracing::debug;

use super::{Action, ActionError, ActionResource, ActionStatus, NetworkApi};
use crate::domain::{IpRange, Network, Subnet, SubnetSpec};
use crate::errors::{ApiError, ApiErrorCode, ApiResult};

/// API operation, for failure injection and call accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetNetwork,
    AddSubnet,
    DeleteSubnet,
    GetAction,
}

/// Terminal outcome of a planned action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Error { code: String, message: String },
    /// The action disappears instead of finishing
    Vanish,
}

/// How the next action created by a mutation behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    /// Number of polls that still report `running`
    pub running_polls: u32,
    pub outcome: ActionOutcome,
}

impl ActionPlan {
    pub fn success_after(running_polls: u32) -> Self {
        Self {
            running_polls,
            outcome: ActionOutcome::Success,
        }
    }

    pub fn error_after(running_polls: u32, code: &str, message: &str) -> Self {
        Self {
            running_polls,
            outcome: ActionOutcome::Error {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// Action that never finishes
    pub fn stalled() -> Self {
        Self::success_after(u32::MAX)
    }
}

impl Default for ActionPlan {
    fn default() -> Self {
        Self::success_after(1)
    }
}

struct TrackedAction {
    action: Action,
    plan: ActionPlan,
}

#[derive(Default)]
struct MemoryState {
    networks: BTreeMap<u64, Network>,
    actions: HashMap<u64, TrackedAction>,
    next_action_id: u64,
    failures: HashMap<Operation, VecDeque<ApiError>>,
    plans: VecDeque<ActionPlan>,
    calls: HashMap<Operation, usize>,
}

impl MemoryState {
    fn enter(&mut self, operation: Operation) -> ApiResult<()> {
        *self.calls.entry(operation).or_default() += 1;
        match self.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(err) => {
                debug!("Injected failure for {:?}: {}", operation, err);
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn start_action(&mut self, command: &str, network_id: u64) -> (Action, bool) {
        self.next_action_id += 1;
        let plan = self.plans.pop_front().unwrap_or_default();
        let mut action = Action {
            id: self.next_action_id,
            command: command.to_string(),
            status: ActionStatus::Running,
            progress: 0,
            started: Some(Utc::now()),
            finished: None,
            resources: vec![ActionResource {
                id: network_id,
                resource_type: "network".to_string(),
            }],
            error: None,
        };
        let applies = plan.outcome == ActionOutcome::Success;
        if plan.running_polls == 0 {
            finish(&mut action, &plan.outcome);
        }
        self.actions.insert(
            action.id,
            TrackedAction {
                action: action.clone(),
                plan,
            },
        );
        (action, applies)
    }
}

fn finish(action: &mut Action, outcome: &ActionOutcome) {
    action.progress = 100;
    action.finished = Some(Utc::now());
    match outcome {
        ActionOutcome::Error { code, message } => {
            action.status = ActionStatus::Error;
            action.error = Some(ActionError {
                code: code.clone(),
                message: message.clone(),
            });
        }
        ActionOutcome::Success | ActionOutcome::Vanish => action.status = ActionStatus::Success,
    }
}

fn first_host(range: &IpRange) -> Option<IpAddr> {
    match range.network_address() {
        IpAddr::V4(addr) => u32::from(addr)
            .checked_add(1)
            .map(|a| IpAddr::V4(a.into())),
        IpAddr::V6(addr) => u128::from(addr)
            .checked_add(1)
            .map(|a| IpAddr::V6(a.into())),
    }
}

/// In-process [`NetworkApi`] implementation
#[derive(Default)]
pub struct InMemoryNetworkApi {
    state: Mutex<MemoryState>,
}

impl InMemoryNetworkApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style network insertion
    pub fn with_network(self, network: Network) -> Self {
        self.insert_network(network);
        self
    }

    pub fn insert_network(&self, network: Network) {
        self.state.lock().networks.insert(network.id, network);
    }

    pub fn remove_network(&self, id: u64) -> Option<Network> {
        self.state.lock().networks.remove(&id)
    }

    /// Snapshot of a stored network
    pub fn network(&self, id: u64) -> Option<Network> {
        self.state.lock().networks.get(&id).cloned()
    }

    /// Queue an error for the next call of `operation`
    pub fn fail_next(&self, operation: Operation, error: ApiError) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Queue the same error for the next `times` calls of `operation`
    pub fn fail_times(&self, operation: Operation, times: usize, error: ApiError) {
        for _ in 0..times {
            self.fail_next(operation, error.clone());
        }
    }

    /// Plan the behaviour of the next action a mutation creates
    pub fn plan_next_action(&self, plan: ActionPlan) {
        self.state.lock().plans.push_back(plan);
    }

    /// Register a free-standing action, e.g. one created by another actor
    pub fn track_action(&self, action: Action, plan: ActionPlan) {
        let mut state = self.state.lock();
        state.next_action_id = state.next_action_id.max(action.id);
        state
            .actions
            .insert(action.id, TrackedAction { action, plan });
    }

    /// Number of calls made to `operation`
    pub fn calls(&self, operation: Operation) -> usize {
        self.state.lock().calls.get(&operation).copied().unwrap_or(0)
    }
}

#[async_trait]
impl NetworkApi for InMemoryNetworkApi {
    async fn get_network(&self, id: u64) -> ApiResult<Option<Network>> {
        let mut state = self.state.lock();
        state.enter(Operation::GetNetwork)?;
        Ok(state.networks.get(&id).cloned())
    }

    async fn add_subnet(&self, spec: &SubnetSpec) -> ApiResult<Action> {
        let mut state = self.state.lock();
        state.enter(Operation::AddSubnet)?;

        let network = state.networks.get(&spec.network_id).ok_or_else(|| {
            ApiError::new(
                ApiErrorCode::NotFound,
                format!("network {} not found", spec.network_id),
            )
        })?;
        if network.find_subnet(&spec.ip_range).is_some() {
            return Err(ApiError::new(
                ApiErrorCode::UniquenessError,
                format!("ip_range {} already in use", spec.ip_range),
            ));
        }

        let (action, applies) = state.start_action("add_subnet", spec.network_id);
        if applies {
            let subnet = Subnet {
                subnet_type: spec.kind.subnet_type(),
                ip_range: spec.ip_range,
                network_zone: spec.network_zone.clone(),
                gateway: first_host(&spec.ip_range),
                vswitch_id: spec.kind.vswitch_id(),
            };
            if let Some(network) = state.networks.get_mut(&spec.network_id) {
                network.subnets.push(subnet);
            }
        }
        Ok(action)
    }

    async fn delete_subnet(&self, network_id: u64, ip_range: &IpRange) -> ApiResult<Action> {
        let mut state = self.state.lock();
        state.enter(Operation::DeleteSubnet)?;

        let exists = state
            .networks
            .get(&network_id)
            .and_then(|network| network.find_subnet(ip_range))
            .is_some();
        if !exists {
            return Err(ApiError::new(
                ApiErrorCode::NotFound,
                format!("subnet {} not found in network {}", ip_range, network_id),
            ));
        }

        let (action, applies) = state.start_action("delete_subnet", network_id);
        if applies {
            if let Some(network) = state.networks.get_mut(&network_id) {
                network
                    .subnets
                    .retain(|subnet| !subnet.ip_range.same_range(ip_range));
            }
        }
        Ok(action)
    }

    async fn get_action(&self, id: u64) -> ApiResult<Option<Action>> {
        let mut state = self.state.lock();
        state.enter(Operation::GetAction)?;

        let Some(tracked) = state.actions.get_mut(&id) else {
            return Ok(None);
        };
        if tracked.action.status.is_terminal() {
            return Ok(Some(tracked.action.clone()));
        }
        if tracked.plan.running_polls > 0 {
            tracked.plan.running_polls -= 1;
        }
        if tracked.plan.running_polls > 0 {
            tracked.action.progress = tracked.action.progress.saturating_add(10).min(99);
            return Ok(Some(tracked.action.clone()));
        }
        if tracked.plan.outcome == ActionOutcome::Vanish {
            state.actions.remove(&id);
            return Ok(None);
        }
        let outcome = tracked.plan.outcome.clone();
        finish(&mut tracked.action, &outcome);
        Ok(Some(tracked.action.clone()))
    }
}
