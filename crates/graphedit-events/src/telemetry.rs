use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};
use uuid::Uuid;

const TELEMETRY_TARGET: &str = "graphedit::events::telemetry";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DispatchLifecycle {
    Queued,
    Start,
    Success,
    Failure,
}

impl fmt::Display for DispatchLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "action_queued"),
            Self::Start => write!(f, "action_start"),
            Self::Success => write!(f, "action_success"),
            Self::Failure => write!(f, "action_failure"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchTelemetry {
    pub correlation_id: String,
    pub action: String,
    pub lifecycle: DispatchLifecycle,
    pub error_reason: Option<String>,
    pub duration_us: Option<u128>,
}

impl DispatchTelemetry {
    fn new(action: &str, correlation_id: &str, lifecycle: DispatchLifecycle) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            action: action.to_string(),
            lifecycle,
            error_reason: None,
            duration_us: None,
        }
    }

    fn now_unix_ms() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn action_queued(action: &str, correlation_id: &str, pending: usize) -> DispatchTelemetry {
    let telemetry = DispatchTelemetry::new(action, correlation_id, DispatchLifecycle::Queued);
    debug!(
        target: TELEMETRY_TARGET,
        action = %telemetry.action,
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        pending,
        "action_queued"
    );
    telemetry
}

pub fn action_start(action: &str, correlation_id: &str) -> DispatchTelemetry {
    let telemetry = DispatchTelemetry::new(action, correlation_id, DispatchLifecycle::Start);
    debug!(
        target: TELEMETRY_TARGET,
        action = %telemetry.action,
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        timestamp_ms = DispatchTelemetry::now_unix_ms(),
        "action_start"
    );
    telemetry
}

pub fn action_success(
    action: &str,
    correlation_id: &str,
    duration_us: Option<u128>,
) -> DispatchTelemetry {
    let mut telemetry = DispatchTelemetry::new(action, correlation_id, DispatchLifecycle::Success);
    telemetry.duration_us = duration_us;
    info!(
        target: TELEMETRY_TARGET,
        action = %telemetry.action,
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        duration_us = ?telemetry.duration_us,
        "action_success"
    );
    telemetry
}

pub fn action_failure(action: &str, correlation_id: &str, reason: Option<String>) -> DispatchTelemetry {
    let mut telemetry = DispatchTelemetry::new(action, correlation_id, DispatchLifecycle::Failure);
    telemetry.error_reason = reason;
    let error_reason = telemetry.error_reason.as_deref().unwrap_or("unclassified");

    error!(
        target: TELEMETRY_TARGET,
        action = %telemetry.action,
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        error = %error_reason,
        timestamp_ms = DispatchTelemetry::now_unix_ms(),
        "action_failure"
    );

    telemetry
}

/// Guard that did not hold; the action becomes a no-op.
pub fn precondition_skipped(action: &str, correlation_id: &str, reason: &str) {
    debug!(
        target: TELEMETRY_TARGET,
        action = %action,
        correlation_id = %correlation_id,
        reason = %reason,
        "action_skipped"
    );
}
