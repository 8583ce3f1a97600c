// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers.
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (the broker only has `Ready`)
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the status last changed
//!
//! # Example
//!
//! ```rust
//! use catalogsync::reconcilers::status::ReadyConditionBuilder;
//!
//! let condition = ReadyConditionBuilder::new().ready().build();
//! assert_eq!(condition.status, "True");
//! assert_eq!(condition.reason.as_deref(), Some("Ready"));
//! ```

use crate::crd::Condition;
use crate::status_reasons::{
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY, REASON_READY,
    REASON_UNKNOWN,
};
use chrono::{SecondsFormat, Utc};
use std::fmt::Display;

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Create a new condition stamped with the current time.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(now()),
    }
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Insert or replace a condition in place, by type.
///
/// The existing `lastTransitionTime` is kept when the status value does not change,
/// so a broker that keeps failing for the same reason does not look like it flaps.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) => {
            if existing.status == condition.status && existing.last_transition_time.is_some() {
                condition
                    .last_transition_time
                    .clone_from(&existing.last_transition_time);
            }
            *existing = condition;
        }
        None => conditions.push(condition),
    }
}

/// Builder for the broker's terminal `Ready` condition.
///
/// Starts as `False`/`Unknown` with no message. The reconciler sets the reason
/// from the failure it hit, attaches the error, or marks the broker ready:
///
/// ```rust
/// use catalogsync::reconcilers::status::ReadyConditionBuilder;
///
/// let err = std::io::Error::other("broker unreachable");
/// let condition = ReadyConditionBuilder::new()
///     .with_reason("GetCatalogFailed")
///     .with_error(Some(&err))
///     .build();
///
/// assert_eq!(condition.status, "False");
/// assert_eq!(condition.message.as_deref(), Some("broker unreachable"));
/// ```
#[derive(Debug, Clone)]
pub struct ReadyConditionBuilder {
    status: &'static str,
    reason: String,
    message: String,
}

impl Default for ReadyConditionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadyConditionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: CONDITION_STATUS_FALSE,
            reason: REASON_UNKNOWN.to_string(),
            message: String::new(),
        }
    }

    /// Set the reason.
    #[must_use]
    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }

    /// Mark the condition `True` with reason `Ready`.
    #[must_use]
    pub fn ready(mut self) -> Self {
        self.status = CONDITION_STATUS_TRUE;
        self.reason = REASON_READY.to_string();
        self
    }

    /// Attach an error. Any error forces the status to `False`.
    #[must_use]
    pub fn with_error(mut self, error: Option<&dyn Display>) -> Self {
        if let Some(err) = error {
            self.status = CONDITION_STATUS_FALSE;
            self.message = err.to_string();
        }
        self
    }

    /// Build the condition, stamped with the current time.
    #[must_use]
    pub fn build(&self) -> Condition {
        create_condition(CONDITION_TYPE_READY, self.status, &self.reason, &self.message)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
