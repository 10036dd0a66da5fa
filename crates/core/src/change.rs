//! Change-review vocabulary: the kind of a proposed mutation, its review
//! status, and the decision applied to it.
//!
//! Status transitions are one-way: `Pending` is the only non-terminal
//! state, and a change leaves it exactly once.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Change kind
// ---------------------------------------------------------------------------

/// The kind of registry mutation a pending change proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
}

impl ChangeKind {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }

    /// Parse the stored string form.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "add" => Ok(Self::Add),
            "modify" => Ok(Self::Modify),
            "delete" => Ok(Self::Delete),
            other => Err(CoreError::Validation(format!(
                "Invalid change kind '{other}'. Must be one of: add, modify, delete"
            ))),
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Change status
// ---------------------------------------------------------------------------

/// Review status of a pending change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Pending,
    Approved,
    Rejected,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and Rejected are terminal; nothing transitions out of them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The decision an administrator applies to a batch of pending changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// The terminal status this decision moves a pending change into.
    pub fn resulting_status(&self) -> ChangeStatus {
        match self {
            Self::Approve => ChangeStatus::Approved,
            Self::Reject => ChangeStatus::Rejected,
        }
    }

    /// Only approvals touch the registry and the audit trail.
    pub fn applies_to_registry(&self) -> bool {
        matches!(self, Self::Approve)
    }
}

/// Validate that the deciding actor is the configured administrator.
///
/// The administrator identity is an explicit collaborator passed in by the
/// caller; the review pipeline never reads it from ambient state. Failure
/// names the required identity so clients can render an unauthorized state.
pub fn authorize_decision(actor: &str, admin_user: &str) -> Result<(), CoreError> {
    if actor == admin_user {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Only {admin_user} can approve or reject pending changes"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
