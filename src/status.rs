use std::fmt;

use serde::Serialize;

/// The lifecycle stage of a tracked operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No operation has been run since creation or the last reset
    #[default]
    Idle,
    /// An operation was started and has not settled yet
    Pending,
    /// The last operation produced a value
    Resolved,
    /// The last operation failed
    Rejected,
}

impl Status {
    pub fn is_idle(&self) -> bool {
        matches!(self, Status::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Status::Resolved)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Status::Rejected)
    }

    /// Returns true if the status is the outcome of a settled operation
    pub fn is_settled(&self) -> bool {
        matches!(self, Status::Resolved | Status::Rejected)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Pending => "pending",
            Status::Resolved => "resolved",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
