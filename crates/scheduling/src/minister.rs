use serde::{Deserialize, Serialize};

/// Lifecycle status of a minister. Inactive ministers remain in the roster
/// but never receive assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinisterStatus {
    Active,
    Inactive,
}

/// Role within the ministry. Administrators manage the roster and are never
/// scheduled; coordinators serve alongside regular ministers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinisterRole {
    Minister,
    Coordinator,
    Administrator,
}

impl MinisterRole {
    pub fn serves(&self) -> bool {
        !matches!(self, MinisterRole::Administrator)
    }
}

/// Minister data needed by the assignment engine.
///
/// `total_assignments` is the persisted all-time counter used to seed the
/// fairness ranking; the engine returns updated totals for the caller to
/// persist after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Minister {
    pub id: String,
    pub name: String,
    pub role: MinisterRole,
    pub status: MinisterStatus,
    pub total_assignments: u32,
    pub preferred_position: Option<u32>,
}

impl Minister {
    pub fn is_active(&self) -> bool {
        self.status == MinisterStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_administrators_do_not_serve() {
        assert!(MinisterRole::Minister.serves());
        assert!(MinisterRole::Coordinator.serves());
        assert!(!MinisterRole::Administrator.serves());
    }
}
