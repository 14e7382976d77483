//! Run state machine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of a sync run
///
/// `Idle → Connecting → Dumping → Transferring → Restoring → Pruning → Done`.
/// Any of the four pipeline stages may end in `Failed`; `Pruning` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Idle,
    Connecting,
    Dumping,
    Transferring,
    Restoring,
    Pruning,
    Done,
    Failed,
}

impl SyncStage {
    /// The stage that follows this one on the success path
    pub fn next(self) -> SyncStage {
        match self {
            SyncStage::Idle => SyncStage::Connecting,
            SyncStage::Connecting => SyncStage::Dumping,
            SyncStage::Dumping => SyncStage::Transferring,
            SyncStage::Transferring => SyncStage::Restoring,
            SyncStage::Restoring => SyncStage::Pruning,
            SyncStage::Pruning => SyncStage::Done,
            SyncStage::Done => SyncStage::Done,
            SyncStage::Failed => SyncStage::Failed,
        }
    }

    /// Whether an error in this stage aborts the run
    pub fn can_fail(self) -> bool {
        matches!(
            self,
            SyncStage::Connecting
                | SyncStage::Dumping
                | SyncStage::Transferring
                | SyncStage::Restoring
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SyncStage::Done | SyncStage::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncStage::Idle => "idle",
            SyncStage::Connecting => "connecting",
            SyncStage::Dumping => "dumping",
            SyncStage::Transferring => "transferring",
            SyncStage::Restoring => "restoring",
            SyncStage::Pruning => "pruning",
            SyncStage::Done => "done",
            SyncStage::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_reaches_done() {
        let mut stage = SyncStage::Idle;
        let mut visited = vec![stage];
        while !stage.is_terminal() {
            stage = stage.next();
            visited.push(stage);
        }
        assert_eq!(
            visited,
            vec![
                SyncStage::Idle,
                SyncStage::Connecting,
                SyncStage::Dumping,
                SyncStage::Transferring,
                SyncStage::Restoring,
                SyncStage::Pruning,
                SyncStage::Done,
            ]
        );
    }

    #[test]
    fn test_pruning_cannot_fail() {
        assert!(!SyncStage::Pruning.can_fail());
        assert!(!SyncStage::Idle.can_fail());
        assert!(SyncStage::Restoring.can_fail());
    }
}
