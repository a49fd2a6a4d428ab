use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Steps of a restore attempt, in execution order.
///
/// `Idle -> Stopping -> [Snapshotting] -> Extracting -> RestoringConfig ->
/// RestoringVolumes -> Starting -> Done`; any failure after `Idle` ends in
/// `Failed` with the service left stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePhase {
    Idle,
    Stopping,
    Snapshotting,
    Extracting,
    RestoringConfig,
    RestoringVolumes,
    Starting,
    Done,
    Failed,
}

impl RestorePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestorePhase::Idle => "idle",
            RestorePhase::Stopping => "stopping",
            RestorePhase::Snapshotting => "snapshotting",
            RestorePhase::Extracting => "extracting",
            RestorePhase::RestoringConfig => "restoring_config",
            RestorePhase::RestoringVolumes => "restoring_volumes",
            RestorePhase::Starting => "starting",
            RestorePhase::Done => "done",
            RestorePhase::Failed => "failed",
        }
    }
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted record of a restore attempt. Lives next to the archives until the
/// restore reaches `Done`, so a failed attempt can be resumed or rolled back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreJournal {
    pub service: String,
    pub archive: PathBuf,
    pub phase: RestorePhase,
    /// Phases that finished successfully, in order.
    pub completed: Vec<RestorePhase>,
    /// Phase that was running when the attempt failed.
    pub failed_phase: Option<RestorePhase>,
    pub restored_volumes: Vec<String>,
    /// Backup of the stopped service taken before anything was overwritten.
    pub snapshot: Option<PathBuf>,
    pub error: Option<String>,
    pub started_at: String,
    pub updated_at: String,
}

impl RestoreJournal {
    pub fn new(service: &str, archive: PathBuf) -> Self {
        let now = chrono::Local::now().to_rfc3339();
        Self {
            service: service.to_string(),
            archive,
            phase: RestorePhase::Idle,
            completed: Vec::new(),
            failed_phase: None,
            restored_volumes: Vec::new(),
            snapshot: None,
            error: None,
            started_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_completed(&self, phase: RestorePhase) -> bool {
        self.completed.contains(&phase)
    }

    pub fn begin(&mut self, phase: RestorePhase) {
        self.phase = phase;
        self.touch();
    }

    pub fn complete(&mut self, phase: RestorePhase) {
        if !self.completed.contains(&phase) {
            self.completed.push(phase);
        }
        self.touch();
    }

    pub fn fail(&mut self, phase: RestorePhase, error: String) {
        self.failed_phase = Some(phase);
        self.phase = RestorePhase::Failed;
        self.error = Some(error);
        self.touch();
    }

    /// Clears failure state before another attempt.
    pub fn reset_failure(&mut self) {
        self.failed_phase = None;
        self.error = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Local::now().to_rfc3339();
    }
}
