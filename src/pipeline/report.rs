use crate::cache::{FingerprintStatus, SaveSummary};
use crate::common::Error;
use crate::header::Diagnostic;

/// What happened to one artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactOutcome {
    /// Every source was unchanged and both outputs exist.
    Skipped,
    /// The artifact was regenerated.
    Built(BuildSummary),
}

/// Details of a regenerated artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    pub schema: FingerprintStatus,
    pub data: FingerprintStatus,
    /// Rows framed into the data blob
    pub records: usize,
    /// Data cells left out because they failed to parse
    pub invalid_cells: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactReport {
    pub name: String,
    pub outcome: ArtifactOutcome,
}

impl ArtifactReport {
    pub fn built(&self) -> Option<&BuildSummary> {
        match &self.outcome {
            ArtifactOutcome::Built(summary) => Some(summary),
            ArtifactOutcome::Skipped => None,
        }
    }
}

/// Result of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Successful artifacts, in configured order.
    pub artifacts: Vec<ArtifactReport>,
    /// Failed artifacts, each an [`Error::Artifact`].
    pub failures: Vec<Error>,
    /// Set when the cache was saved.
    pub saved: Option<SaveSummary>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ArtifactReport> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    pub fn skipped(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|a| a.outcome == ArtifactOutcome::Skipped)
            .count()
    }

    pub fn built(&self) -> usize {
        self.artifacts.len() - self.skipped()
    }
}
