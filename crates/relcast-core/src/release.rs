//! Canonical release record and per-run reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Date format every release date is normalized to, regardless of the source
/// provider's native format.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Provider-independent release record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRelease {
    /// Display name. Falls back to the tag when the provider has none.
    pub name: String,

    /// Git tag the release points at.
    pub tag_name: String,

    /// Publication date, always in [`CANONICAL_DATE_FORMAT`].
    pub release_date: String,

    /// Free-text release notes.
    pub description: String,
}

/// Ordering of a fetched release list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Reverse of the provider's native newest-first listing.
    #[default]
    OldestFirst,
    /// As returned by the provider.
    NewestFirst,
}

/// Outcome of replaying one release at the destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyOutcome {
    /// Canonical name of the attempted release.
    pub release_name: String,

    /// Canonical date of the attempted release.
    pub release_date: String,

    /// Whether the destination accepted the release.
    pub success: bool,

    /// "Successfully created", or the reason the destination gave.
    pub message: String,
}

/// Report of a completed copy run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyReport {
    /// Number of releases fetched from the source.
    pub releases_found: usize,

    /// Number of releases the destination accepted.
    pub releases_created: usize,

    /// One record per attempted release, in replay order.
    pub outcomes: Vec<CopyOutcome>,

    /// Start time of the run.
    pub started_at: Option<DateTime<Utc>>,

    /// End time of the run.
    pub completed_at: Option<DateTime<Utc>>,
}

impl CopyReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Record a release the destination accepted.
    pub fn add_created(&mut self, release: &CanonicalRelease) {
        self.releases_created += 1;
        self.outcomes.push(CopyOutcome {
            release_name: release.name.clone(),
            release_date: release.release_date.clone(),
            success: true,
            message: "Successfully created".to_string(),
        });
    }

    /// Record a release the destination rejected, with the provider's reason.
    pub fn add_failed(&mut self, release: &CanonicalRelease, message: impl Into<String>) {
        self.outcomes.push(CopyOutcome {
            release_name: release.name.clone(),
            release_date: release.release_date.clone(),
            success: false,
            message: message.into(),
        });
    }

    /// Number of releases the destination rejected.
    pub fn releases_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    /// Check if every attempted release was created.
    pub fn is_successful(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    /// Get the duration of the run.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Print a summary of the run.
    pub fn print_summary(&self) {
        println!("\n=== Copy Summary ===\n");
        println!("Releases found:    {}", self.releases_found);
        println!("Releases created:  {}", self.releases_created);
        println!("Releases failed:   {}", self.releases_failed());

        let failed: Vec<_> = self.outcomes.iter().filter(|o| !o.success).collect();
        if !failed.is_empty() {
            println!("\nFailures:");
            for outcome in failed {
                println!("  - {}: {}", outcome.release_name, outcome.message);
            }
        }

        if let Some(duration) = self.duration() {
            println!("\nCompleted in {} seconds", duration.num_seconds());
        }

        let status = if self.is_successful() {
            "SUCCESS"
        } else {
            "FAILED"
        };
        println!("\nOverall Status: {status}");
    }
}
