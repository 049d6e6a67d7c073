//! Orchestration: read every release from the source, replay each at the
//! destination.

use tracing::{info, warn};

use crate::adapter::{CreateOutcome, ProviderAdapter};
use crate::config::EndpointConfig;
use crate::error::Result;
use crate::progress::{CopyPhase, SyncProgress};
use crate::release::{CopyReport, SortOrder};

/// Copies releases from a source endpoint to a destination endpoint.
pub struct ReleaseCloner {
    source: ProviderAdapter,
    destination: ProviderAdapter,
    progress: SyncProgress,
}

impl ReleaseCloner {
    /// Build both adapters. Fails if either endpoint's configuration cannot
    /// produce one; nothing is fetched yet.
    pub fn new(source: &EndpointConfig, destination: &EndpointConfig) -> Result<Self> {
        Ok(Self {
            source: ProviderAdapter::new(source.provider_config()?)?,
            destination: ProviderAdapter::new(destination.provider_config()?)?,
            progress: SyncProgress::new(),
        })
    }

    /// Attach a progress tracker.
    pub fn with_progress(mut self, progress: SyncProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the copy.
    ///
    /// Fetches the full source list oldest-first, then replays one release
    /// at a time so the destination ends up with the source's original
    /// order. A failure on one release is recorded and does not stop the
    /// sweep; already-created releases are never rolled back.
    pub async fn run(&self) -> Result<CopyReport> {
        let mut report = CopyReport::new();

        info!(
            "Fetching releases from {}",
            self.source.config().repo_url()
        );
        self.progress.set_phase(CopyPhase::FetchingReleases, 0);
        let releases = self.source.fetch_releases(SortOrder::OldestFirst).await?;
        report.releases_found = releases.len();
        info!("Found {} releases", releases.len());

        self.progress
            .set_phase(CopyPhase::CreatingReleases, releases.len() as u64);
        for release in &releases {
            match self.destination.create_release(release).await {
                Ok(CreateOutcome::Created) => {
                    info!("{} {}: Successfully created", release.release_date, release.name);
                    report.add_created(release);
                }
                Ok(CreateOutcome::Rejected(reason)) => {
                    warn!("{} {}: {reason}", release.release_date, release.name);
                    report.add_failed(release, reason);
                }
                Err(e) => {
                    warn!("{} {}: {e}", release.release_date, release.name);
                    report.add_failed(release, e.to_string());
                }
            }
            self.progress.increment(Some(&release.name));
        }

        self.progress.set_phase(CopyPhase::Complete, 1);
        report.complete();
        Ok(report)
    }
}

/// Construct the cloner for both endpoints and run it once.
pub async fn clone_releases(
    source: &EndpointConfig,
    destination: &EndpointConfig,
) -> Result<CopyReport> {
    ReleaseCloner::new(source, destination)?.run().await
}
