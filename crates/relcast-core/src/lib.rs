//! # Relcast Core
//!
//! This crate copies release metadata (name, tag, date, description) from one
//! hosted git provider's repository to another, normalizing field names and
//! date formats across providers.
//!
//! ## Features
//!
//! - **Provider adapters**: GitHub and GitLab release APIs behind one
//!   canonical interface, with per-provider URL shapes, field names, date
//!   formats, and error paths held as data
//! - **Pagination**: full release lists fetched 100 items per page
//! - **Replay**: oldest-first re-creation at the destination with per-item
//!   outcome reporting
//! - **Progress Tracking**: phase and per-item progress callbacks
//!
//! ## Example
//!
//! ```rust,ignore
//! use relcast_core::{clone_releases, EndpointConfig, ProviderKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = EndpointConfig::new(ProviderKind::GitHub, "https://github.com/ns/repo");
//!     let destination = EndpointConfig::new(ProviderKind::GitLab, "https://gitlab.com/ns/repo")
//!         .with_token("glpat-xxx");
//!
//!     let report = clone_releases(&source, &destination).await?;
//!     report.print_summary();
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod progress;
pub mod provider;
pub mod release;
pub mod sync;

// Re-export main types
pub use adapter::{CreateOutcome, ProviderAdapter};
pub use config::{CloneConfig, EndpointConfig};
pub use error::{Result, SyncError};
pub use progress::{ConsoleProgressReporter, CopyPhase, ProgressCallback, SyncProgress};
pub use provider::{ProviderConfig, ProviderKind};
pub use release::{
    CanonicalRelease, CopyOutcome, CopyReport, SortOrder, CANONICAL_DATE_FORMAT,
};
pub use sync::{clone_releases, ReleaseCloner};

/// Version of the release copier.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
