//! Command implementations.

use anyhow::{bail, Context};
use console::style;
use relcast_core::{
    CloneConfig, ConsoleProgressReporter, EndpointConfig, ProviderAdapter, ProviderKind,
    ReleaseCloner, SortOrder, SyncProgress,
};
use tracing::debug;

use crate::{CopyArgs, ReleasesArgs};

/// Token environment variables, applied when an endpoint carries no auth
/// header of its own.
const SOURCE_TOKEN_ENV: &str = "RELCAST_SOURCE_TOKEN";
const DEST_TOKEN_ENV: &str = "RELCAST_DEST_TOKEN";

/// Copy all releases from the source endpoint to the destination endpoint.
///
/// Exit code 0 when every release was created, 2 when the run completed but
/// at least one release was rejected. Fatal errors bubble up to the caller.
pub async fn copy(args: CopyArgs) -> anyhow::Result<i32> {
    let config = resolve_config(&args)?;
    debug!(
        "Copying releases from {} to {}",
        config.source.url, config.destination.url
    );

    let reporter = ConsoleProgressReporter::new();
    let cloner = ReleaseCloner::new(&config.source, &config.destination)?
        .with_progress(SyncProgress::with_callback(reporter.callback()));
    let report = cloner.run().await?;
    reporter.finish("done");

    for outcome in &report.outcomes {
        let mark = if outcome.success {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "{mark} {} {}: {}",
            outcome.release_date, outcome.release_name, outcome.message
        );
    }
    report.print_summary();

    Ok(if report.is_successful() { 0 } else { 2 })
}

/// List one endpoint's releases in canonical form.
pub async fn releases(args: ReleasesArgs) -> anyhow::Result<i32> {
    let endpoint = apply_env_token(
        build_endpoint(args.provider, args.url, &args.headers)?,
        SOURCE_TOKEN_ENV,
    );
    let adapter = ProviderAdapter::new(endpoint.provider_config()?)?;

    let order = if args.newest_first {
        SortOrder::NewestFirst
    } else {
        SortOrder::OldestFirst
    };
    let releases = adapter.fetch_releases(order).await?;

    for release in &releases {
        println!(
            "{} {} ({})",
            release.release_date, release.name, release.tag_name
        );
    }
    Ok(0)
}

fn resolve_config(args: &CopyArgs) -> anyhow::Result<CloneConfig> {
    let config = if let Some(path) = &args.config {
        CloneConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        let (Some(source_provider), Some(source_url)) =
            (args.source_provider, args.source_url.clone())
        else {
            bail!("Either --config or --source-provider and --source-url must be given");
        };
        let (Some(dest_provider), Some(dest_url)) = (args.dest_provider, args.dest_url.clone())
        else {
            bail!("Either --config or --dest-provider and --dest-url must be given");
        };

        CloneConfig {
            source: build_endpoint(source_provider, source_url, &args.source_headers)?,
            destination: build_endpoint(dest_provider, dest_url, &args.dest_headers)?,
        }
    };

    Ok(CloneConfig {
        source: apply_env_token(config.source, SOURCE_TOKEN_ENV),
        destination: apply_env_token(config.destination, DEST_TOKEN_ENV),
    })
}

fn build_endpoint(
    provider: ProviderKind,
    url: String,
    raw_headers: &[String],
) -> anyhow::Result<EndpointConfig> {
    let mut endpoint = EndpointConfig::new(provider, url);
    for raw in raw_headers {
        let (name, value) = parse_header(raw)?;
        endpoint = endpoint.with_header(name, value);
    }
    Ok(endpoint)
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("Invalid header {raw:?}, expected \"Name: value\"");
    };
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn apply_env_token(endpoint: EndpointConfig, var: &str) -> EndpointConfig {
    let (auth_header, _) = endpoint.provider.token_header("");
    let has_auth = endpoint
        .headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case(&auth_header));

    match std::env::var(var) {
        Ok(token) if !has_auth && !token.is_empty() => endpoint.with_token(&token),
        _ => endpoint,
    }
}
