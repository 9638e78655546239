//! # mati
//!
//! Thin caller around `libmati`: loads the configuration, polls the selected
//! providers one after another and writes a JSON report.
//!
//! ```sh
//! mati -c libmati.yaml -o report.json
//! ```

use chrono::Local;
use clap::Parser;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use libmati::cli::Cli;
use libmati::models::{FetchReport, ProviderReport};
use libmati::outputs::json::write_report;
use libmati::{ContentProvider, Error, YamlConfig, build_all};
use serde_yaml::Value;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("mati starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.providers, "Parsed CLI arguments");

    let mut config = YamlConfig::new(Some(args.config.clone()));
    config.load().await?;

    let entries = select_entries(&config, &args.providers)?;
    info!(count = entries.len(), "Selected providers");

    let providers = match &args.single {
        Some(_) if entries.len() != 1 => {
            return Err(Error::Config("--single needs exactly one --provider".to_string()).into());
        }
        Some(_) | None => build_all(entries)?,
    };

    let reports: Vec<ProviderReport> = match &args.single {
        Some(url) => vec![poll_single(providers[0].as_ref(), url).await],
        None => {
            stream::iter(providers.iter())
                .then(|p| poll(p.as_ref()))
                .collect()
                .await
        }
    };

    let now = Local::now();
    let report = FetchReport {
        local_date: now.date_naive().to_string(),
        local_time: now.time().to_string(),
        providers: reports,
    };

    let by_type = report
        .providers
        .iter()
        .flat_map(|p| p.items.iter())
        .counts_by(|c| c.mimetype.clone().unwrap_or_else(|| "unknown".to_string()));
    for (mimetype, count) in by_type.iter().sorted() {
        info!(%mimetype, count, "Collected items by type");
    }

    write_report(&report, args.output.as_deref()).await?;

    let failed = report.providers.iter().filter(|p| p.error.is_some()).count();
    info!(
        items = report.item_count(),
        providers = report.providers.len(),
        failed,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "mati finished"
    );
    Ok(())
}

/// Configured providers, narrowed to `wanted` when it is non-empty.
fn select_entries(config: &YamlConfig, wanted: &[String]) -> libmati::Result<Vec<(String, Value)>> {
    if wanted.is_empty() {
        return Ok(config.providers());
    }

    wanted
        .iter()
        .map(|id| {
            config
                .provider(id)
                .map(|entry| (id.clone(), entry))
                .ok_or_else(|| Error::Config(format!("Provider {id} is not configured")))
        })
        .collect()
}

#[instrument(level = "info", skip_all, fields(provider_id = %provider.provider_id()))]
async fn poll(provider: &dyn ContentProvider) -> ProviderReport {
    match provider.get_all().await {
        Ok(items) => {
            info!(count = items.len(), "Provider returned items");
            report_for(provider, items, None)
        }
        Err(e) => {
            error!(error = %e, "Provider failed");
            report_for(provider, Vec::new(), Some(e))
        }
    }
}

#[instrument(level = "info", skip(provider), fields(provider_id = %provider.provider_id()))]
async fn poll_single(provider: &dyn ContentProvider, url: &str) -> ProviderReport {
    match provider.get_single(url).await {
        Ok(item) => report_for(provider, vec![item], None),
        Err(e) => {
            warn!(error = %e, "Single fetch failed");
            report_for(provider, Vec::new(), Some(e))
        }
    }
}

fn report_for(
    provider: &dyn ContentProvider,
    items: Vec<libmati::Content>,
    error: Option<Error>,
) -> ProviderReport {
    ProviderReport {
        provider_id: provider.provider_id().to_string(),
        name: provider.name().to_string(),
        items,
        error: error.map(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libmati::build_provider;

    fn config() -> YamlConfig {
        YamlConfig::from_yaml_str(
            "content_providers:\n  rep:\n    type: repostuj\n  wyk:\n    type: wykop\n",
        )
        .unwrap()
    }

    #[test]
    fn test_select_all_by_default() {
        let entries = select_entries(&config(), &[]).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_select_named_providers() {
        let entries = select_entries(&config(), &["wyk".to_string()]).unwrap();
        assert_eq!(entries[0].0, "wyk");
        assert!(select_entries(&config(), &["nope".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_failed_provider_is_reported() {
        let provider = build_provider("wyk", serde_yaml::from_str("type: wykop\n").unwrap()).unwrap();
        let report = poll(provider.as_ref()).await;
        assert!(report.items.is_empty());
        assert!(report.error.unwrap().contains("api_key"));
    }
}
