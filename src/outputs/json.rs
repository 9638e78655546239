//! JSON output of a run.
//!
//! The [`FetchReport`] is written pretty-printed, either to stdout or to a
//! file whose parent directories are created on demand.

use crate::error::{Error, Result};
use crate::models::FetchReport;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `report` as JSON to `output`, or to stdout when `output` is `None`.
#[instrument(level = "info", skip_all, fields(output = ?output))]
pub async fn write_report(report: &FetchReport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    let Some(path) = output else {
        println!("{json}");
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(source) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %source, "Failed to create output dir");
            return Err(Error::Io {
                path: parent.to_path_buf(),
                source,
            });
        }
    }

    fs::write(path, json).await.map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), items = report.item_count(), "Wrote JSON report");

    Ok(())
}
