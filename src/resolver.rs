//! Resolution of third-party embed URLs into direct media URLs.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};
use url::Url;

pub const DEFAULT_RESOLVER_PROGRAM: &str = "yt-dlp";
pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns an embed page URL (Streamable, Gfycat, YouTube, ...) into a URL
/// pointing straight at the playable media.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<String>;
}

/// [`MediaResolver`] shelling out to `yt-dlp --get-url`.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: String,
    timeout: Duration,
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLVER_PROGRAM)
    }
}

impl YtDlpResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_RESOLVER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    #[instrument(level = "info", skip(self), fields(program = %self.program))]
    async fn resolve(&self, url: &str) -> Result<String> {
        let failed = |reason: String| Error::Resolution {
            url: url.to_string(),
            reason,
        };

        let mut command = Command::new(&self.program);
        command
            .args(["--get-url", "--no-warnings", "-f", "best", url])
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(failed(format!("failed to run {}: {e}", self.program))),
            Err(_) => return Err(failed(format!("timed out after {:?}", self.timeout))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Resolver exited with failure");
            return Err(failed(format!("{} exited with {}", self.program, output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let resolved = first_url(&stdout)
            .ok_or_else(|| failed("resolver printed no usable URL".to_string()))?;
        debug!(%resolved, "Resolved media URL");
        Ok(resolved)
    }
}

/// First line of resolver output that parses as an absolute http(s) URL.
fn first_url(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| Url::parse(line).is_ok_and(|u| matches!(u.scheme(), "http" | "https")))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_url() {
        assert_eq!(
            first_url("\nhttps://cdn.example.com/v.mp4\nhttps://cdn.example.com/a.m4a\n"),
            Some("https://cdn.example.com/v.mp4".to_string())
        );
        assert_eq!(first_url(""), None);
        assert_eq!(first_url("ERROR: unsupported\n"), None);
        assert_eq!(first_url("mailto:someone@example.com\n"), None);
        assert_eq!(
            first_url("[info] picking format\nhttps://cdn.example.com/v.mp4\n"),
            Some("https://cdn.example.com/v.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_resolution_error() {
        let resolver = YtDlpResolver::new("definitely-not-an-installed-resolver");
        let err = resolver.resolve("https://streamable.com/abc").await.unwrap_err();
        assert!(matches!(err, Error::Resolution { ref url, .. } if url == "https://streamable.com/abc"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_url_output_is_resolution_error() {
        // `echo` succeeds but prints its arguments, which is not a URL.
        let resolver = YtDlpResolver::new("echo");
        let err = resolver.resolve("https://gfycat.com/x").await.unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }
}
