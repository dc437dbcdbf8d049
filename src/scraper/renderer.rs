use crate::config::RenderConfig;
use crate::model::RenderError;
use crate::scraper::traits::PageRenderer;

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Renders pages by running a headless Chromium-family browser with `--dump-dom`.
pub struct HeadlessBrowser {
    browser_path: String,
    timeout_secs: u64,
}

impl HeadlessBrowser {
    pub fn new(cfg: &RenderConfig) -> Self {
        Self {
            browser_path: cfg.browser_path.clone(),
            timeout_secs: cfg.timeout_seconds,
        }
    }

    fn command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.browser_path);
        cmd.args([
            "--headless",
            "--disable-gpu",
            "--no-sandbox",
            "--virtual-time-budget=10000",
            "--dump-dom",
            url,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl PageRenderer for HeadlessBrowser {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        debug!("Rendering {} with {}", url, self.browser_path);
        let child = self.command(url).spawn()?;

        // The child is killed on drop when the timeout fires.
        let output = timeout(Duration::from_secs(self.timeout_secs), child.wait_with_output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout_secs))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed(format!(
                "{}: {}",
                output.status,
                stderr.lines().last().unwrap_or("")
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_browser_is_a_launch_error() {
        let browser = HeadlessBrowser::new(&RenderConfig {
            enabled: true,
            browser_path: "/nonexistent/price-sniper-browser".into(),
            timeout_seconds: 2,
        });
        let err = browser.render("https://example.com").await.unwrap_err();
        assert!(matches!(err, RenderError::Launch(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_browser_times_out() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hung-browser.sh");
        {
            let mut f = std::fs::File::create(&script).unwrap();
            f.write_all(b"#!/bin/sh\nsleep 30\n").unwrap();
            f.sync_all().unwrap();
        }
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let browser = HeadlessBrowser::new(&RenderConfig {
            enabled: true,
            browser_path: script.to_string_lossy().into_owned(),
            timeout_seconds: 1,
        });
        let started = Instant::now();
        let err = browser.render("https://example.com").await.unwrap_err();

        assert!(matches!(err, RenderError::Timeout(1)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
