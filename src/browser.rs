//! Remote-browser screenshot capture.
//!
//! One WebDriver session is created per invocation against a pooled remote
//! automation endpoint, used exclusively, and released on every exit path.
//! All failures here are recoverable: the pipeline proceeds without a
//! preview.

use std::path::{Path, PathBuf};

use fantoccini::{Client, ClientBuilder};
use image::ImageFormat;
use log::{debug, warn};
use serde_json::json;

use crate::config::{BROWSER_PAGE_LOAD_TIMEOUT, BROWSER_SCRIPT_TIMEOUT};
use crate::error_handling::BrowserError;

const RASTER_FILENAME: &str = "urlscreenshot.png";
const ENCODED_FILENAME: &str = "urlscreenshot.webp";

/// A captured page snapshot: the raster capture, its web-friendly
/// re-encoding, and the rendered document title.
///
/// Both files live in the invocation's scratch directory and disappear
/// with it.
#[derive(Debug)]
pub struct ScreenshotArtifact {
    /// Raw PNG capture as returned by the browser.
    pub raster_file: PathBuf,
    /// WebP re-encoding, the form that gets uploaded.
    pub encoded_file: PathBuf,
    /// Rendered document title.
    pub title: String,
}

/// Drives a remote WebDriver endpoint to render a page and capture a
/// compressed snapshot.
pub struct ScreenshotCapturer {
    webdriver_url: String,
    window_size: (u32, u32),
}

impl ScreenshotCapturer {
    pub fn new(webdriver_url: impl Into<String>, window_size: (u32, u32)) -> Self {
        ScreenshotCapturer {
            webdriver_url: webdriver_url.into(),
            window_size,
        }
    }

    /// Renders the URL and captures a snapshot into `workdir`.
    ///
    /// The browser session is released whether or not the capture
    /// succeeds; a failed release is logged but does not mask the capture
    /// result.
    ///
    /// # Errors
    ///
    /// Returns `BrowserError` on session creation, navigation, timeout, or
    /// encoding failure.
    pub async fn capture(
        &self,
        url: &str,
        workdir: &Path,
    ) -> Result<ScreenshotArtifact, BrowserError> {
        let mut client = self.open_session().await?;
        let result = self.drive(&mut client, url, workdir).await;
        if let Err(e) = client.close().await {
            warn!("Failed to release browser session: {e}");
        }
        result
    }

    async fn open_session(&self) -> Result<Client, BrowserError> {
        let mut capabilities = serde_json::map::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--hide-scrollbars",
                    "--disable-dev-shm-usage",
                    "--start-maximized",
                ],
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&self.webdriver_url)
            .await?;
        Ok(client)
    }

    async fn drive(
        &self,
        client: &mut Client,
        url: &str,
        workdir: &Path,
    ) -> Result<ScreenshotArtifact, BrowserError> {
        client
            .update_timeouts(fantoccini::wd::TimeoutConfiguration::new(
                None,
                Some(BROWSER_PAGE_LOAD_TIMEOUT),
                Some(BROWSER_SCRIPT_TIMEOUT),
            ))
            .await?;
        let (width, height) = self.window_size;
        client.set_window_size(width, height).await?;

        client.goto(url).await?;
        let title = client.title().await?;
        debug!("Rendered {url} with title {title:?}");

        let png = client.screenshot().await?;
        encode_snapshot(&png, workdir, title)
    }
}

/// Writes the raster capture and re-encodes it as WebP next to it.
fn encode_snapshot(
    png: &[u8],
    workdir: &Path,
    title: String,
) -> Result<ScreenshotArtifact, BrowserError> {
    let raster_file = workdir.join(RASTER_FILENAME);
    std::fs::write(&raster_file, png)?;

    let decoded = image::load_from_memory(png)?;
    let encoded_file = workdir.join(ENCODED_FILENAME);
    decoded.save_with_format(&encoded_file, ImageFormat::WebP)?;

    Ok(ScreenshotArtifact {
        raster_file,
        encoded_file,
        title,
    })
}
