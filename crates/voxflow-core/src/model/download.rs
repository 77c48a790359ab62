//! Streaming file download for model files.
//!
//! Files are written to a `.download` sibling and renamed into place on
//! completion, so an interrupted download never leaves a truncated file
//! that would pass the presence check on the next load attempt.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

static DOWNLOAD_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Client without a total-request timeout: model files run to gigabytes and
/// the shared provider client's deadline would cut them off.
fn download_client() -> Result<&'static reqwest::Client> {
    DOWNLOAD_CLIENT.get_or_try_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create download client")
    })
}

/// Download `url` to `dest`, reporting cumulative received bytes.
pub(crate) async fn fetch_to_path(
    url: &str,
    dest: &Path,
    mut on_progress: impl FnMut(u64),
) -> Result<()> {
    let client = download_client()?;
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download of {url} failed (HTTP {})", response.status());
    }

    let tmp = dest.with_extension("download");
    let mut file = tokio::fs::File::create(&tmp)
        .await
        .with_context(|| format!("Failed to create {}", tmp.display()))?;

    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Download stream interrupted")?;
        file.write_all(&chunk)
            .await
            .context("Failed to write model data")?;
        received += chunk.len() as u64;
        on_progress(received);
    }

    file.flush().await.context("Failed to flush model file")?;
    drop(file);

    tokio::fs::rename(&tmp, dest)
        .await
        .with_context(|| format!("Failed to move {} into place", dest.display()))?;
    Ok(())
}
