// src/fetch/mod.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tracing::info;
use url::Url;

use crate::geo::BoundaryCollection;

/// Return the boundary file at `cache_path`, downloading it from `url`
/// first if it is not there yet.
#[tracing::instrument(level = "info", skip(client), fields(url = %url, cache = %cache_path.display()))]
pub async fn fetch_boundaries(
    client: &Client,
    url: &Url,
    cache_path: &Path,
) -> Result<BoundaryCollection> {
    if fs::try_exists(cache_path).await.unwrap_or(false) {
        let bytes = fs::read(cache_path)
            .await
            .with_context(|| format!("reading cached {}", cache_path.display()))?;
        return BoundaryCollection::from_slice(&bytes)
            .with_context(|| format!("in cached {}", cache_path.display()));
    }

    let bytes = download(client, url).await?;
    let coll = BoundaryCollection::from_slice(&bytes)
        .with_context(|| format!("in response from {}", url))?;

    if let Some(parent) = cache_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = cache_path.with_extension("tmp");
    fs::write(&tmp, &bytes)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, cache_path).await?;
    info!(features = coll.len(), bytes = bytes.len(), "cached boundaries");
    Ok(coll)
}

async fn download(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let resp = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}
