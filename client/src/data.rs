use curacao_shared::Dataset;

use crate::config::DATASET_PATH;

/// Fetch and parse the static area dataset.
pub async fn fetch_dataset() -> Result<Dataset, String> {
    let resp = gloo_net::http::Request::get(DATASET_PATH)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| format!("read error: {e}"))?;
    Dataset::from_geojson_str(&body).map_err(|e| format!("parse error: {e}"))
}
