use leptos::prelude::*;
use url::Url;
use wasm_bindgen_futures::spawn_local;

use curacao_shared::{
    AreaPopup, FetchTicket, InfoEndpoints, InfoLookup, InfoTransport, LonLat, SelectionController,
    fetch_area_info,
};

/// `fetch` via gloo-net. No timeout beyond the browser's own.
pub struct BrowserTransport;

impl InfoTransport for BrowserTransport {
    async fn get_text(&self, url: &Url) -> Result<String, String> {
        let resp = gloo_net::http::Request::get(url.as_str())
            .send()
            .await
            .map_err(|e| format!("fetch error: {e}"))?;

        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }

        resp.text().await.map_err(|e| format!("read error: {e}"))
    }
}

/// Fetch the summary for `ticket.area` and open the popup with it at
/// `anchor`, unless a newer selection has been made in the meantime.
pub fn load_area_info(
    ticket: FetchTicket,
    anchor: LonLat,
    controller: RwSignal<SelectionController>,
    popup: RwSignal<Option<AreaPopup>>,
) {
    spawn_local(async move {
        let InfoLookup { summary, error } =
            fetch_area_info(&BrowserTransport, &InfoEndpoints::default(), &ticket.area).await;
        if let Some(e) = error {
            web_sys::console::warn_1(&format!("info lookup failed for {}: {e}", ticket.area).into());
        }

        match controller.with_untracked(|c| c.bind_summary(&ticket, anchor, summary)) {
            Some(bound) => popup.set(Some(bound)),
            None => web_sys::console::info_1(
                &format!("discarding stale info response for {}", ticket.area).into(),
            ),
        }
    });
}
