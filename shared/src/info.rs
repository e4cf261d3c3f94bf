//! Best-effort area descriptions from the Wikipedia search and page-summary APIs.

use serde::{Deserialize, Serialize};
use url::Url;

pub const NO_WIKIPEDIA_INFO: &str = "No Wikipedia information available for this area.";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const INFO_NOT_AVAILABLE: &str = "Information not available.";

/// Extract length shown in popups before truncation.
pub const EXTRACT_DISPLAY_CHARS: usize = 300;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_SUMMARY_ENDPOINT: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
pub const DEFAULT_REGION_SUFFIX: &str = "Curaçao";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaInfoSummary {
    pub title: String,
    pub extract: String,
    pub thumbnail_url: Option<String>,
    pub source_url: Option<String>,
}

impl AreaInfoSummary {
    fn fallback(area_name: &str, extract: &str) -> Self {
        Self {
            title: area_name.to_string(),
            extract: extract.to_string(),
            thumbnail_url: None,
            source_url: None,
        }
    }

    /// Extract cut to [`EXTRACT_DISPLAY_CHARS`] characters, with an ellipsis when cut.
    pub fn display_extract(&self) -> String {
        truncate_chars(&self.extract, EXTRACT_DISPLAY_CHARS)
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Where to look things up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEndpoints {
    pub search: String,
    pub summary: String,
    /// Appended to the area name for the first, more specific search.
    pub region_suffix: String,
}

impl Default for InfoEndpoints {
    fn default() -> Self {
        Self {
            search: DEFAULT_SEARCH_ENDPOINT.to_string(),
            summary: DEFAULT_SUMMARY_ENDPOINT.to_string(),
            region_suffix: DEFAULT_REGION_SUFFIX.to_string(),
        }
    }
}

impl InfoEndpoints {
    pub fn search_url(&self, query: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.search)?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", query)
            .append_pair("format", "json")
            .append_pair("origin", "*");
        Ok(url)
    }

    pub fn summary_url(&self, title: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.summary)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(title);
        Ok(url)
    }
}

/// HTTP GET returning the response body. Errors are already stringified by the
/// implementation (network failure, non-2xx status, unreadable body).
#[allow(async_fn_in_trait)]
pub trait InfoTransport {
    async fn get_text(&self, url: &Url) -> Result<String, String>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    #[serde(default)]
    desktop: Option<DesktopUrls>,
}

#[derive(Debug, Deserialize)]
struct DesktopUrls {
    #[serde(default)]
    page: Option<String>,
}

/// Outcome of a lookup: the summary to show, plus the failure reason when
/// that summary is the "not available" default.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoLookup {
    pub summary: AreaInfoSummary,
    pub error: Option<String>,
}

/// Look up `area_name`. Never fails: every error path yields a default
/// summary, with the reason kept alongside it.
pub async fn fetch_area_info<T: InfoTransport>(
    transport: &T,
    endpoints: &InfoEndpoints,
    area_name: &str,
) -> InfoLookup {
    match try_fetch_area_info(transport, endpoints, area_name).await {
        Ok(summary) => InfoLookup {
            summary,
            error: None,
        },
        Err(e) => InfoLookup {
            summary: AreaInfoSummary::fallback(area_name, INFO_NOT_AVAILABLE),
            error: Some(e),
        },
    }
}

async fn try_fetch_area_info<T: InfoTransport>(
    transport: &T,
    endpoints: &InfoEndpoints,
    area_name: &str,
) -> Result<AreaInfoSummary, String> {
    let scoped = format!("{area_name} {}", endpoints.region_suffix);
    let mut hits = search(transport, endpoints, &scoped).await?;
    if hits.is_empty() {
        hits = search(transport, endpoints, area_name).await?;
    }
    let Some(first) = hits.into_iter().next() else {
        return Ok(AreaInfoSummary::fallback(area_name, NO_WIKIPEDIA_INFO));
    };

    let url = endpoints
        .summary_url(&first.title)
        .map_err(|e| format!("bad summary url: {e}"))?;
    let body = transport.get_text(&url).await?;
    let page: PageSummary =
        serde_json::from_str(&body).map_err(|e| format!("parse error: {e}"))?;

    Ok(AreaInfoSummary {
        title: page.title.unwrap_or_else(|| area_name.to_string()),
        extract: page.extract.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        thumbnail_url: page.thumbnail.and_then(|t| t.source),
        source_url: page
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| d.page),
    })
}

async fn search<T: InfoTransport>(
    transport: &T,
    endpoints: &InfoEndpoints,
    query: &str,
) -> Result<Vec<SearchHit>, String> {
    let url = endpoints
        .search_url(query)
        .map_err(|e| format!("bad search url: {e}"))?;
    let body = transport.get_text(&url).await?;
    let parsed: SearchResponse =
        serde_json::from_str(&body).map_err(|e| format!("parse error: {e}"))?;
    Ok(parsed.query.search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses in order and records every requested URL.
    struct ScriptedTransport {
        responses: RefCell<VecDeque<Result<String, String>>>,
        requests: RefCell<Vec<Url>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<&str, &str>>) -> Self {
            Self {
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<Url> {
            self.requests.borrow().clone()
        }
    }

    impl InfoTransport for ScriptedTransport {
        async fn get_text(&self, url: &Url) -> Result<String, String> {
            self.requests.borrow_mut().push(url.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err("unexpected request".to_string()))
        }
    }

    async fn fetch_summary(
        transport: &ScriptedTransport,
        endpoints: &InfoEndpoints,
        area_name: &str,
    ) -> AreaInfoSummary {
        fetch_area_info(transport, endpoints, area_name).await.summary
    }

    const NO_HITS: &str = r#"{"batchcomplete":"","query":{"searchinfo":{"totalhits":0},"search":[]}}"#;
    const WILLEMSTAD_HITS: &str = r#"{"query":{"search":[{"ns":0,"title":"Willemstad","pageid":1},{"ns":0,"title":"Fort Amsterdam","pageid":2}]}}"#;
    const WILLEMSTAD_SUMMARY: &str = r#"{
        "title": "Willemstad",
        "extract": "Willemstad is the capital city of Curaçao.",
        "thumbnail": { "source": "https://upload.wikimedia.org/w.jpg", "width": 320, "height": 213 },
        "content_urls": { "desktop": { "page": "https://en.wikipedia.org/wiki/Willemstad" } }
    }"#;

    fn srsearch(url: &Url) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == "srsearch")
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn lookup_keeps_the_failure_reason() {
        let transport = ScriptedTransport::new(vec![Ok(WILLEMSTAD_HITS), Err("HTTP 503")]);
        let lookup = block_on(fetch_area_info(
            &transport,
            &InfoEndpoints::default(),
            "Willemstad",
        ));
        assert_eq!(lookup.error.as_deref(), Some("HTTP 503"));
        assert_eq!(lookup.summary.title, "Willemstad");
        assert_eq!(lookup.summary.extract, INFO_NOT_AVAILABLE);

        let transport = ScriptedTransport::new(vec![Ok(NO_HITS), Ok(NO_HITS)]);
        let lookup = block_on(fetch_area_info(
            &transport,
            &InfoEndpoints::default(),
            "Nowhere",
        ));
        assert_eq!(lookup.error, None);
        assert_eq!(lookup.summary.extract, NO_WIKIPEDIA_INFO);
    }

    #[test]
    fn search_then_summary_success() {
        let transport = ScriptedTransport::new(vec![Ok(WILLEMSTAD_HITS), Ok(WILLEMSTAD_SUMMARY)]);
        let info = block_on(fetch_summary(
            &transport,
            &InfoEndpoints::default(),
            "Willemstad",
        ));

        assert_eq!(info.title, "Willemstad");
        assert_eq!(info.extract, "Willemstad is the capital city of Curaçao.");
        assert_eq!(
            info.thumbnail_url.as_deref(),
            Some("https://upload.wikimedia.org/w.jpg")
        );
        assert_eq!(
            info.source_url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Willemstad")
        );

        let requests = transport.requested();
        assert_eq!(requests.len(), 2);
        assert_eq!(srsearch(&requests[0]).as_deref(), Some("Willemstad Curaçao"));
        assert_eq!(
            requests[1].as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Willemstad"
        );
    }

    #[test]
    fn falls_back_to_bare_name_when_scoped_search_is_empty() {
        let transport = ScriptedTransport::new(vec![
            Ok(NO_HITS),
            Ok(WILLEMSTAD_HITS),
            Ok(WILLEMSTAD_SUMMARY),
        ]);
        let info = block_on(fetch_summary(
            &transport,
            &InfoEndpoints::default(),
            "Willemstad",
        ));
        assert_eq!(info.title, "Willemstad");

        let requests = transport.requested();
        assert_eq!(requests.len(), 3);
        assert_eq!(srsearch(&requests[0]).as_deref(), Some("Willemstad Curaçao"));
        assert_eq!(srsearch(&requests[1]).as_deref(), Some("Willemstad"));
    }

    #[test]
    fn zero_hits_returns_no_wikipedia_default() {
        let transport = ScriptedTransport::new(vec![Ok(NO_HITS), Ok(NO_HITS)]);
        let info = block_on(fetch_summary(
            &transport,
            &InfoEndpoints::default(),
            "Seru Grandi",
        ));
        assert_eq!(
            info,
            AreaInfoSummary {
                title: "Seru Grandi".into(),
                extract: NO_WIKIPEDIA_INFO.into(),
                thumbnail_url: None,
                source_url: None,
            }
        );
        assert_eq!(transport.requested().len(), 2);
    }

    #[test]
    fn transport_failure_returns_not_available_default() {
        let transport = ScriptedTransport::new(vec![Err("fetch error: offline")]);
        let info = block_on(fetch_summary(
            &transport,
            &InfoEndpoints::default(),
            "Willemstad",
        ));
        assert_eq!(info.title, "Willemstad");
        assert_eq!(info.extract, INFO_NOT_AVAILABLE);
        assert_eq!(info.thumbnail_url, None);
        assert_eq!(transport.requested().len(), 1);
    }

    #[test]
    fn summary_failure_aborts_with_not_available() {
        let transport = ScriptedTransport::new(vec![Ok(WILLEMSTAD_HITS), Err("HTTP 404")]);
        let info = block_on(fetch_summary(
            &transport,
            &InfoEndpoints::default(),
            "Willemstad",
        ));
        assert_eq!(info.extract, INFO_NOT_AVAILABLE);
    }

    #[test]
    fn malformed_search_body_is_a_failure() {
        let transport = ScriptedTransport::new(vec![Ok(r#"{"error":{"code":"badvalue"}}"#)]);
        let info = block_on(fetch_summary(
            &transport,
            &InfoEndpoints::default(),
            "Willemstad",
        ));
        assert_eq!(info.extract, INFO_NOT_AVAILABLE);
    }

    #[test]
    fn sparse_summary_uses_per_field_defaults() {
        let transport = ScriptedTransport::new(vec![Ok(WILLEMSTAD_HITS), Ok("{}")]);
        let info = block_on(fetch_summary(
            &transport,
            &InfoEndpoints::default(),
            "Punda",
        ));
        assert_eq!(info.title, "Punda");
        assert_eq!(info.extract, NO_DESCRIPTION);
        assert_eq!(info.thumbnail_url, None);
        assert_eq!(info.source_url, None);
    }

    #[test]
    fn summary_url_encodes_title_as_one_segment() {
        let endpoints = InfoEndpoints::default();
        let url = endpoints.summary_url("Sint Michiel/Boca").expect("url");
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Sint%20Michiel%2FBoca"
        );
    }

    #[test]
    fn search_url_carries_query_parameters() {
        let url = InfoEndpoints::default()
            .search_url("Banda Abou Curaçao")
            .expect("url");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("action".into(), "query".into())));
        assert!(pairs.contains(&("list".into(), "search".into())));
        assert!(pairs.contains(&("format".into(), "json".into())));
        assert!(pairs.contains(&("srsearch".into(), "Banda Abou Curaçao".into())));
    }

    #[test]
    fn display_extract_truncates_on_char_boundary() {
        let mut info = AreaInfoSummary::fallback("x", &"é".repeat(EXTRACT_DISPLAY_CHARS + 5));
        let shown = info.display_extract();
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), EXTRACT_DISPLAY_CHARS + 3);

        info.extract = "short".into();
        assert_eq!(info.display_extract(), "short");
    }
}
