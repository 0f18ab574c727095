//! Paginated wrapper around the Twitter/X v1.1 standard search API.
//!
//! Pages are requested newest first with `result_type=recent`. After the first
//! page every request carries `max_id = (smallest id seen) - 1`, so each page
//! only returns statuses older than everything accumulated so far. The loop
//! stops once the requested count is reached or a page comes back empty.
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use twsearch_config::Credentials;
use twsearch_http::{Auth, HttpClient, OAuth1Keys, RequestOpts};

use crate::twitter::error::SearchError;
use crate::twitter::extract::into_search_result;
use crate::twitter::progress::{NoProgress, Progress};
use crate::twitter::types::{SearchResponse, SearchResult, Status};

pub const API_BASE: &str = "https://api.twitter.com";
const SEARCH_PATH: &str = "1.1/search/tweets.json";

/// Largest `count` the search endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_LANG: &str = "ja";
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);

/// HTTP client plus signing keys, built once and borrowed by every request.
#[derive(Clone)]
struct Session {
    http: HttpClient,
    keys: OAuth1Keys,
}

impl Session {
    fn new(base: &str, credentials: &Credentials) -> Result<Self, SearchError> {
        Ok(Self {
            http: HttpClient::new(base)?,
            keys: OAuth1Keys {
                consumer_key: credentials.consumer_key.clone(),
                consumer_secret: credentials.consumer_secret.clone(),
                token: credentials.access_token.clone(),
                token_secret: credentials.access_token_secret.clone(),
            },
        })
    }
}

/// Search client. Run one `search` at a time per instance.
#[derive(Clone)]
pub struct TwitterSearcher {
    session: Session,
    lang: String,
    page_delay: Duration,
    progress: Arc<dyn Progress>,
}

impl TwitterSearcher {
    pub fn new(credentials: &Credentials) -> Result<Self, SearchError> {
        Self::with_base_url(credentials, API_BASE)
    }

    /// Point the client at another host (local fakes, proxies).
    pub fn with_base_url(credentials: &Credentials, base: &str) -> Result<Self, SearchError> {
        Ok(Self {
            session: Session::new(base, credentials)?,
            lang: DEFAULT_LANG.to_string(),
            page_delay: DEFAULT_PAGE_DELAY,
            progress: Arc::new(NoProgress),
        })
    }

    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Pause between consecutive pages.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch at least `target_count` raw statuses (fewer if the source runs
    /// dry), drop retweets and return the remaining texts with their dates.
    ///
    /// `target_count == 0` returns an empty result without touching the
    /// network. Any failure aborts the whole call; the progress observer is
    /// finished either way.
    pub async fn search(
        &self,
        query: &str,
        target_count: usize,
    ) -> Result<SearchResult, SearchError> {
        if target_count == 0 {
            return Ok(SearchResult::default());
        }
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        self.progress.begin(target_count);
        let collected = self.collect_pages(query, target_count).await;
        self.progress.finish();
        let (statuses, pages) = collected?;

        let raw_count = statuses.len();
        let result = into_search_result(statuses)?;
        tracing::info!(
            target: "twitter.search",
            pages,
            raw = raw_count,
            kept = result.len(),
            "twitter.search.done"
        );
        Ok(result)
    }

    /// Page loop. Returns the raw statuses in source order and the number of
    /// requests made.
    async fn collect_pages(
        &self,
        query: &str,
        target_count: usize,
    ) -> Result<(Vec<Status>, usize), SearchError> {
        let page_size = target_count.min(MAX_PAGE_SIZE);
        let mut statuses: Vec<Status> = Vec::new();
        let mut min_id: Option<u64> = None;
        let mut page = 0usize;

        loop {
            page += 1;
            let max_id = min_id.map(|id| id - 1);
            let resp = self.fetch_page(query, page_size, max_id).await?;

            let fetched = resp.statuses.len();
            if let Some(lowest) = resp.statuses.iter().map(|s| s.id).min() {
                min_id = Some(min_id.map_or(lowest, |m| m.min(lowest)));
            }
            statuses.extend(resp.statuses);
            self.progress.inc(fetched);

            tracing::info!(
                target: "twitter.search",
                page,
                fetched,
                total = statuses.len(),
                wanted = target_count,
                ?max_id,
                "twitter.search.page"
            );

            if statuses.len() >= target_count || fetched == 0 {
                break;
            }
            // nothing older than id 0 can exist
            if min_id == Some(0) {
                tracing::debug!(target: "twitter.search", page, "twitter.search.cursor_exhausted");
                break;
            }
            sleep(self.page_delay).await;
        }
        Ok((statuses, page))
    }

    async fn fetch_page(
        &self,
        query: &str,
        count: usize,
        max_id: Option<u64>,
    ) -> Result<SearchResponse, SearchError> {
        let resp: SearchResponse = self
            .session
            .http
            .get_json(
                SEARCH_PATH,
                RequestOpts {
                    auth: Some(Auth::OAuth1(&self.session.keys)),
                    query: Some(page_params(query, count, &self.lang, max_id)),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(
            statuses = resp.statuses.len(),
            next_results = ?resp.search_metadata.as_ref().and_then(|m| m.next_results.as_deref()),
            "twitter.search.response"
        );
        Ok(resp)
    }
}

fn page_params<'a>(
    query: &'a str,
    count: usize,
    lang: &'a str,
    max_id: Option<u64>,
) -> Vec<(&'static str, Cow<'a, str>)> {
    let mut params: Vec<(&'static str, Cow<'a, str>)> = vec![
        ("q", query.into()),
        ("count", count.to_string().into()),
        ("lang", lang.into()),
        ("result_type", "recent".into()),
        ("tweet_mode", "extended".into()),
    ];
    if let Some(id) = max_id {
        params.push(("max_id", id.to_string().into()));
    }
    params
}
