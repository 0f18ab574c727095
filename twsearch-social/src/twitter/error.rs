use thiserror::Error;
use twsearch_http::HttpError;

/// Everything that can abort a search. No variant carries a partial result.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query must not be empty")]
    EmptyQuery,

    /// Non-success status, or the request never got a response.
    #[error("search request failed: {0}")]
    Transport(#[source] HttpError),

    #[error("malformed search response: {reason}, body_snippet: {body_snippet}")]
    MalformedResponse {
        reason: String,
        body_snippet: String,
    },

    #[error("unparseable created_at value {value:?}")]
    TimestampParse {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

impl SearchError {
    /// HTTP status of a failed request, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Transport(HttpError::Api { status, .. }) => Some(status.as_u16()),
            _ => None,
        }
    }
}

impl From<HttpError> for SearchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Decode(reason, body_snippet) => SearchError::MalformedResponse {
                reason,
                body_snippet,
            },
            other => SearchError::Transport(other),
        }
    }
}
