//! Twitter/X v1.1 search: paginated fetching, retweet filtering, and
//! normalization into text/date pairs.
//!
//! [`TwitterSearcher`] owns the authenticated session; [`Progress`] lets a
//! caller watch pages arrive without affecting the loop.
pub mod client;
pub mod error;
pub mod extract;
pub mod progress;
pub mod types;

pub use client::TwitterSearcher;
pub use error::SearchError;
pub use progress::{NoProgress, Progress};
pub use types::SearchResult;
