//! Turn accumulated v1.1 statuses into a [`SearchResult`].
use time::OffsetDateTime;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::macros::format_description;

use crate::twitter::error::SearchError;
use crate::twitter::types::{SearchResult, Status};

/// Drop reshares, then project text and parsed creation date in source order.
///
/// Fails on the first unparseable `created_at`; dates of reshares are never
/// looked at.
pub fn into_search_result(statuses: Vec<Status>) -> Result<SearchResult, SearchError> {
    let originals: Vec<Status> = statuses.into_iter().filter(|s| !s.is_reshare()).collect();

    let dates = originals
        .iter()
        .map(|s| parse_created_at(&s.created_at))
        .collect::<Result<Vec<_>, _>>()?;
    let texts = originals.into_iter().map(|s| s.full_text).collect();

    Ok(SearchResult { texts, dates })
}

/// Parse `created_at` as sent by v1.1 (`Wed Oct 10 20:19:24 +0000 2018`),
/// falling back to RFC 2822 and RFC 3339.
pub fn parse_created_at(raw: &str) -> Result<OffsetDateTime, SearchError> {
    let raw = raw.trim();
    let primary = OffsetDateTime::parse(
        raw,
        format_description!(
            "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
        ),
    );
    primary
        .or_else(|err| OffsetDateTime::parse(raw, &Rfc2822).map_err(|_| err))
        .or_else(|err| OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| err))
        .map_err(|source| SearchError::TimestampParse {
            value: raw.to_string(),
            source,
        })
}
