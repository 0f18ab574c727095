use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Body of `GET 1.1/search/tweets.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub search_metadata: Option<SearchMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchMetadata {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next_results: Option<String>,
}

/// One search hit. Only the fields the pipeline needs are typed; the rest of
/// the v1.1 payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: u64,
    pub full_text: String,
    pub created_at: String,

    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub user: Option<User>,

    /// Present (with any value, `null` included) on official retweets.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub retweeted_status: Option<Value>,
}

impl Status {
    pub fn is_reshare(&self) -> bool {
        self.retweeted_status.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Normalized output: index-aligned texts and creation dates, reshares removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub texts: Vec<String>,
    pub dates: Vec<OffsetDateTime>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Iterate `(text, date)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, OffsetDateTime)> + '_ {
        self.texts
            .iter()
            .map(String::as_str)
            .zip(self.dates.iter().copied())
    }
}

fn id_from_number_or_string<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }

    match Repr::deserialize(d)? {
        Repr::Num(n) => Ok(n),
        Repr::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid status id: {s:?}"))),
    }
}

// Only called when the key exists, so an explicit `null` still counts.
fn present<'de, D>(d: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(d).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_accepts_number_and_decimal_text() {
        let a: Status = serde_json::from_value(json!({
            "id": 1050118621198921728u64,
            "full_text": "a",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018"
        }))
        .unwrap();
        let b: Status = serde_json::from_value(json!({
            "id": "1050118621198921728",
            "full_text": "b",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018"
        }))
        .unwrap();
        assert_eq!(a.id, 1050118621198921728);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        let err = serde_json::from_value::<Status>(json!({
            "id": "abc",
            "full_text": "a",
            "created_at": "x"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn reshare_marker_is_presence_based() {
        let base = json!({ "id": 1, "full_text": "t", "created_at": "c" });

        let plain: Status = serde_json::from_value(base.clone()).unwrap();
        assert!(!plain.is_reshare());

        let mut with_null = base.clone();
        with_null["retweeted_status"] = Value::Null;
        assert!(serde_json::from_value::<Status>(with_null).unwrap().is_reshare());

        let mut with_obj = base;
        with_obj["retweeted_status"] = json!({ "id": 0 });
        assert!(serde_json::from_value::<Status>(with_obj).unwrap().is_reshare());
    }

    #[test]
    fn missing_statuses_fails_to_decode() {
        assert!(serde_json::from_value::<SearchResponse>(json!({ "errors": [] })).is_err());
        let ok: SearchResponse = serde_json::from_value(json!({ "statuses": [] })).unwrap();
        assert!(ok.statuses.is_empty());
        assert!(ok.search_metadata.is_none());
    }
}
