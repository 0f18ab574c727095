//! OAuth 1.0a request signing (HMAC-SHA1), as used by the Twitter v1.1 API.
//!
//! Every request gets a fresh nonce and timestamp. The signature covers the
//! method, the base URL (no query) and every query parameter sent on the wire.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use reqwest::header::HeaderValue;
use reqwest::{Method, Url};
use sha1::Sha1;
use uuid::Uuid;

use crate::HttpError;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// User-context credentials: the application's consumer pair plus the access
/// token pair of the account the requests are made on behalf of.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Keys {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl fmt::Debug for OAuth1Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Keys")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// Build the `Authorization` header for one request.
pub(crate) fn authorization_header(
    keys: &OAuth1Keys,
    method: &Method,
    url: &Url,
    query: &[(&str, &str)],
) -> Result<HeaderValue, HttpError> {
    let nonce = Uuid::new_v4().simple().to_string();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let header = header_with(keys, method, url, query, &nonce, timestamp)?;
    HeaderValue::from_str(&header)
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))
}

fn header_with(
    keys: &OAuth1Keys,
    method: &Method,
    url: &Url,
    query: &[(&str, &str)],
    nonce: &str,
    timestamp: u64,
) -> Result<String, HttpError> {
    let timestamp = timestamp.to_string();
    let mut oauth = vec![
        ("oauth_consumer_key", keys.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", keys.token.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ];

    let url_pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let mut params: Vec<(&str, &str)> = oauth.clone();
    params.extend(query.iter().copied());
    params.extend(url_pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let signature = sign(
        method,
        url,
        &params,
        &keys.consumer_secret,
        &keys.token_secret,
    )?;
    oauth.push(("oauth_signature", signature.as_str()));
    oauth.sort_unstable();

    let fields: Vec<String> = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    Ok(format!("OAuth {}", fields.join(", ")))
}

/// Compute the base64 HMAC-SHA1 signature over the signature base string.
pub(crate) fn sign(
    method: &Method,
    url: &Url,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, HttpError> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        encode(&base_url(url)),
        encode(&param_string)
    );
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| HttpError::Build(format!("signing key rejected: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Scheme, host, non-default port and path; query and fragment excluded.
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

// RFC 3986 unreserved characters pass through; everything else is %XX.
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}
