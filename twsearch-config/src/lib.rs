//! Credential loading for twsearch: file + environment overlays.
//!
//! The file format is inferred from its extension (JSON, YAML or TOML). Keys
//! are flat and match the historical `config.json` layout:
//!
//! ```json
//! {
//!   "consumer_api_key": "...",
//!   "consumer_api_secret_key": "...",
//!   "access_token": "...",
//!   "access_token_secret": "..."
//! }
//! ```
//!
//! Precedence, lowest first: file sources in the order they were added, then
//! `TWSEARCH__<KEY>` environment variables. String values may reference other
//! environment variables as `${VAR}`; expansion is recursive up to a fixed depth.
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub use config::FileFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TWSEARCH";

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("missing required credential `{0}`")]
    MissingField(&'static str),
    #[error("credential `{field}` references an unset environment variable: {value}")]
    Unresolved { field: &'static str, value: String },
}

/// The four secrets needed for an OAuth 1.0a user-context session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCredentials {
    #[serde(default)]
    consumer_api_key: Option<String>,
    #[serde(default)]
    consumer_api_secret_key: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    access_token_secret: Option<String>,
}

impl RawCredentials {
    fn validate(self) -> Result<Credentials, ConfigError> {
        Ok(Credentials {
            consumer_key: required("consumer_api_key", self.consumer_api_key)?,
            consumer_secret: required("consumer_api_secret_key", self.consumer_api_secret_key)?,
            access_token: required("access_token", self.access_token)?,
            access_token_secret: required("access_token_secret", self.access_token_secret)?,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(field))?;
    if value.contains("${") {
        return Err(ConfigError::Unresolved { field, value });
    }
    Ok(value)
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (file sources + env overrides).
pub struct CredentialsLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CredentialsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialsLoader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required file; the `config` crate infers the format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline snippet, mostly for tests.
    ///
    /// ```
    /// use twsearch_config::{CredentialsLoader, FileFormat};
    ///
    /// let creds = CredentialsLoader::new()
    ///     .with_str(
    ///         r#"
    /// consumer_api_key: "ck"
    /// consumer_api_secret_key: "cs"
    /// access_token: "at"
    /// access_token_secret: "ats"
    /// "#,
    ///         FileFormat::Yaml,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(creds.consumer_key, "ck");
    /// assert_eq!(creds.access_token_secret, "ats");
    /// ```
    pub fn with_str(mut self, content: &str, format: FileFormat) -> Self {
        self.builder = self.builder.add_source(File::from_str(content, format));
        self
    }

    /// Merge all sources, apply `TWSEARCH__*` overrides, expand `${VAR}`
    /// placeholders and check that every credential is present.
    pub fn load(self) -> Result<Credentials, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let raw: RawCredentials = serde_json::from_value(v)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        raw.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(ck: Option<&str>, cs: Option<&str>, at: Option<&str>, ats: Option<&str>) -> RawCredentials {
        RawCredentials {
            consumer_api_key: ck.map(str::to_string),
            consumer_api_secret_key: cs.map(str::to_string),
            access_token: at.map(str::to_string),
            access_token_secret: ats.map(str::to_string),
        }
    }

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_nested_objects() {
        temp_env::with_vars([("CK", Some("key")), ("CS", Some("secret"))], || {
            let mut v = json!({ "consumer_api_key": "$CK", "nested": ["${CS}", 3, null] });
            expand_env_in_value(&mut v);
            assert_eq!(v, json!({ "consumer_api_key": "key", "nested": ["secret", 3, null] }));
        });
    }

    #[test]
    fn expands_recursively_and_stops_on_cycles() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("A", Some("${B}")),
                ("B", Some("${A}")),
            ],
            || {
                let mut v = json!(["X=${BAR}", "x=${A}-y"]);
                expand_env_in_value(&mut v);
                assert_eq!(v[0], json!("X=mid-qux"));
                let cyclic = v[1].as_str().unwrap();
                assert!(cyclic.starts_with("x=") && cyclic.ends_with("-y"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${TWSEARCH_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${TWSEARCH_DOES_NOT_EXIST}"));
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let err = raw(Some("ck"), None, Some("at"), None).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("consumer_api_secret_key")));

        let err = raw(Some("ck"), Some("cs"), Some("at"), Some("   ")).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("access_token_secret")));
    }

    #[test]
    fn validate_rejects_unexpanded_placeholders() {
        let err = raw(Some("ck"), Some("${NOPE}"), Some("at"), Some("ats"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Unresolved { field: "consumer_api_secret_key", .. }));
    }

    #[test]
    fn validate_trims_values() {
        let creds = raw(Some(" ck "), Some("cs\n"), Some("at"), Some("ats"))
            .validate()
            .unwrap();
        assert_eq!(creds.consumer_key, "ck");
        assert_eq!(creds.consumer_secret, "cs");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = raw(Some("ck"), Some("cs-secret"), Some("at-secret"), Some("ats-secret"))
            .validate()
            .unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("ck"));
        assert!(!shown.contains("cs-secret"));
    }
}
