pub mod commands;
pub mod mock;
pub mod queries;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KvError>;

#[derive(Debug, Error)]
pub enum KvError {
    /// Transport failure, non-JSON reply, or store timeout. The store may
    /// or may not have applied the command; callers treat multi-step
    /// sequences as best-effort.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The store answered with an `error` field.
    #[error("store error: {0}")]
    Store(String),

    /// The store answered 2xx JSON but not in the shape the command expects.
    #[error("unexpected store reply: {0}")]
    Protocol(String),
}

/// Client for a command-per-call HTTP key-value store.
///
/// Every command is a single `GET {base}/{cmd}/{arg}/{arg}...` round trip
/// with a bearer token; replies are `{"result": ...}` or `{"error": "..."}`.
/// There are no multi-key transactions and no retries; a failed call
/// surfaces immediately as [`KvError`].
#[derive(Debug, Clone)]
pub struct KvClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply {
    Error { error: String },
    Result { result: Value },
}

impl KvClient {
    pub fn new(base: Url, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
            token: token.into(),
        }
    }

    pub(crate) async fn command(&self, args: &[&str]) -> Result<Value> {
        // every argument is its own percent-encoded path segment, so values
        // containing `/`, `%` or spaces survive the trip intact
        let path: Vec<String> = args
            .iter()
            .map(|arg| utf8_percent_encode(arg, NON_ALPHANUMERIC).to_string())
            .collect();
        let url = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.join("/")
        );

        let reply: Reply = self
            .http
            .get(url.as_str())
            .bearer_auth(&self.token)
            .send()
            .await?
            .json()
            .await?;

        match reply {
            Reply::Error { error } => Err(KvError::Store(error)),
            Reply::Result { result } => Ok(result),
        }
    }
}

pub(crate) fn as_int(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| KvError::Protocol(format!("non-integer reply: {}", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| KvError::Protocol(format!("non-integer reply: {:?}", s))),
        other => Err(KvError::Protocol(format!("expected integer, got {}", other))),
    }
}

pub(crate) fn as_opt_string(value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(KvError::Protocol(format!("expected string, got {}", other))),
    }
}

pub(crate) fn as_string_array(value: Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(KvError::Protocol(format!("expected array, got {}", value)));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(KvError::Protocol(format!(
                "expected array of strings, got element {}",
                other
            ))),
        })
        .collect()
}
