//! In-memory stand-in for the remote store, speaking the same
//! command-per-call HTTP protocol on an ephemeral port. Integration tests
//! across the workspace run against it instead of a real deployment.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, Uri, header},
    response::Json,
};
use percent_encoding::percent_decode_str;
use serde_json::{Value, json};

use crate::KvClient;

pub const MOCK_TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
enum MockValue {
    Str(String),
    List(Vec<String>),
    Set(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: MockValue,
    expires_at: Option<Instant>,
}

#[derive(Default)]
struct MockState {
    entries: Mutex<HashMap<String, Entry>>,
}

pub struct MockKvServer {
    addr: SocketAddr,
}

impl MockKvServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(dispatch).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock store");
        let addr = listener.local_addr().expect("mock store addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr }
    }

    pub fn url(&self) -> reqwest::Url {
        format!("http://{}", self.addr)
            .parse()
            .expect("mock store url")
    }

    pub fn token(&self) -> &'static str {
        MOCK_TOKEN
    }

    /// A client wired to this server with the right bearer token.
    pub fn client(&self) -> KvClient {
        KvClient::new(self.url(), MOCK_TOKEN)
    }
}

async fn dispatch(State(state): State<Arc<MockState>>, headers: HeaderMap, uri: Uri) -> Json<Value> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MOCK_TOKEN));
    if !authorized {
        return Json(json!({ "error": "Unauthorized" }));
    }

    let args: Vec<String> = uri
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();

    let mut entries = state.entries.lock().expect("mock store lock");
    match exec(&mut entries, &args) {
        Ok(result) => Json(json!({ "result": result })),
        Err(error) => Json(json!({ "error": error })),
    }
}

/// True if the key currently holds a live entry; drops it if its TTL lapsed.
fn prune(entries: &mut HashMap<String, Entry>, key: &str) -> bool {
    let expired = entries
        .get(key)
        .is_some_and(|e| e.expires_at.is_some_and(|t| t <= Instant::now()));
    if expired {
        entries.remove(key);
    }
    entries.contains_key(key)
}

/// Prune, then make sure the key holds an entry, seeding it if absent.
fn entry_or_seed<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    seed: MockValue,
) -> &'a mut Entry {
    if !prune(entries, key) {
        entries.insert(
            key.to_string(),
            Entry {
                value: seed,
                expires_at: None,
            },
        );
    }
    entries.get_mut(key).expect("entry just ensured")
}

fn wrongtype() -> String {
    "WRONGTYPE Operation against a key holding the wrong kind of value".into()
}

fn exec(entries: &mut HashMap<String, Entry>, args: &[String]) -> Result<Value, String> {
    let Some(cmd) = args.first() else {
        return Err("ERR empty command".into());
    };
    let key = |i: usize| -> Result<&str, String> {
        args.get(i)
            .map(String::as_str)
            .ok_or_else(|| format!("ERR wrong number of arguments for '{}'", cmd))
    };

    match cmd.to_ascii_lowercase().as_str() {
        "get" => {
            let k = key(1)?.to_string();
            if !prune(entries, &k) {
                return Ok(Value::Null);
            }
            match &entries[&k].value {
                MockValue::Str(s) => Ok(Value::String(s.clone())),
                _ => Err(wrongtype()),
            }
        }
        "set" => {
            let (k, v) = (key(1)?.to_string(), key(2)?.to_string());
            let expires_at = match args.get(3) {
                Some(opt) if opt.eq_ignore_ascii_case("ex") => {
                    let secs: u64 = key(4)?
                        .parse()
                        .map_err(|_| "ERR invalid expire time in 'set' command".to_string())?;
                    Some(Instant::now() + Duration::from_secs(secs))
                }
                Some(other) => return Err(format!("ERR syntax error near '{}'", other)),
                None => None,
            };
            entries.insert(
                k,
                Entry {
                    value: MockValue::Str(v),
                    expires_at,
                },
            );
            Ok(Value::String("OK".into()))
        }
        "incr" => {
            let k = key(1)?.to_string();
            let entry = entry_or_seed(entries, &k, MockValue::Str("0".into()));
            let MockValue::Str(s) = &mut entry.value else {
                return Err(wrongtype());
            };
            let n: i64 = s
                .parse()
                .map_err(|_| "ERR value is not an integer or out of range".to_string())?;
            *s = (n + 1).to_string();
            Ok(json!(n + 1))
        }
        "expire" => {
            let k = key(1)?.to_string();
            let secs: u64 = key(2)?
                .parse()
                .map_err(|_| "ERR value is not an integer or out of range".to_string())?;
            if !prune(entries, &k) {
                return Ok(json!(0));
            }
            if let Some(entry) = entries.get_mut(&k) {
                entry.expires_at = Some(Instant::now() + Duration::from_secs(secs));
            }
            Ok(json!(1))
        }
        "del" => {
            let mut removed = 0;
            for k in args.iter().skip(1) {
                if prune(entries, k) {
                    entries.remove(k);
                    removed += 1;
                }
            }
            Ok(json!(removed))
        }
        "lpush" => {
            let k = key(1)?.to_string();
            key(2)?;
            let entry = entry_or_seed(entries, &k, MockValue::List(Vec::new()));
            let MockValue::List(list) = &mut entry.value else {
                return Err(wrongtype());
            };
            for v in &args[2..] {
                list.insert(0, v.clone());
            }
            Ok(json!(list.len()))
        }
        "lrange" => {
            let k = key(1)?.to_string();
            let (start, stop) = (parse_index(key(2)?)?, parse_index(key(3)?)?);
            if !prune(entries, &k) {
                return Ok(json!([]));
            }
            match &entries[&k].value {
                MockValue::List(l) => match range_bounds(l.len(), start, stop) {
                    Some((lo, hi)) => Ok(json!(l[lo..=hi].to_vec())),
                    None => Ok(json!([])),
                },
                _ => Err(wrongtype()),
            }
        }
        "ltrim" => {
            let k = key(1)?.to_string();
            let (start, stop) = (parse_index(key(2)?)?, parse_index(key(3)?)?);
            if !prune(entries, &k) {
                return Ok(Value::String("OK".into()));
            }
            let mut drop_key = false;
            if let Some(entry) = entries.get_mut(&k) {
                let MockValue::List(l) = &mut entry.value else {
                    return Err(wrongtype());
                };
                match range_bounds(l.len(), start, stop) {
                    Some((lo, hi)) => *l = l[lo..=hi].to_vec(),
                    None => drop_key = true,
                }
            }
            if drop_key {
                entries.remove(&k);
            }
            Ok(Value::String("OK".into()))
        }
        "sadd" => {
            let k = key(1)?.to_string();
            key(2)?;
            let entry = entry_or_seed(entries, &k, MockValue::Set(Vec::new()));
            let MockValue::Set(set) = &mut entry.value else {
                return Err(wrongtype());
            };
            let mut added = 0;
            for m in &args[2..] {
                if !set.contains(m) {
                    set.push(m.clone());
                    added += 1;
                }
            }
            Ok(json!(added))
        }
        "smembers" => {
            let k = key(1)?.to_string();
            if !prune(entries, &k) {
                return Ok(json!([]));
            }
            match &entries[&k].value {
                MockValue::Set(s) => Ok(json!(s)),
                _ => Err(wrongtype()),
            }
        }
        "scan" => {
            // Single-pass scan: everything comes back in one page and the
            // returned cursor is always "0".
            key(1)?;
            let mut pattern = "*".to_string();
            let mut rest = args.get(2..).unwrap_or_default().iter();
            while let Some(opt) = rest.next() {
                let val = rest
                    .next()
                    .ok_or_else(|| "ERR syntax error in 'scan'".to_string())?;
                match opt.to_ascii_lowercase().as_str() {
                    "match" => pattern = val.clone(),
                    "count" => {
                        val.parse::<u64>().map_err(|_| {
                            "ERR value is not an integer or out of range".to_string()
                        })?;
                    }
                    other => return Err(format!("ERR syntax error near '{}'", other)),
                }
            }
            let now = Instant::now();
            entries.retain(|_, e| e.expires_at.is_none_or(|t| t > now));
            let mut keys: Vec<&String> = entries
                .keys()
                .filter(|k| glob_match(&pattern, k))
                .collect();
            keys.sort();
            Ok(json!(["0", keys]))
        }
        other => Err(format!("ERR unknown command '{}'", other)),
    }
}

fn parse_index(raw: &str) -> Result<i64, String> {
    raw.parse()
        .map_err(|_| "ERR value is not an integer or out of range".to_string())
}

/// List-range normalization: negative indices count from the tail,
/// out-of-range bounds clamp, inverted ranges are empty.
fn range_bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let start = (if start < 0 { len + start } else { start }).max(0);
    let stop = (if stop < 0 { len + stop } else { stop }).min(len - 1);
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// `*`-only glob, enough for the patterns the core scans with.
fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = text;

    match rest.strip_prefix(parts[0]) {
        Some(r) => rest = r,
        None => return false,
    }
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(parts[parts.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_basics() {
        assert!(glob_match("user:username:*", "user:username:alice"));
        assert!(!glob_match("user:username:*", "user:email:a@b.c"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("rl:*:auth", "rl:10.0.0.1:auth"));
        assert!(!glob_match("rl:*:auth", "rl:10.0.0.1:dm"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }

    #[test]
    fn range_normalization() {
        assert_eq!(range_bounds(5, 0, 2), Some((0, 2)));
        assert_eq!(range_bounds(5, 0, 80), Some((0, 4)));
        assert_eq!(range_bounds(5, 0, -1), Some((0, 4)));
        assert_eq!(range_bounds(5, -2, -1), Some((3, 4)));
        assert_eq!(range_bounds(5, 3, 1), None);
        assert_eq!(range_bounds(0, 0, 10), None);
        assert_eq!(range_bounds(5, 7, 9), None);
    }
}
