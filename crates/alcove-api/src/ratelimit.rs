use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use alcove_kv::{KvClient, KvError};

use crate::error::ApiError;

/// Fixed-window counter on `rl:{client}:{bucket}`. The increment that
/// creates the key (post-increment value 1) owns setting the window expiry;
/// atomic `incr` guarantees exactly one caller sees 1. A crash between
/// `incr` and `expire` leaves a non-expiring counter: accepted soft-fail,
/// the key is eventually overwritten or reaped out of band.
pub async fn allow(
    kv: &KvClient,
    client: &str,
    bucket: &str,
    limit: i64,
    window_secs: u64,
) -> Result<bool, KvError> {
    let key = format!("rl:{}:{}", client, bucket);
    let count = kv.incr(&key).await?;
    if count == 1 {
        kv.expire(&key, window_secs).await?;
    }
    Ok(count <= limit)
}

pub async fn require(
    kv: &KvClient,
    client: &str,
    bucket: &str,
    limit: i64,
    window_secs: u64,
) -> Result<(), ApiError> {
    if allow(kv, client, bucket, limit, window_secs).await? {
        Ok(())
    } else {
        Err(ApiError::RateLimited)
    }
}

/// Rate-limit identity of the caller: first `X-Forwarded-For` entry, else
/// the peer address, else `"unknown"`.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return Ok(ClientIp(ip.to_string()));
        }

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}
