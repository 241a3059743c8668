//! Raw store commands, one HTTP round trip each.

use serde_json::Value;

use crate::{KvClient, KvError, Result, as_int, as_opt_string, as_string_array};

impl KvClient {
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        as_opt_string(self.command(&["get", key]).await?)
    }

    /// `SET`, optionally with an `EX <seconds>` expiry. A set without a TTL
    /// clears any existing expiry on the key.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()> {
        match ttl_secs {
            Some(secs) => {
                self.command(&["set", key, value, "EX", &secs.to_string()])
                    .await?
            }
            None => self.command(&["set", key, value]).await?,
        };
        Ok(())
    }

    /// Atomic increment; the store guarantees each caller a distinct value.
    pub async fn incr(&self, key: &str) -> Result<i64> {
        as_int(&self.command(&["incr", key]).await?)
    }

    /// Returns whether the key existed and got an expiry.
    pub async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool> {
        let v = self
            .command(&["expire", key, &ttl_secs.to_string()])
            .await?;
        Ok(as_int(&v)? == 1)
    }

    /// Returns the number of keys removed.
    pub async fn del(&self, key: &str) -> Result<i64> {
        as_int(&self.command(&["del", key]).await?)
    }

    /// Push to the head of a list; returns the new length.
    pub async fn lpush(&self, key: &str, value: &str) -> Result<i64> {
        as_int(&self.command(&["lpush", key, value]).await?)
    }

    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        as_string_array(
            self.command(&["lrange", key, &start.to_string(), &stop.to_string()])
                .await?,
        )
    }

    pub async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        self.command(&["ltrim", key, &start.to_string(), &stop.to_string()])
            .await?;
        Ok(())
    }

    /// Add to a set; returns the number of members actually added.
    pub async fn sadd(&self, key: &str, member: &str) -> Result<i64> {
        as_int(&self.command(&["sadd", key, member]).await?)
    }

    pub async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        as_string_array(self.command(&["smembers", key]).await?)
    }

    /// Cursor-based key scan. Returns `(next_cursor, keys)`; a next cursor
    /// of `"0"` means the iteration is complete.
    pub async fn scan(
        &self,
        cursor: &str,
        pattern: &str,
        count: u64,
    ) -> Result<(String, Vec<String>)> {
        let reply = self
            .command(&["scan", cursor, "match", pattern, "count", &count.to_string()])
            .await?;
        let Value::Array(mut parts) = reply else {
            return Err(KvError::Protocol(format!("bad scan reply: {}", reply)));
        };
        let (Some(keys), Some(cursor)) = (parts.pop(), parts.pop()) else {
            return Err(KvError::Protocol(format!("bad scan reply: {:?}", parts)));
        };
        if !parts.is_empty() {
            return Err(KvError::Protocol(format!("bad scan reply: {:?}", parts)));
        }
        let keys = as_string_array(keys)?;
        let next = as_opt_string(cursor)?
            .ok_or_else(|| KvError::Protocol("scan cursor missing".into()))?;
        Ok((next, keys))
    }
}
