//! Typed accessors for the domain records the core keeps in the store.
//!
//! The store has no schema: these helpers own the key layout and the JSON
//! (de)serialization. A record that fails to parse is logged and treated as
//! absent, so read paths tolerate partial writes instead of propagating
//! corruption.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use alcove_types::models::{DmMessage, PendingRegistration, User};

use crate::{KvClient, KvError, Result};

fn user_key(email: &str) -> String {
    format!("user:email:{}", email)
}

fn username_key(username: &str) -> String {
    format!("user:username:{}", username)
}

fn pending_key(email: &str) -> String {
    format!("pending:{}", email)
}

fn session_key(token: &str) -> String {
    format!("sess:{}", token)
}

fn user_sessions_key(email: &str) -> String {
    format!("sess:user:{}", email)
}

fn thread_seq_key(thread_id: &str) -> String {
    format!("dm:seq:{}", thread_id)
}

fn message_key(thread_id: &str, id: i64) -> String {
    format!("dm:msg:{}:{}", thread_id, id)
}

fn thread_list_key(thread_id: &str) -> String {
    format!("dm:list:{}", thread_id)
}

fn user_threads_key(email: &str) -> String {
    format!("dm:threads:{}", email)
}

fn parse_record<T: DeserializeOwned>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("unparsable record at {}: {}", key, e);
            None
        }
    }
}

fn encode_record<T: Serialize>(record: &T) -> Result<String> {
    serde_json::to_string(record).map_err(|e| KvError::Protocol(format!("encode failed: {}", e)))
}

impl KvClient {
    // -- Users --

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let key = user_key(email);
        Ok(parse_record(&key, self.get(&key).await?))
    }

    pub async fn put_user(&self, user: &User) -> Result<()> {
        self.set(&user_key(&user.email), &encode_record(user)?, None)
            .await
    }

    pub async fn email_for_username(&self, username: &str) -> Result<Option<String>> {
        self.get(&username_key(username)).await
    }

    pub async fn bind_username(&self, username: &str, email: &str) -> Result<()> {
        self.set(&username_key(username), email, None).await
    }

    pub async fn unbind_username(&self, username: &str) -> Result<()> {
        self.del(&username_key(username)).await?;
        Ok(())
    }

    // -- Pending registrations --

    pub async fn pending_registration(&self, email: &str) -> Result<Option<PendingRegistration>> {
        let key = pending_key(email);
        Ok(parse_record(&key, self.get(&key).await?))
    }

    pub async fn put_pending_registration(
        &self,
        email: &str,
        pending: &PendingRegistration,
        ttl_secs: u64,
    ) -> Result<()> {
        self.set(&pending_key(email), &encode_record(pending)?, Some(ttl_secs))
            .await
    }

    pub async fn delete_pending_registration(&self, email: &str) -> Result<()> {
        self.del(&pending_key(email)).await?;
        Ok(())
    }

    // -- Sessions --

    pub async fn session_email(&self, token: &str) -> Result<Option<String>> {
        self.get(&session_key(token)).await
    }

    pub async fn put_session(&self, token: &str, email: &str, ttl_secs: u64) -> Result<()> {
        self.set(&session_key(token), email, Some(ttl_secs)).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<()> {
        self.del(&session_key(token)).await?;
        Ok(())
    }

    pub async fn add_user_session(&self, email: &str, token: &str) -> Result<()> {
        self.sadd(&user_sessions_key(email), token).await?;
        Ok(())
    }

    /// Enumeration hint only: members may be orphaned (entry expired) and a
    /// live session may be missing from the set. Validity is always decided
    /// by [`KvClient::session_email`].
    pub async fn user_sessions(&self, email: &str) -> Result<Vec<String>> {
        self.smembers(&user_sessions_key(email)).await
    }

    pub async fn clear_user_sessions(&self, email: &str) -> Result<()> {
        self.del(&user_sessions_key(email)).await?;
        Ok(())
    }

    // -- DM threads --

    pub async fn add_thread(&self, email: &str, thread_id: &str) -> Result<()> {
        self.sadd(&user_threads_key(email), thread_id).await?;
        Ok(())
    }

    /// Next strictly-increasing message id for the thread, starting at 1.
    pub async fn next_message_id(&self, thread_id: &str) -> Result<i64> {
        self.incr(&thread_seq_key(thread_id)).await
    }

    pub async fn put_message(&self, thread_id: &str, message: &DmMessage) -> Result<()> {
        self.set(
            &message_key(thread_id, message.id),
            &encode_record(message)?,
            None,
        )
        .await
    }

    pub async fn message(&self, thread_id: &str, id: i64) -> Result<Option<DmMessage>> {
        let key = message_key(thread_id, id);
        Ok(parse_record(&key, self.get(&key).await?))
    }

    pub async fn push_message_id(&self, thread_id: &str, id: i64) -> Result<()> {
        self.lpush(&thread_list_key(thread_id), &id.to_string())
            .await?;
        Ok(())
    }

    /// Trim the per-thread id list to its `keep + 1` most recent entries.
    pub async fn trim_message_ids(&self, thread_id: &str, keep: i64) -> Result<()> {
        self.ltrim(&thread_list_key(thread_id), 0, keep).await
    }

    /// The `window + 1` most recent message ids, newest first. Entries that
    /// are not integers are dropped.
    pub async fn recent_message_ids(&self, thread_id: &str, window: i64) -> Result<Vec<i64>> {
        let raw = self.lrange(&thread_list_key(thread_id), 0, window).await?;
        Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
    }
}
