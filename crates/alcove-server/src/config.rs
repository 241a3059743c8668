use anyhow::{Context, Result};

/// Process configuration, read from the environment exactly once at startup
/// and handed to components by value. Nothing below `main` touches env vars.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub kv_url: String,
    pub kv_token: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub site_name: String,
    pub site_domain: String,
}

fn required(key: &str) -> Result<String> {
    let value = std::env::var(key).with_context(|| format!("{} is required", key))?;
    let value = value.trim().to_string();
    anyhow::ensure!(!value.is_empty(), "{} is required", key);
    Ok(value)
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: optional("ALCOVE_HOST", "0.0.0.0"),
            port: optional("ALCOVE_PORT", "3000")
                .parse()
                .context("ALCOVE_PORT must be a port number")?,
            kv_url: required("ALCOVE_KV_URL")?,
            kv_token: required("ALCOVE_KV_TOKEN")?,
            mail_api_url: optional("ALCOVE_MAIL_API_URL", "https://api.resend.com"),
            mail_api_key: required("ALCOVE_MAIL_API_KEY")?,
            site_name: optional("ALCOVE_SITE_NAME", "alcove"),
            site_domain: optional("ALCOVE_SITE_DOMAIN", "alcove.app"),
        })
    }

    /// Sender identity for outbound registration mail.
    pub fn mail_from(&self) -> String {
        format!("{} <auth@{}>", self.site_name, self.site_domain)
    }
}
