use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail provider rejected the send (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Client for an HTTP email API (`POST {base}/emails` with a bearer key).
/// Delivery failure is a hard error for the caller; there is no queueing or
/// retry here.
#[derive(Debug, Clone)]
pub struct Mailer {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn new(base: Url, api_key: impl Into<String>, from: impl Into<String>) -> Self {
        let mut endpoint = base;
        if let Ok(mut segments) = endpoint.path_segments_mut() {
            segments.pop_if_empty().push("emails");
        }
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key: api_key.into(),
            from: from.into(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&SendEmailBody {
                from: &self.from,
                to,
                subject,
                html,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
