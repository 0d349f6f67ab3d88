// Guard in front of the public contact, form and newsletter endpoints.
// Submissions are checked for spam first; only accepted submissions count
// against the per-client rate limit.

pub mod rate_limit;
pub mod spam;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::SubmissionConfig;
pub use rate_limit::RateLimiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Message,
    Form,
    Newsletter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub kind: SubmissionKind,
    pub email: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Any other posted fields, including the honeypot
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission rejected: {reason}")]
    Spam { reason: &'static str },

    #[error("message must be at least {min} characters")]
    TooShort { min: usize },

    #[error("too many submissions, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

pub struct SubmissionGuard {
    limiter: RateLimiter,
    max_links: usize,
    honeypot_field: String,
    min_message_length: usize,
}

impl SubmissionGuard {
    pub fn new(config: &SubmissionConfig) -> Self {
        Self {
            limiter: RateLimiter::new(
                config.rate_limit_requests,
                Duration::from_secs(config.rate_limit_window_secs),
            ),
            max_links: config.max_links,
            honeypot_field: config.honeypot_field.clone(),
            min_message_length: config.min_message_length,
        }
    }

    pub async fn check(&self, client_key: &str, submission: &Submission) -> Result<(), SubmissionError> {
        self.check_at(client_key, submission, Instant::now()).await
    }

    pub async fn check_at(
        &self,
        client_key: &str,
        submission: &Submission,
        now: Instant,
    ) -> Result<(), SubmissionError> {
        if let Err(err) = self.inspect(submission) {
            tracing::warn!("Rejected {:?} submission from {}: {}", submission.kind, client_key, err);
            return Err(err);
        }

        if let Err(retry_after_secs) = self.limiter.hit(client_key, now).await {
            tracing::warn!("Rate limited submission from {} ({}s left)", client_key, retry_after_secs);
            return Err(SubmissionError::RateLimited { retry_after_secs });
        }
        Ok(())
    }

    fn inspect(&self, submission: &Submission) -> Result<(), SubmissionError> {
        if spam::honeypot_filled(&submission.fields, &self.honeypot_field) {
            return Err(SubmissionError::Spam { reason: "honeypot field filled" });
        }

        let body = submission.body.as_deref().unwrap_or("").trim();
        let needs_body = submission.kind == SubmissionKind::Message;
        if (needs_body || !body.is_empty()) && body.chars().count() < self.min_message_length {
            return Err(SubmissionError::TooShort {
                min: self.min_message_length,
            });
        }

        if spam::count_links(body) > self.max_links {
            return Err(SubmissionError::Spam { reason: "too many links" });
        }
        Ok(())
    }
}
