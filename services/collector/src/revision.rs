//! Upstream revision timestamp
//!
//! The revisions endpoint returns a list of commits, newest first. The
//! author date of the first entry marks when the source files last changed.

use crate::error::{FetchError, Result};
use crate::source::RemoteSource;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct RevisionEntry {
    commit: RevisionCommit,
}

#[derive(Debug, Deserialize)]
struct RevisionCommit {
    author: RevisionAuthor,
}

#[derive(Debug, Deserialize)]
struct RevisionAuthor {
    date: DateTime<Utc>,
}

/// Read the newest revision time out of a revisions listing
pub fn parse_latest_revision(body: &str) -> Result<DateTime<Utc>> {
    let entries: Vec<RevisionEntry> = serde_json::from_str(body)?;
    entries
        .into_iter()
        .next()
        .map(|e| e.commit.author.date)
        .ok_or_else(|| FetchError::NotFound("empty revision list".to_string()))
}

/// Newest upstream revision, or `None` when it cannot be resolved
pub async fn latest_revision(remote: &dyn RemoteSource, url: &str) -> Option<DateTime<Utc>> {
    let body = match remote.fetch_text(url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("revision lookup failed: {}", e);
            return None;
        }
    };
    match parse_latest_revision(&body) {
        Ok(at) => Some(at),
        Err(e) => {
            warn!("revision listing unreadable: {}", e);
            None
        }
    }
}
