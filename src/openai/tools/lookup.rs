//! Lookup services: free-text query in, free-text findings out.

use color_eyre::{Result, eyre::WrapErr};
use reqwest::blocking::Client;
use std::time::Duration;

/// External search/reference collaborator used by the issue tools.
///
/// Implementations block; the registry runs them on tokio's blocking pool.
pub trait LookupService: Send + Sync {
    fn search(&self, query: &str) -> Result<String>;
}

impl<F> LookupService for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn search(&self, query: &str) -> Result<String> {
        self(query)
    }
}

/// Shared blocking HTTP client for the lookup services.
pub(crate) fn http_client(user_agent: &str) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(15))
        .build()
        .wrap_err("building reqwest client")
}

/// Truncate to at most `max` characters (not bytes).
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
