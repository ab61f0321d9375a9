//! Wikipedia reference lookup tool.
//!
//! Two MediaWiki API calls: a full-text search for the top [`TOP_K`] titles,
//! then the plain-text intro extract of each. Output is
//! `Page: {title}\nSummary: {extract}` blocks separated by a blank line.

use crate::openai::tools::core::{ToolDefinition, ToolKind, ToolParametersBuilder, issue_argument};
use crate::openai::tools::lookup::{LookupService, http_client, truncate_chars};
use color_eyre::{Result, eyre::WrapErr};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const TOP_K: usize = 3;
const MAX_QUERY_CHARS: usize = 300;
const MAX_OUTPUT_CHARS: usize = 4000;
const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    query: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

/// Render pages in search order; titles without an extract are skipped.
fn format_pages(titles: &[String], pages: &[Page]) -> String {
    let blocks: Vec<String> = titles
        .iter()
        .filter_map(|title| {
            pages
                .iter()
                .find(|p| &p.title == title)
                .and_then(|p| p.extract.as_deref())
                .filter(|e| !e.trim().is_empty())
                .map(|extract| format!("Page: {title}\nSummary: {}", extract.trim()))
        })
        .collect();

    if blocks.is_empty() {
        return NO_RESULTS.to_string();
    }
    truncate_chars(&blocks.join("\n\n"), MAX_OUTPUT_CHARS).to_string()
}

/// MediaWiki API client for one language edition.
#[derive(Debug, Clone)]
pub struct WikipediaSearch {
    client: Client,
    endpoint: String,
}

impl WikipediaSearch {
    pub fn new(lang: &str) -> Result<Self> {
        Self::with_endpoint(format!("https://{lang}.wikipedia.org/w/api.php"))
    }

    /// Any MediaWiki `api.php` URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client("assistant_gpt_wikipedia_tool/0.1")?,
            endpoint: endpoint.into(),
        })
    }

    fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Option<T>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .wrap_err("sending wikipedia request")?;

        let status = resp.status();
        let text = resp.text().wrap_err("reading wikipedia response body")?;
        debug!(target: "tools", status = %status, len = text.len(), "wikipedia_response_raw");

        if !status.is_success() {
            return Err(color_eyre::eyre::eyre!("wikipedia status {}: {}", status.as_u16(), text));
        }
        let parsed: ApiResponse<T> =
            serde_json::from_str(&text).wrap_err("parsing wikipedia response")?;
        Ok(parsed.query)
    }
}

impl LookupService for WikipediaSearch {
    fn search(&self, query: &str) -> Result<String> {
        let query = truncate_chars(query, MAX_QUERY_CHARS);
        let limit = TOP_K.to_string();
        let titles: Vec<String> = self
            .get::<SearchQuery>(&[("list", "search"), ("srsearch", query), ("srlimit", limit.as_str())])?
            .map(|q| q.search.into_iter().map(|e| e.title).collect())
            .unwrap_or_default();

        if titles.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        let joined = titles.join("|");
        let pages = self
            .get::<PagesQuery>(&[
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", limit.as_str()),
                ("titles", joined.as_str()),
            ])?
            .map(|q| q.pages)
            .unwrap_or_default();

        Ok(format_pages(&titles, &pages))
    }
}

/// Build the `get_issue_from_wikipedia` tool on top of a reference service.
pub fn build_wikipedia_issue_tool(service: Arc<dyn LookupService>) -> ToolDefinition {
    let kind = ToolKind::IssueFromWikipedia;
    let parameters = ToolParametersBuilder::new_object()
        .add_string("issue", Some("The name of the issue"))
        .required("issue")
        .build();

    ToolDefinition::new(
        kind,
        "Use this tool to find the Issue using Wikipedia",
        parameters,
        Arc::new(move |args: &Value| -> Result<String> {
            let issue = issue_argument(kind, args)?;
            service.search(issue)
        }),
    )
}
