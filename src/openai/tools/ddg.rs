//! DuckDuckGo web search tool.
//!
//! Fetches the key-less HTML results page (`html.duckduckgo.com/html/`) and
//! scrapes the organic results (ads skipped) into at most [`MAX_RESULTS`]
//! hits, rendered as `[snippet: ..., title: ..., link: ...]` entries joined
//! by `", "`.

use crate::openai::tools::core::{ToolDefinition, ToolKind, ToolParametersBuilder, issue_argument};
use crate::openai::tools::lookup::{LookupService, http_client};
use color_eyre::{Result, eyre::{WrapErr, eyre}};
use reqwest::Url;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 4;
const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchHit {
    snippet: String,
    title: String,
    link: String,
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| eyre!("invalid css selector {css:?}: {e}"))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Result links go through a `/l/?uddg=<target>` redirect; unwrap it.
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") { format!("https:{href}") } else { href.to_string() };
    match Url::parse(&absolute) {
        Ok(url) if url.path() == "/l/" => url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

fn parse_results(html: &str) -> Result<Vec<SearchHit>> {
    let doc = Html::parse_document(html);
    let result_sel = selector("div.result:not(.result--ad)")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let hits = doc
        .select(&result_sel)
        .filter_map(|result| {
            let anchor = result.select(&title_sel).next()?;
            let title = element_text(anchor);
            let link = resolve_link(anchor.value().attr("href")?);
            if title.is_empty() || link.is_empty() {
                return None;
            }
            let snippet = result.select(&snippet_sel).next().map(element_text).unwrap_or_default();
            Some(SearchHit { snippet, title, link })
        })
        .take(MAX_RESULTS)
        .collect();
    Ok(hits)
}

fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .map(|h| format!("[snippet: {}, title: {}, link: {}]", h.snippet, h.title, h.link))
        .collect::<Vec<_>>()
        .join(", ")
}

/// DuckDuckGo HTML search client.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client("Mozilla/5.0 (compatible; assistant_gpt_ddg_tool/0.1)")?,
            endpoint: endpoint.into(),
        })
    }
}

impl LookupService for DuckDuckGoSearch {
    fn search(&self, query: &str) -> Result<String> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .wrap_err("sending duckduckgo search request")?;

        let status = resp.status();
        let text = resp.text().wrap_err("reading duckduckgo response body")?;
        debug!(target: "tools", status = %status, len = text.len(), "ddg_response_raw");

        if !status.is_success() {
            return Err(eyre!("duckduckgo status {}: {}", status.as_u16(), text));
        }

        Ok(format_hits(&parse_results(&text)?))
    }
}

/// Build the `get_issue_from_ddg` tool on top of a web search service.
pub fn build_ddg_issue_tool(service: Arc<dyn LookupService>) -> ToolDefinition {
    let kind = ToolKind::IssueFromDdg;
    let parameters = ToolParametersBuilder::new_object()
        .add_string("issue", Some("The name of the issue"))
        .required("issue")
        .build();

    ToolDefinition::new(
        kind,
        "Use this tool to find the Issue using DuckDuckGoSearch",
        parameters,
        Arc::new(move |args: &Value| -> Result<String> {
            let issue = issue_argument(kind, args)?;
            service.search(issue)
        }),
    )
}
