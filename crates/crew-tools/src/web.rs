//! Web lookup tools
//!
//! - [`SerperSearchTool`] (`serper_dev_tool`): Google results through the Serper API
//! - [`WebsiteSearchTool`] (`website_search_tool`): fetch a page and return the
//!   passages that mention the query

use crate::tool::{Tool, required_str};
use async_trait::async_trait;
use crew_core::{Error, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
const SERPER_KEY_ENV: &str = "SERPER_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RESULTS: u64 = 10;
const MAX_PASSAGES: usize = 8;

/// Elements whose text forms one passage
const PASSAGE_TAGS: &[&str] = &[
    "p", "li", "h1", "h2", "h3", "h4", "h5", "h6", "td", "th", "dt", "dd", "blockquote", "pre", "div",
];

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Processing(format!("failed to build HTTP client: {e}")))
}

/// Web search via the Serper API
///
/// The API key is read from `SERPER_API_KEY` when the tool runs unless one
/// was set explicitly, so building a registry never needs credentials.
pub struct SerperSearchTool {
    api_key: Option<String>,
    endpoint: String,
    timeout_secs: u64,
}

impl Default for SerperSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SerperSearchTool {
    /// Create the tool with default settings
    pub fn new() -> Self {
        Self {
            api_key: None,
            endpoint: SERPER_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Use an explicit API key instead of the environment
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point the tool at a different endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn api_key(&self) -> Result<String> {
        match &self.api_key {
            Some(key) => Ok(key.clone()),
            None => std::env::var(SERPER_KEY_ENV).map_err(|_| {
                Error::Processing(format!("{SERPER_KEY_ENV} environment variable not set"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

fn format_results(query: &str, results: &[SerperResult]) -> String {
    if results.is_empty() {
        return format!("No search results found for '{query}'.");
    }
    let mut out = format!("Search results for '{query}':\n");
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n   {}\n   {}\n", i + 1, r.title, r.link, r.snippet));
    }
    out
}

#[async_trait]
impl Tool for SerperSearchTool {
    #[instrument(skip(self, params), fields(tool = "serper_dev_tool"))]
    async fn execute(&self, params: Value) -> Result<String> {
        let query = required_str(&params, "search_query")?;
        let limit = params
            .get("n_results")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_RESULTS);

        let response = http_client(self.timeout_secs)?
            .post(&self.endpoint)
            .header("X-API-KEY", self.api_key()?)
            .json(&json!({ "q": query, "num": limit }))
            .send()
            .await
            .map_err(|e| Error::Processing(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Processing(format!("search failed with HTTP {status}: {body}")));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| Error::Processing(format!("unexpected search response: {e}")))?;
        debug!(results = parsed.organic.len(), "Search completed");

        Ok(format_results(query, &parsed.organic))
    }

    fn name(&self) -> &str {
        "serper_dev_tool"
    }

    fn description(&self) -> &str {
        "Search the internet with a query and return titles, links and snippets of the top results."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "search_query": { "type": "string", "description": "What to search the internet for" },
                "n_results": { "type": "integer", "description": "How many results to return" }
            },
            "required": ["search_query"]
        })
    }
}

/// Search the text of a single web page
pub struct WebsiteSearchTool {
    timeout_secs: u64,
}

impl Default for WebsiteSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebsiteSearchTool {
    /// Create the tool with default settings
    pub fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Reduce an HTML document to passages of visible text
///
/// Each innermost block element yields one passage with its whitespace
/// collapsed; blocks that contain other blocks are left to their children.
fn html_to_passages(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&PASSAGE_TAGS.join(", "))
        .map_err(|e| Error::Processing(format!("invalid passage selector: {e}")))?;

    let passages = document
        .select(&selector)
        .filter(|element| {
            !element
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .any(|child| PASSAGE_TAGS.contains(&child.value().name()))
        })
        .map(|element| element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
        .filter(|passage| !passage.is_empty())
        .collect();
    Ok(passages)
}

/// Passages sharing at least one term with the query, best matches first
fn rank_passages(passages: &[String], query: &str) -> Vec<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect();

    let mut scored: Vec<(usize, usize, &String)> = passages
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let lower = p.to_lowercase();
            let score = terms.iter().filter(|t| lower.contains(t.as_str())).count();
            (score > 0).then_some((score, i, p))
        })
        .collect();

    // Higher score first, document order within a score
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(MAX_PASSAGES)
        .map(|(_, _, p)| p.clone())
        .collect()
}

#[async_trait]
impl Tool for WebsiteSearchTool {
    #[instrument(skip(self, params), fields(tool = "website_search_tool"))]
    async fn execute(&self, params: Value) -> Result<String> {
        let url = required_str(&params, "website")?;
        let query = required_str(&params, "search_query")?;

        let response = http_client(self.timeout_secs)?
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Processing(format!("failed to fetch {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Processing(format!(
                "failed to fetch {url}: HTTP {}",
                response.status()
            )));
        }
        let html = response
            .text()
            .await
            .map_err(|e| Error::Processing(format!("failed to read {url}: {e}")))?;

        let passages = html_to_passages(&html)?;
        let matches = rank_passages(&passages, query);
        debug!(passages = passages.len(), matches = matches.len(), "Page searched");

        if matches.is_empty() {
            return Ok(format!("No passages on {url} matched '{query}'."));
        }
        Ok(format!(
            "Relevant passages from {url} for '{query}':\n\n{}",
            matches.join("\n\n")
        ))
    }

    fn name(&self) -> &str {
        "website_search_tool"
    }

    fn description(&self) -> &str {
        "Fetch a specific website and return the passages of its text most relevant to a query."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "website": { "type": "string", "description": "Full URL of the page to search" },
                "search_query": { "type": "string", "description": "What to look for on the page" }
            },
            "required": ["website", "search_query"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_passages_strips_markup() {
        let html = r#"<html><head><style>p { color: red }</style><script>var x = 1;</script></head>
<body><h1>Port Report</h1><p>Shipping traffic &amp; fuel prices rose.</p><div>Unrelated&nbsp;note</div></body></html>"#;

        let passages = html_to_passages(html).unwrap();
        assert!(passages.contains(&"Port Report".to_string()));
        assert!(passages.contains(&"Shipping traffic & fuel prices rose.".to_string()));
        assert!(passages.contains(&"Unrelated note".to_string()));
        assert!(passages.iter().all(|p| !p.contains("var x") && !p.contains("color")));
    }

    #[test]
    fn test_html_to_passages_decodes_entities_and_joins_lines() {
        let html = "<p>Tanker&#39;s route &lt;Hormuz&gt; &quot;closed&quot;</p><p>a <b>split</b>\nline</p>";

        assert_eq!(
            html_to_passages(html).unwrap(),
            vec!["Tanker's route <Hormuz> \"closed\"", "a split line"]
        );
    }

    #[test]
    fn test_html_to_passages_prefers_innermost_blocks() {
        let html = "<div><ul><li>First item</li><li>Second <em>item</em></li></ul></div><div>Loose text</div>";

        assert_eq!(
            html_to_passages(html).unwrap(),
            vec!["First item", "Second item", "Loose text"]
        );
    }

    #[test]
    fn test_rank_passages_orders_by_overlap() {
        let passages = vec![
            "Fuel prices were stable".to_string(),
            "Nothing to see".to_string(),
            "Shipping fuel prices rose sharply".to_string(),
        ];
        let ranked = rank_passages(&passages, "shipping fuel prices");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0], "Shipping fuel prices rose sharply");
    }

    #[test]
    fn test_format_results() {
        assert!(format_results("q", &[]).starts_with("No search results"));

        let results = vec![SerperResult {
            title: "Title".into(),
            link: "https://example.com".into(),
            snippet: "Snippet".into(),
        }];
        let text = format_results("q", &results);
        assert!(text.contains("1. Title"));
        assert!(text.contains("https://example.com"));
    }

    #[tokio::test]
    async fn test_serper_requires_query() {
        let tool = SerperSearchTool::new().with_api_key("k");
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("search_query"));
    }

    #[test]
    fn test_schemas_are_objects() {
        for schema in [
            SerperSearchTool::new().input_schema(),
            WebsiteSearchTool::new().input_schema(),
        ] {
            assert_eq!(schema["type"], "object");
        }
    }
}
