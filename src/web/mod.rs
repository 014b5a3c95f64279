//! Live web search and summarization.
//!
//! `query -> top-K result URLs -> per-page text extraction -> one summary completion`.
//! Every stage failure ends in a fixed, user-facing sentence instead of an error.

mod extract;
mod fetcher;
mod provider;

pub use extract::extract_text;
pub use fetcher::HttpPageFetcher;
pub use provider::{
    create_provider, parse_brave_response, parse_duckduckgo_results, BraveSearch,
    DuckDuckGoSearch,
};

use crate::completion::{Completion, CompletionRequest, CompletionService};
use crate::config::{Prompts, WebSearchSettings};
use crate::context::Turn;
use crate::error::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Answer when the provider returned no URLs.
pub const NO_RESULTS: &str = "No relevant information found.";
/// Answer when none of the result pages yielded text.
pub const EXTRACTION_FAILED: &str = "Couldn't extract content from the search results.";
/// Answer when the provider or the summarization call failed.
pub const SEARCH_ERROR: &str = "Sorry, there was an error fetching search results.";

/// A search backend returning result URLs.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Retrieves raw page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Text extracted from one result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub url: String,
    pub text: String,
}

/// Generation parameters for the summary call.
#[derive(Debug, Clone, Copy)]
pub struct SummaryParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Runs the search, extract and summarize pipeline.
pub struct WebSummarizer {
    provider: Arc<dyn WebSearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    completion: Arc<dyn CompletionService>,
    prompts: Prompts,
    params: SummaryParams,
    result_limit: usize,
    page_timeout: Duration,
    max_page_chars: usize,
}

impl WebSummarizer {
    pub fn new(
        provider: Arc<dyn WebSearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        completion: Arc<dyn CompletionService>,
        settings: &WebSearchSettings,
        params: SummaryParams,
    ) -> Self {
        Self {
            provider,
            fetcher,
            completion,
            prompts: Prompts::default(),
            params,
            result_limit: settings.result_limit.max(1),
            page_timeout: Duration::from_secs(settings.page_timeout_secs),
            max_page_chars: settings.max_page_chars,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Search the web for `query` and return a spoken-style summary.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn summarize(&self, query: &str) -> String {
        let urls = match self.provider.search(query, self.result_limit).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Web search failed: {}", e);
                return SEARCH_ERROR.to_string();
            }
        };

        if urls.is_empty() {
            info!("No search results for {}", query);
            return NO_RESULTS.to_string();
        }

        let pages = self.extract_pages(&urls).await;
        if pages.is_empty() {
            info!("No readable content in {} result pages", urls.len());
            return EXTRACTION_FAILED.to_string();
        }

        debug!("Summarizing {} of {} pages", pages.len(), urls.len());

        match self.summarize_pages(query, &pages).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summarization failed: {}", e);
                SEARCH_ERROR.to_string()
            }
        }
    }

    /// Fetch and extract every result page concurrently, keeping the ones that succeed.
    async fn extract_pages(&self, urls: &[String]) -> Vec<PageText> {
        let fetches = urls.iter().take(self.result_limit).map(|url| async move {
            match self.fetcher.fetch(url, self.page_timeout).await {
                Ok(html) => {
                    let text = extract_text(&html, self.max_page_chars);
                    if text.is_empty() {
                        debug!("No text extracted from {}", url);
                        None
                    } else {
                        Some(PageText {
                            url: url.clone(),
                            text,
                        })
                    }
                }
                Err(e) => {
                    debug!("Skipping page: {}", e);
                    None
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    async fn summarize_pages(&self, query: &str, pages: &[PageText]) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        vars.insert("sources".to_string(), format_sources_for_prompt(pages));

        let user_prompt = self.prompts.render_with_custom(&self.prompts.summary.user, &vars);
        let system_prompt = Prompts::render(&self.prompts.summary.system, &self.prompts.variables);

        let request = CompletionRequest::plain(
            vec![Turn::system(system_prompt), Turn::user(user_prompt)],
            self.params.temperature,
            self.params.max_tokens,
        );

        match self.completion.complete(request).await? {
            Completion::Text(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(crate::error::VoxError::WebSearch(
                "Empty summary from model".to_string(),
            )),
        }
    }
}

/// Format extracted pages for the summary prompt, labeled by source URL.
pub fn format_sources_for_prompt(pages: &[PageText]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| format!("---\n[{}] Source: {}\n{}\n---", i + 1, page.url, page.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::ToolChoice;
    use crate::testing::{FakeFetcher, FakeSearchProvider, ScriptedCompletion};

    fn summarizer(
        provider: FakeSearchProvider,
        fetcher: FakeFetcher,
        completion: Arc<ScriptedCompletion>,
    ) -> WebSummarizer {
        WebSummarizer::new(
            Arc::new(provider),
            Arc::new(fetcher),
            completion,
            &WebSearchSettings::default(),
            SummaryParams {
                temperature: 0.3,
                max_tokens: 400,
            },
        )
    }

    fn html(body: &str) -> String {
        format!("<html><body><p>{}</p></body></html>", body)
    }

    #[tokio::test]
    async fn test_zero_results_skips_completion() {
        let completion = Arc::new(ScriptedCompletion::new());
        let web = summarizer(FakeSearchProvider::with_urls(vec![]), FakeFetcher::new(), completion.clone());

        assert_eq!(web.summarize("patch notes").await, "No relevant information found.");
        assert_eq!(completion.call_count(), 0);
    }

    #[tokio::test]
    async fn test_all_pages_fail() {
        let completion = Arc::new(ScriptedCompletion::new());
        let provider = FakeSearchProvider::with_urls(vec!["https://a.test", "https://b.test"]);
        let fetcher = FakeFetcher::new()
            .with_page("https://b.test", "<html><body><script>x()</script></body></html>");

        let web = summarizer(provider, fetcher, completion.clone());
        assert_eq!(web.summarize("patch notes").await, EXTRACTION_FAILED);
        assert_eq!(completion.call_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_summarizes_remaining_pages() {
        let completion = Arc::new(ScriptedCompletion::new().with_text("The patch adds a new region."));
        let provider = FakeSearchProvider::with_urls(vec!["https://a.test", "https://b.test", "https://c.test"]);
        let fetcher = FakeFetcher::new()
            .with_page("https://a.test", &html("Region opens Wednesday."))
            .with_page("https://c.test", &html("Two new characters."));

        let web = summarizer(provider, fetcher, completion.clone());
        assert_eq!(web.summarize("patch notes").await, "The patch adds a new region.");

        let requests = completion.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.tool_choice, ToolChoice::None);
        assert!(request.tools.is_empty());
        assert_eq!(request.messages[0].content(), Prompts::default().summary.system);

        let prompt = request.messages[1].content();
        assert!(prompt.contains("Query: patch notes"));
        assert!(prompt.contains("Source: https://a.test\nRegion opens Wednesday."));
        assert!(prompt.contains("Source: https://c.test\nTwo new characters."));
        assert!(!prompt.contains("https://b.test"));
    }

    #[tokio::test]
    async fn test_only_top_k_pages_are_fetched() {
        let completion = Arc::new(ScriptedCompletion::new().with_text("summary"));
        let provider = FakeSearchProvider::with_urls(vec![
            "https://1.test",
            "https://2.test",
            "https://3.test",
            "https://4.test",
        ]);
        let fetcher = Arc::new(
            FakeFetcher::new()
                .with_page("https://1.test", &html("one"))
                .with_page("https://4.test", &html("four")),
        );

        let web = WebSummarizer::new(
            Arc::new(provider),
            fetcher.clone(),
            completion.clone(),
            &WebSearchSettings::default(),
            SummaryParams {
                temperature: 0.3,
                max_tokens: 400,
            },
        );
        web.summarize("numbers").await;

        assert_eq!(fetcher.fetched().len(), 3);
        assert!(!completion.requests()[0].messages[1].content().contains("four"));
    }

    #[tokio::test]
    async fn test_summarization_error_is_recovered() {
        let completion = Arc::new(ScriptedCompletion::new().with_error("service unavailable"));
        let provider = FakeSearchProvider::with_urls(vec!["https://a.test"]);
        let fetcher = FakeFetcher::new().with_page("https://a.test", &html("content"));

        let web = summarizer(provider, fetcher, completion);
        assert_eq!(web.summarize("anything").await, SEARCH_ERROR);
    }

    #[tokio::test]
    async fn test_provider_error_is_recovered() {
        let completion = Arc::new(ScriptedCompletion::new());
        let web = summarizer(FakeSearchProvider::failing(), FakeFetcher::new(), completion.clone());

        assert_eq!(web.summarize("anything").await, SEARCH_ERROR);
        assert_eq!(completion.call_count(), 0);
    }
}
