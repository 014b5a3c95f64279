//! Scripted fakes for the external services, used by unit tests.

use crate::completion::{Completion, CompletionRequest, CompletionService, FragmentStream};
use crate::error::{Result, VoxError};
use crate::tools::{ImageHit, ImageSearch, ToolInvocation, VideoHit, VideoSearch};
use crate::web::{PageFetcher, WebSearchProvider};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Tool(ToolInvocation),
    Empty,
    Error(String),
    Stream(Vec<String>),
    StreamError(Vec<String>, String),
}

/// Completion service that replays queued responses in order.
#[derive(Default)]
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(CompletionRequest, bool)>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, item: Scripted) -> Self {
        self.script.lock().unwrap().push_back(item);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.push(Scripted::Text(text.to_string()))
    }

    pub fn with_tool(self, name: &str, arguments: &str) -> Self {
        self.push(Scripted::Tool(ToolInvocation::new(name, arguments)))
    }

    pub fn with_empty(self) -> Self {
        self.push(Scripted::Empty)
    }

    pub fn with_error(self, message: &str) -> Self {
        self.push(Scripted::Error(message.to_string()))
    }

    pub fn with_stream(self, fragments: &[&str]) -> Self {
        self.push(Scripted::Stream(fragments.iter().map(|s| s.to_string()).collect()))
    }

    pub fn with_stream_error(self, fragments: &[&str], message: &str) -> Self {
        self.push(Scripted::StreamError(
            fragments.iter().map(|s| s.to_string()).collect(),
            message.to_string(),
        ))
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    /// Whether each request was made through the streaming entry point.
    pub fn streamed_flags(&self) -> Vec<bool> {
        self.requests.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: CompletionRequest, streamed: bool) -> Option<Scripted> {
        self.requests.lock().unwrap().push((request, streamed));
        self.script.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        match self.next(request, false) {
            Some(Scripted::Text(text)) => Ok(Completion::Text(text)),
            Some(Scripted::Tool(invocation)) => Ok(Completion::ToolInvocation(invocation)),
            Some(Scripted::Empty) => Ok(Completion::Empty),
            Some(Scripted::Error(message)) => Err(VoxError::OpenAI(message)),
            other => Err(VoxError::Completion(format!("unexpected batched call, script had {:?}", other))),
        }
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream> {
        match self.next(request, true) {
            Some(Scripted::Stream(fragments)) => {
                Ok(futures::stream::iter(fragments.into_iter().map(Ok)).boxed())
            }
            Some(Scripted::StreamError(fragments, message)) => {
                let items = fragments
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(VoxError::OpenAI(message))));
                Ok(futures::stream::iter(items).boxed())
            }
            Some(Scripted::Error(message)) => Err(VoxError::OpenAI(message)),
            other => Err(VoxError::Completion(format!("unexpected streaming call, script had {:?}", other))),
        }
    }
}

/// Image search returning fixed paths or a status failure.
pub struct FakeImageSearch {
    result: std::result::Result<Vec<String>, u16>,
    queries: Mutex<Vec<String>>,
}

impl FakeImageSearch {
    pub fn with_paths(paths: Vec<&str>) -> Self {
        Self {
            result: Ok(paths.into_iter().map(str::to_string).collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_status(status: u16) -> Self {
        Self {
            result: Err(status),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSearch for FakeImageSearch {
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.result {
            Ok(paths) => Ok(paths.iter().map(|p| ImageHit { path: p.clone() }).collect()),
            Err(status) => Err(VoxError::UpstreamStatus {
                service: "image search".to_string(),
                status: *status,
            }),
        }
    }
}

/// Video search returning fixed hits or a status failure.
pub struct FakeVideoSearch {
    result: std::result::Result<Vec<VideoHit>, u16>,
}

impl FakeVideoSearch {
    pub fn with_hits(hits: Vec<(&str, &str)>) -> Self {
        Self {
            result: Ok(hits
                .into_iter()
                .map(|(id, title)| VideoHit {
                    id: id.to_string(),
                    title: title.to_string(),
                })
                .collect()),
        }
    }

    pub fn failing_status(status: u16) -> Self {
        Self { result: Err(status) }
    }
}

#[async_trait]
impl VideoSearch for FakeVideoSearch {
    async fn search(&self, _query: &str) -> Result<Vec<VideoHit>> {
        match &self.result {
            Ok(hits) => Ok(hits.clone()),
            Err(status) => Err(VoxError::UpstreamStatus {
                service: "video search".to_string(),
                status: *status,
            }),
        }
    }
}

/// Web search provider returning fixed URLs (ignores the limit).
pub struct FakeSearchProvider {
    urls: Option<Vec<String>>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearchProvider {
    pub fn with_urls(urls: Vec<&str>) -> Self {
        Self {
            urls: Some(urls.into_iter().map(str::to_string).collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            urls: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearchProvider for FakeSearchProvider {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.urls
            .clone()
            .ok_or_else(|| VoxError::WebSearch("provider unavailable".to_string()))
    }
}

/// Page fetcher serving canned HTML; unknown URLs fail.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| VoxError::PageFetch(format!("{}: connection refused", url)))
    }
}
