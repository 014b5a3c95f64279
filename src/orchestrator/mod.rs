//! Conversational orchestration engine.
//!
//! Routes each user turn to one of three response strategies:
//!
//! - **Web search**: skip the model, summarize live web results.
//! - **Batched**: one structured completion that may carry a media tool call.
//! - **Streaming**: fragments forwarded to the caller as they arrive.
//!
//! The conversation lives behind a single async mutex. A turn holds the lock
//! from the moment its request is built until its answer is committed, so
//! turns never interleave. Every strategy commits exactly one user turn and
//! one assistant turn.

mod batched;
mod streaming;

pub use streaming::ResponseStream;

use crate::completion::{CompletionRequest, CompletionService, OpenAICompletion};
use crate::config::{Prompts, Settings};
use crate::context::{ContextStore, Turn};
use crate::error::{Result, VoxError};
use crate::router::{IntentRouter, Route};
use crate::tools::{ImageSearch, ToolRegistry, VideoSearch, WallhavenClient, YoutubeClient};
use crate::web::{
    create_provider, HttpPageFetcher, PageFetcher, SummaryParams, WebSearchProvider, WebSummarizer,
};
use async_trait::async_trait;
use batched::BatchedResponder;
use futures::StreamExt;
use std::sync::Arc;
use streaming::StreamingResponder;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument};

/// Answer when the completion service cannot be reached.
pub const SERVER_DOWN: &str = "I'm sorry, it seems like the server is down. Please try again later.";
/// Answer when the model asks for a tool that does not exist.
pub const UNKNOWN_TOOL: &str = "I'm sorry, I couldn't complete that request. Please try asking again.";

/// The assistant's answer to one user turn.
pub enum AssistantOutput {
    /// A complete answer, already committed to the conversation.
    Text(String),
    /// A live answer, committed once the stream has been drained.
    Stream(ResponseStream),
}

impl AssistantOutput {
    /// `"text"` or `"stream"`.
    pub fn mode(&self) -> &'static str {
        match self {
            AssistantOutput::Text(_) => "text",
            AssistantOutput::Stream(_) => "stream",
        }
    }

    /// Drain the output into a single string.
    pub async fn into_text(self) -> String {
        match self {
            AssistantOutput::Text(text) => text,
            AssistantOutput::Stream(stream) => stream.collect::<Vec<_>>().await.concat(),
        }
    }
}

impl std::fmt::Debug for AssistantOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssistantOutput::Text(text) => f.debug_tuple("Text").field(text).finish(),
            AssistantOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// External services the orchestrator depends on.
pub struct Services {
    pub completion: Arc<dyn CompletionService>,
    pub images: Arc<dyn ImageSearch>,
    pub videos: Arc<dyn VideoSearch>,
    pub search: Arc<dyn WebSearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
}

impl Services {
    /// Build the HTTP-backed services described by the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            completion: Arc::new(OpenAICompletion::new(&settings.completion)?),
            images: Arc::new(WallhavenClient::new(&settings.tools)?),
            videos: Arc::new(YoutubeClient::new(&settings.tools)?),
            search: create_provider(&settings.web_search)?,
            fetcher: Arc::new(HttpPageFetcher::new(&settings.web_search.user_agent)?),
        })
    }
}

/// Shared, immutable state used by every response strategy.
pub(crate) struct TurnResources {
    completion: Arc<dyn CompletionService>,
    tools: ToolRegistry,
    web: WebSummarizer,
    router: IntentRouter,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    hedge_window_chars: usize,
}

impl TurnResources {
    /// System instruction, history and the new user turn, with the route's tool mode.
    fn build_request(&self, history: &[Turn], user_text: &str, route: Route) -> CompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Turn::system(self.system_prompt.clone()));
        messages.extend(history.iter().cloned());
        messages.push(Turn::user(user_text));

        CompletionRequest {
            messages,
            tools: self.tools.descriptors().to_vec(),
            tool_choice: route.tool_choice(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Whether a direct answer must be replaced by a web search.
    ///
    /// Hedging is checked first, then missing content.
    fn needs_web_fallback(&self, answer: &str) -> bool {
        self.router.is_hedging(answer) || answer.trim().is_empty()
    }

    /// Answer the user turn from the web.
    async fn web_answer(&self, user_text: &str) -> String {
        self.web.summarize(&self.router.search_query(user_text)).await
    }
}

/// A user turn that holds the conversation lock until it is committed.
pub(crate) struct PendingTurn {
    context: OwnedMutexGuard<ContextStore>,
    user_text: String,
}

impl PendingTurn {
    fn history(&self) -> Vec<Turn> {
        self.context.snapshot()
    }

    fn user_text(&self) -> &str {
        &self.user_text
    }

    /// Append the exchange and release the lock.
    fn commit(self, answer: &str) {
        let PendingTurn {
            mut context,
            user_text,
        } = self;
        context.record_exchange(Turn::user(user_text), Turn::assistant(answer));
    }
}

/// A strategy that turns a pending user turn into an answer.
#[async_trait]
pub(crate) trait Responder: Send + Sync {
    async fn respond(&self, turn: PendingTurn) -> AssistantOutput;
}

/// Bypasses the model and answers from live web results.
struct WebSearchResponder {
    resources: Arc<TurnResources>,
}

#[async_trait]
impl Responder for WebSearchResponder {
    async fn respond(&self, turn: PendingTurn) -> AssistantOutput {
        let answer = self.resources.web_answer(turn.user_text()).await;
        turn.commit(&answer);
        AssistantOutput::Text(answer)
    }
}

/// The conversational orchestration engine.
pub struct Orchestrator {
    context: Arc<Mutex<ContextStore>>,
    resources: Arc<TurnResources>,
    web_search: WebSearchResponder,
    batched: BatchedResponder,
    streaming: StreamingResponder,
}

impl Orchestrator {
    /// Create an orchestrator backed by the HTTP services in `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let services = Services::from_settings(settings)?;
        Ok(Self::with_services(settings, prompts, services))
    }

    /// Create an orchestrator with custom services.
    pub fn with_services(settings: &Settings, prompts: Prompts, services: Services) -> Self {
        let web = WebSummarizer::new(
            services.search,
            services.fetcher,
            services.completion.clone(),
            &settings.web_search,
            SummaryParams {
                temperature: settings.completion.summary_temperature,
                max_tokens: settings.completion.summary_max_tokens,
            },
        )
        .with_prompts(prompts.clone());

        let resources = Arc::new(TurnResources {
            completion: services.completion,
            tools: ToolRegistry::new(services.images, services.videos),
            web,
            router: IntentRouter::new(&settings.router),
            system_prompt: prompts.chat_system(),
            temperature: settings.completion.chat_temperature,
            max_tokens: settings.completion.chat_max_tokens,
            hedge_window_chars: settings.router.hedge_window_chars,
        });

        Self {
            context: Arc::new(Mutex::new(ContextStore::new(settings.context.max_turns))),
            web_search: WebSearchResponder {
                resources: resources.clone(),
            },
            batched: BatchedResponder::new(resources.clone()),
            streaming: StreamingResponder::new(resources.clone()),
            resources,
        }
    }

    /// Route an utterance without answering it.
    pub fn route(&self, text: &str) -> Route {
        self.resources.router.route(text)
    }

    /// Answer one user turn.
    ///
    /// Waits for any turn in progress (including an undrained stream) to finish.
    /// Empty input is rejected; every upstream failure is turned into a
    /// persona-consistent answer instead of an error.
    #[instrument(skip(self))]
    pub async fn handle_user_turn(&self, text: &str) -> Result<AssistantOutput> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoxError::InvalidInput("No text input provided".to_string()));
        }

        let context = self.context.clone().lock_owned().await;
        let route = self.route(text);
        info!(route = ?route, "Routing user turn");

        let turn = PendingTurn {
            context,
            user_text: text.to_string(),
        };
        Ok(self.responder(route).respond(turn).await)
    }

    /// Forget the conversation so far.
    pub async fn clear_context(&self) {
        self.context.lock().await.clear();
    }

    /// Copy of the conversation so far, oldest first.
    pub async fn context_snapshot(&self) -> Vec<Turn> {
        self.context.lock().await.snapshot()
    }

    fn responder(&self, route: Route) -> &dyn Responder {
        match route {
            Route::WebSearch => &self.web_search,
            _ if route.streams() => &self.streaming,
            _ => &self.batched,
        }
    }
}
