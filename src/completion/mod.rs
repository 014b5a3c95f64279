//! Chat completion service abstraction.
//!
//! The orchestrator talks to the model only through [`CompletionService`], so
//! the OpenAI-compatible client can be swapped for a scripted fake in tests.

mod openai;

pub use openai::OpenAICompletion;

use crate::context::Turn;
use crate::error::Result;
use crate::tools::{ToolDescriptor, ToolInvocation};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Whether the model may answer with a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    None,
    Auto,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::None => "none",
            ToolChoice::Auto => "auto",
        }
    }
}

/// A single completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction, context turns and the new user turn, in order.
    pub messages: Vec<Turn>,
    pub tools: Vec<ToolDescriptor>,
    pub tool_choice: ToolChoice,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with no tools declared.
    pub fn plain(messages: Vec<Turn>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
            temperature,
            max_tokens,
        }
    }
}

/// Result of a batched completion call.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The model answered in natural language.
    Text(String),
    /// The model asked for a tool instead of answering.
    ToolInvocation(ToolInvocation),
    /// Neither text nor a tool invocation was returned.
    Empty,
}

/// Text fragments of a streamed completion, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// An OpenAI-style chat completion backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Issue a batched request and return the structured response.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;

    /// Issue a streaming request. Tool invocations cannot be detected on this path.
    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream>;
}
