//! OpenAI-compatible completion backend.

use super::{Completion, CompletionRequest, CompletionService, FragmentStream, ToolChoice};
use crate::config::CompletionSettings;
use crate::context::{Role, Turn};
use crate::error::{Result, VoxError};
use crate::openai::create_client;
use crate::tools::{ToolDescriptor, ToolInvocation};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FunctionObject,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Completion service backed by an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAICompletion {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAICompletion {
    /// Create a backend for the configured endpoint and model.
    pub fn new(settings: &CompletionSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
        })
    }

    #[allow(deprecated)]
    fn build_request(&self, request: CompletionRequest, stream: bool) -> Result<CreateChatCompletionRequest> {
        let messages = request
            .messages
            .iter()
            .map(to_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens);

        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(to_tool).collect::<Vec<_>>())
                .tool_choice(match request.tool_choice {
                    ToolChoice::None => ChatCompletionToolChoiceOption::None,
                    ToolChoice::Auto => ChatCompletionToolChoiceOption::Auto,
                });
        }

        if stream {
            args.stream(true);
        }

        args.build().map_err(|e| VoxError::Completion(e.to_string()))
    }
}

#[async_trait]
impl CompletionService for OpenAICompletion {
    #[instrument(skip(self, request), fields(tool_choice = request.tool_choice.as_str()))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let request = self.build_request(request, false)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VoxError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Ok(Completion::Empty);
        };

        let message = choice.message;
        let invocation = message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| ToolInvocation::new(call.function.name, call.function.arguments));

        // Some servers send an empty content string alongside the tool call
        if let Some(invocation) = invocation {
            debug!("Model requested tool {}", invocation.name);
            return Ok(Completion::ToolInvocation(invocation));
        }

        Ok(match message.content {
            Some(content) => Completion::Text(content),
            None => Completion::Empty,
        })
    }

    #[instrument(skip(self, request))]
    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream> {
        let request = self.build_request(request, true)?;

        let stream = self.client.chat().create_stream(request).await.map_err(|e| {
            VoxError::OpenAI(format!("Failed to start response stream: {}", e))
        })?;

        let fragments = stream.filter_map(|item| async move {
            match item {
                Ok(chunk) => {
                    let text: String = chunk
                        .choices
                        .iter()
                        .filter_map(|c| c.delta.content.as_deref())
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(VoxError::OpenAI(format!("Response stream error: {}", e)))),
            }
        });

        Ok(fragments.boxed())
    }
}

fn to_message(turn: &Turn) -> Result<ChatCompletionRequestMessage> {
    let message = match turn.role() {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(turn.content())
            .build()
            .map_err(|e| VoxError::Completion(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(turn.content())
            .build()
            .map_err(|e| VoxError::Completion(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(turn.content())
            .build()
            .map_err(|e| VoxError::Completion(e.to_string()))?
            .into(),
    };
    Ok(message)
}

fn to_tool(descriptor: &ToolDescriptor) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: descriptor.name.clone(),
            description: Some(descriptor.description.clone()),
            parameters: Some(descriptor.parameters.clone()),
            strict: None,
        },
    }
}
