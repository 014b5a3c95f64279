//! Configuration module for AskVox.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, SummaryPrompts};
pub use settings::{
    CompletionSettings, ContextSettings, GeneralSettings, PromptSettings, RouterSettings,
    ServerSettings, Settings, ToolSettings, WebSearchProviderKind, WebSearchSettings,
};
