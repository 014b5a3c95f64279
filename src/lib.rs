//! AskVox - conversational backend for the Vox voice assistant
//!
//! Turns a transcribed utterance into a spoken-style answer.
//!
//! # Overview
//!
//! Every user turn is routed to one of three strategies:
//! - Plain chat, streamed fragment by fragment from an OpenAI-compatible model
//! - Media lookup, where the model may call an image or video search tool
//! - Live web search, where result pages are extracted and summarized
//!
//! Uncertain or empty model answers fall back to a web search. The
//! conversation is kept in a bounded history shared by all turns.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `context` - Bounded conversation history
//! - `router` - Keyword intent routing and hedge detection
//! - `completion` - Chat completion service abstraction
//! - `tools` - Image and video search tools
//! - `web` - Web search, page extraction and summarization
//! - `orchestrator` - Per-turn coordination of all of the above
//!
//! # Example
//!
//! ```rust,no_run
//! use askvox::config::Settings;
//! use askvox::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let answer = orchestrator
//!         .handle_user_turn("show me a Raiden Shogun wallpaper")
//!         .await?
//!         .into_text()
//!         .await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod router;
pub mod tools;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, VoxError};
