//! Retrieval tools the model may call on media-related turns.
//!
//! Both tools take a single `search_param` argument and always return a
//! user-facing string: a link on success, a fixed not-found sentence otherwise.

mod image;
mod video;

pub use image::{get_image, parse_wallhaven_response, ImageHit, ImageSearch, WallhavenClient, IMAGE_NOT_FOUND};
pub use video::{
    format_video_link, get_video, parse_youtube_response, VideoHit, VideoSearch, YoutubeClient,
    VIDEO_NOT_FOUND,
};

use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Static description of a tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// A tool call emitted by the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub name: String,
    /// Raw JSON arguments as sent by the model.
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Known media tools with their parsed argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum MediaTool {
    GetImage { search_param: String },
    GetVideo { search_param: String },
}

/// Outcome of resolving a tool invocation against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolDispatch {
    /// The tool ran (or degraded to its not-found sentence).
    Answered(String),
    /// The model named a tool that does not exist.
    UnknownTool(String),
}

/// Get the tool definitions offered to the model.
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "get_video".to_string(),
            description: "Fetches a video the user requested. Run this when the user question \
                includes words like 'video', 'trailer', 'youtube' or 'clip'."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "search_param": {
                        "type": "string",
                        "description": "Topic or description for the video, e.g., 'genshin impact gameplay video'."
                    }
                },
                "required": ["search_param"]
            }),
        },
        ToolDescriptor {
            name: "get_image".to_string(),
            description: "Fetches an image the user requested. Run this when the user question \
                includes words like 'wallpaper', 'image', or 'photo'."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "search_param": {
                        "type": "string",
                        "description": "Topic or description for the image, e.g., 'Raiden Shogun wallpaper' or 'sunset photo'."
                    }
                },
                "required": ["search_param"]
            }),
        },
    ]
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<MediaTool> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| VoxError::Tool(format!("Invalid tool arguments: {}", e)))?;

    let search_param = || {
        args["search_param"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| VoxError::Tool("Missing 'search_param' argument".to_string()))
    };

    match name {
        "get_image" => Ok(MediaTool::GetImage {
            search_param: search_param()?,
        }),
        "get_video" => Ok(MediaTool::GetVideo {
            search_param: search_param()?,
        }),
        _ => Err(VoxError::Tool(format!("Unknown tool: {}", name))),
    }
}

/// Registry of the media tools and the services behind them.
pub struct ToolRegistry {
    images: Arc<dyn ImageSearch>,
    videos: Arc<dyn VideoSearch>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new(images: Arc<dyn ImageSearch>, videos: Arc<dyn VideoSearch>) -> Self {
        Self {
            images,
            videos,
            descriptors: tool_descriptors(),
        }
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.iter().any(|d| d.name == name)
    }

    /// Run a tool invocation.
    ///
    /// Malformed arguments for a known tool degrade to that tool's not-found sentence.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolDispatch {
        if !self.contains(&invocation.name) {
            warn!("Model requested unknown tool: {}", invocation.name);
            return ToolDispatch::UnknownTool(invocation.name.clone());
        }

        info!("Calling tool {} with args: {}", invocation.name, invocation.arguments);

        let answer = match parse_tool_call(&invocation.name, &invocation.arguments) {
            Ok(MediaTool::GetImage { search_param }) => get_image(self.images.as_ref(), &search_param).await,
            Ok(MediaTool::GetVideo { search_param }) => get_video(self.videos.as_ref(), &search_param).await,
            Err(e) => {
                warn!("Failed to parse tool call: {}", e);
                not_found_for(&invocation.name).to_string()
            }
        };

        ToolDispatch::Answered(answer)
    }
}

fn not_found_for(name: &str) -> &'static str {
    if name == "get_video" {
        VIDEO_NOT_FOUND
    } else {
        IMAGE_NOT_FOUND
    }
}
