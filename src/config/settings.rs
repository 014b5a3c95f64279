//! Configuration settings for AskVox.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub completion: CompletionSettings,
    pub context: ContextSettings,
    pub router: RouterSettings,
    pub tools: ToolSettings,
    pub web_search: WebSearchSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no `-v` flag or `RUST_LOG` is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Chat completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Base URL of an OpenAI-compatible server, without the `/v1` suffix.
    pub endpoint: String,
    /// API key. Overridden by `RUNPOD_KEY`.
    pub api_key: Option<String>,
    /// Model served by the endpoint.
    pub model: String,
    /// Temperature for chat and tool-eligible turns.
    pub chat_temperature: f32,
    /// Response length ceiling for chat and tool-eligible turns.
    pub chat_max_tokens: u32,
    /// Temperature for web result summarization.
    pub summary_temperature: f32,
    /// Response length ceiling for web result summarization.
    pub summary_max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            api_key: None,
            model: "NalDice/askvox-llama3.3-70b-16bit".to_string(),
            chat_temperature: 0.5,
            chat_max_tokens: 200,
            summary_temperature: 0.3,
            summary_max_tokens: 400,
            timeout_secs: 30,
        }
    }
}

impl CompletionSettings {
    /// API base URL including the `/v1` suffix.
    pub fn api_base(&self) -> String {
        let trimmed = self.endpoint.trim_end_matches('/');
        if trimmed.ends_with("/v1") {
            trimmed.to_string()
        } else {
            format!("{}/v1", trimmed)
        }
    }
}

/// Conversation context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Maximum number of turns kept for building requests.
    pub max_turns: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self { max_turns: 20 }
    }
}

/// Intent routing and fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Phrases that send a turn straight to web search.
    pub web_search_triggers: Vec<String>,
    /// Keywords that allow the model to call media tools.
    pub tool_keywords: Vec<String>,
    /// Phrases that mark a direct answer as uncertain.
    pub hedge_phrases: Vec<String>,
    /// Remove the trigger phrase from the query sent to the search provider.
    pub strip_trigger_phrases: bool,
    /// Characters of a streamed answer held back for the hedge check.
    pub hedge_window_chars: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            web_search_triggers: to_strings(&[
                "web search",
                "look up",
                "search online",
                "find on the web",
                "search the web",
            ]),
            tool_keywords: to_strings(&[
                "video", "trailer", "clip", "youtube", "image", "wallpaper", "photo", "pic",
            ]),
            hedge_phrases: to_strings(&[
                "i don't know",
                "i do not know",
                "i'm not sure",
                "i am not sure",
                "i'm not certain",
                "i don't have information",
                "i don't have access to real-time",
            ]),
            strip_trigger_phrases: true,
            hedge_window_chars: 64,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Retrieval tool endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Wallhaven-compatible image search endpoint. Overridden by `WALLPAPER_HEAVEN_ENDPOINT`.
    pub image_search_endpoint: String,
    /// YouTube Data API search endpoint. Overridden by `YOUTUBE_SEARCH_URL`.
    pub video_search_url: String,
    /// YouTube Data API key. Overridden by `GOOGLE_API_KEY`.
    pub youtube_api_key: Option<String>,
    /// Number of video candidates to choose from.
    pub max_video_results: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            image_search_endpoint: "https://wallhaven.cc/api/v1/search".to_string(),
            video_search_url: "https://www.googleapis.com/youtube/v3/search".to_string(),
            youtube_api_key: None,
            max_video_results: 5,
            timeout_secs: 30,
        }
    }
}

/// Web search backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum WebSearchProviderKind {
    /// DuckDuckGo HTML results page (no key required).
    #[default]
    DuckDuckGo,
    /// Brave Search API (requires `BRAVE_API_KEY`).
    Brave,
}

impl std::str::FromStr for WebSearchProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(WebSearchProviderKind::DuckDuckGo),
            "brave" => Ok(WebSearchProviderKind::Brave),
            _ => Err(format!("Unknown web search provider: {}", s)),
        }
    }
}

impl std::fmt::Display for WebSearchProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebSearchProviderKind::DuckDuckGo => write!(f, "duckduckgo"),
            WebSearchProviderKind::Brave => write!(f, "brave"),
        }
    }
}

/// Web search and summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchSettings {
    /// Search backend.
    pub provider: WebSearchProviderKind,
    /// Brave Search API key. Overridden by `BRAVE_API_KEY`.
    pub brave_api_key: Option<String>,
    /// Number of result pages to read.
    pub result_limit: usize,
    /// Timeout for the search request in seconds.
    pub search_timeout_secs: u64,
    /// Timeout for each page fetch in seconds.
    pub page_timeout_secs: u64,
    /// Maximum characters of extracted text kept per page.
    pub max_page_chars: usize,
    /// User agent sent with search and page requests.
    pub user_agent: String,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            provider: WebSearchProviderKind::DuckDuckGo,
            brave_api_key: None,
            result_limit: 3,
            search_timeout_secs: 30,
            page_timeout_secs: 5,
            max_page_chars: 4000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS. `*` allows any origin.
    pub cors_origin: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file, then apply environment overrides.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Override credentials and endpoints from environment variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("RUNPOD_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(endpoint) = get("RUNPOD_SERVER_ENDPOINT") {
            self.completion.endpoint = endpoint;
        }
        if let Some(endpoint) = get("WALLPAPER_HEAVEN_ENDPOINT") {
            self.tools.image_search_endpoint = endpoint;
        }
        if let Some(key) = get("GOOGLE_API_KEY") {
            self.tools.youtube_api_key = Some(key);
        }
        if let Some(url) = get("YOUTUBE_SEARCH_URL") {
            self.tools.video_search_url = url;
        }
        if let Some(key) = get("BRAVE_API_KEY") {
            self.web_search.brave_api_key = Some(key);
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VoxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askvox")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.context.max_turns, 20);
        assert_eq!(settings.web_search.result_limit, 3);
        assert_eq!(settings.web_search.page_timeout_secs, 5);
        assert_eq!(settings.tools.max_video_results, 5);
        assert_eq!(settings.completion.chat_max_tokens, 200);
        assert!((settings.completion.chat_temperature - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
            [completion]
            model = "llama3"

            [context]
            max_turns = 6
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.completion.model, "llama3");
        assert_eq!(settings.completion.timeout_secs, 30);
        assert_eq!(settings.context.max_turns, 6);
        assert!(settings.router.strip_trigger_phrases);
    }

    #[test]
    fn test_provider_kind_parsing() {
        let toml_str = "[web_search]\nprovider = \"brave\"\n";
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.web_search.provider, WebSearchProviderKind::Brave);
        assert_eq!("ddg".parse::<WebSearchProviderKind>().unwrap(), WebSearchProviderKind::DuckDuckGo);
        assert!("bing".parse::<WebSearchProviderKind>().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("RUNPOD_KEY", "rp-secret"),
            ("RUNPOD_SERVER_ENDPOINT", "https://pod.example.com"),
            ("GOOGLE_API_KEY", "g-key"),
            ("YOUTUBE_SEARCH_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.completion.api_key.as_deref(), Some("rp-secret"));
        assert_eq!(settings.completion.endpoint, "https://pod.example.com");
        assert_eq!(settings.tools.youtube_api_key.as_deref(), Some("g-key"));
        // Empty values leave the default in place
        assert_eq!(
            settings.tools.video_search_url,
            "https://www.googleapis.com/youtube/v3/search"
        );
    }

    #[test]
    fn test_api_base_suffix() {
        let mut completion = CompletionSettings {
            endpoint: "https://pod.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(completion.api_base(), "https://pod.example.com/v1");

        completion.endpoint = "http://localhost:8080/v1".to_string();
        assert_eq!(completion.api_base(), "http://localhost:8080/v1");
    }
}
