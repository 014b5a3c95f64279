//! Keyword-based intent routing.
//!
//! Each user turn is classified by an ordered list of `(triggers, route)`
//! rules; the first rule with a trigger contained in the utterance wins.
//! Matching is case-insensitive substring matching with no tokenization, so a
//! keyword inside an unrelated word ("pic" in "picnic") also matches.

use crate::completion::ToolChoice;
use crate::config::RouterSettings;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Route chosen for a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Answer directly, streamed, tools declared but forbidden.
    PlainChat,
    /// Batched answer, the model may call a media tool.
    ToolEligible,
    /// Skip the model and summarize live web results.
    WebSearch,
}

impl Route {
    /// Tool selection mode sent with the completion request.
    pub fn tool_choice(&self) -> ToolChoice {
        match self {
            Route::ToolEligible => ToolChoice::Auto,
            Route::PlainChat | Route::WebSearch => ToolChoice::None,
        }
    }

    /// Whether the answer is streamed fragment by fragment.
    pub fn streams(&self) -> bool {
        matches!(self, Route::PlainChat)
    }
}

/// A single routing rule.
#[derive(Debug, Clone)]
struct RouteRule {
    route: Route,
    triggers: Vec<String>,
}

impl RouteRule {
    fn new(route: Route, triggers: &[String]) -> Self {
        Self {
            route,
            triggers: normalize(triggers),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }
}

/// Classifies user turns and recognises uncertain answers.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    rules: Vec<RouteRule>,
    hedge_phrases: Vec<String>,
    trigger_pattern: Option<Regex>,
}

impl IntentRouter {
    /// Build a router from settings. Web search rules are evaluated before tool rules.
    pub fn new(settings: &RouterSettings) -> Self {
        let rules = vec![
            RouteRule::new(Route::WebSearch, &settings.web_search_triggers),
            RouteRule::new(Route::ToolEligible, &settings.tool_keywords),
        ];

        let trigger_pattern = if settings.strip_trigger_phrases {
            build_trigger_pattern(&settings.web_search_triggers)
        } else {
            None
        };

        Self {
            rules,
            hedge_phrases: normalize(&settings.hedge_phrases),
            trigger_pattern,
        }
    }

    /// Classify an utterance into exactly one route.
    pub fn route(&self, utterance: &str) -> Route {
        let lowered = utterance.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.route)
            .unwrap_or(Route::PlainChat)
    }

    /// Whether an answer expresses uncertainty and should be replaced by a web search.
    pub fn is_hedging(&self, answer: &str) -> bool {
        let lowered = answer.to_lowercase().replace('\u{2019}', "'");
        self.hedge_phrases.iter().any(|p| lowered.contains(p.as_str()))
    }

    /// Query forwarded to the search provider for a web search turn.
    ///
    /// Removes trigger phrases and a dangling leading "for"/"about" when
    /// stripping is enabled. Falls back to the trimmed utterance if nothing is left.
    pub fn search_query(&self, utterance: &str) -> String {
        let original = utterance.trim();
        let Some(pattern) = &self.trigger_pattern else {
            return original.to_string();
        };

        let stripped = pattern.replace_all(original, " ");
        let mut words: Vec<&str> = stripped.split_whitespace().collect();
        while let Some(first) = words.first() {
            if matches!(first.to_lowercase().as_str(), "for" | "about" | "on") {
                words.remove(0);
            } else {
                break;
            }
        }

        let query = words
            .join(" ")
            .trim_matches(|c: char| c == ',' || c == ':')
            .trim()
            .to_string();
        if query.is_empty() {
            original.to_string()
        } else {
            query
        }
    }
}

fn normalize(phrases: &[String]) -> Vec<String> {
    phrases
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn build_trigger_pattern(triggers: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = normalize(triggers).iter().map(|t| regex::escape(t)).collect();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}
