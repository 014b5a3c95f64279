//! Non-streamed answers that may carry a media tool call.

use super::{AssistantOutput, PendingTurn, Responder, TurnResources, SERVER_DOWN, UNKNOWN_TOOL};
use crate::completion::Completion;
use crate::router::Route;
use crate::tools::ToolDispatch;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) struct BatchedResponder {
    resources: Arc<TurnResources>,
}

impl BatchedResponder {
    pub(crate) fn new(resources: Arc<TurnResources>) -> Self {
        Self { resources }
    }

    async fn answer(&self, turn: &PendingTurn) -> String {
        let resources = &self.resources;
        let request = resources.build_request(&turn.history(), turn.user_text(), Route::ToolEligible);

        match resources.completion.complete(request).await {
            Ok(Completion::Text(text)) => {
                if resources.needs_web_fallback(&text) {
                    info!("Direct answer was uncertain, falling back to web search");
                    resources.web_answer(turn.user_text()).await
                } else {
                    text
                }
            }
            Ok(Completion::ToolInvocation(invocation)) => {
                match resources.tools.dispatch(&invocation).await {
                    ToolDispatch::Answered(answer) => answer,
                    ToolDispatch::UnknownTool(_) => UNKNOWN_TOOL.to_string(),
                }
            }
            Ok(Completion::Empty) => {
                info!("Model returned neither text nor a tool call, falling back to web search");
                resources.web_answer(turn.user_text()).await
            }
            Err(e) => {
                warn!("Completion failed: {}", e);
                SERVER_DOWN.to_string()
            }
        }
    }
}

#[async_trait]
impl Responder for BatchedResponder {
    async fn respond(&self, turn: PendingTurn) -> AssistantOutput {
        let answer = self.answer(&turn).await;
        turn.commit(&answer);
        AssistantOutput::Text(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::harness;
    use super::super::SERVER_DOWN;
    use crate::completion::ToolChoice;
    use crate::router::Route;
    use crate::testing::ScriptedCompletion;

    #[tokio::test]
    async fn test_wallpaper_request_returns_image_path() {
        let h = harness(
            ScriptedCompletion::new()
                .with_tool("get_image", r#"{"search_param": "Raiden Shogun wallpaper"}"#),
        );
        let utterance = "show me a Raiden Shogun wallpaper";
        assert_eq!(h.orchestrator.route(utterance), Route::ToolEligible);

        let output = h.orchestrator.handle_user_turn(utterance).await.unwrap();
        assert_eq!(output.mode(), "text");
        assert_eq!(output.into_text().await, "https://w.wallhaven.cc/full/rs/raiden.jpg");

        assert_eq!(h.completion.streamed_flags(), vec![false]);
        let request = &h.completion.requests()[0];
        assert_eq!(request.tool_choice, ToolChoice::Auto);
        assert_eq!(request.tools.len(), 2);
        assert_eq!(h.images.queries(), vec!["Raiden Shogun wallpaper"]);

        let turns = h.orchestrator.context_snapshot().await;
        assert_eq!(turns[1].content(), "https://w.wallhaven.cc/full/rs/raiden.jpg");
    }

    #[tokio::test]
    async fn test_video_request_returns_link() {
        let h = harness(ScriptedCompletion::new().with_tool("get_video", r#"{"search_param": "genshin trailer"}"#));

        let answer = h
            .orchestrator
            .handle_user_turn("play the new genshin trailer")
            .await
            .unwrap()
            .into_text()
            .await;
        assert_eq!(
            answer,
            "Here is a video related to genshin trailer: https://www.youtube.com/watch?v=vid00000001"
        );
    }

    #[tokio::test]
    async fn test_text_answer_is_kept() {
        let h = harness(ScriptedCompletion::new().with_text("I can send you a wallpaper if you like."));

        let answer = h.orchestrator.handle_user_turn("any wallpaper ideas?").await.unwrap().into_text().await;
        assert_eq!(answer, "I can send you a wallpaper if you like.");
        assert!(h.search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_hedging_answer_falls_back_to_web() {
        let h = harness(
            ScriptedCompletion::new()
                .with_text("I'm not sure which video that is.")
                .with_text("Version 4.2 adds a new region."),
        );

        let answer = h
            .orchestrator
            .handle_user_turn("what is in the latest patch video")
            .await
            .unwrap()
            .into_text()
            .await;
        assert_eq!(answer, "Version 4.2 adds a new region.");
        assert_eq!(h.search.queries(), vec!["what is in the latest patch video"]);
        assert_eq!(h.completion.call_count(), 2);

        let turns = h.orchestrator.context_snapshot().await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content(), "what is in the latest patch video");
        assert_eq!(turns[1].content(), "Version 4.2 adds a new region.");
    }

    #[tokio::test]
    async fn test_empty_completion_falls_back_to_web() {
        let h = harness(ScriptedCompletion::new().with_empty().with_text("Summary."));

        let answer = h.orchestrator.handle_user_turn("find a photo").await.unwrap().into_text().await;
        assert_eq!(answer, "Summary.");
        assert_eq!(h.search.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_apologizes() {
        let h = harness(ScriptedCompletion::new().with_tool("get_weather", r#"{"city": "Oslo"}"#));

        let answer = h.orchestrator.handle_user_turn("weather photo").await.unwrap().into_text().await;
        assert_eq!(answer, super::UNKNOWN_TOOL);
        assert!(h.images.queries().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_yield_not_found() {
        let h = harness(ScriptedCompletion::new().with_tool("get_image", "{not json"));

        let answer = h.orchestrator.handle_user_turn("wallpaper please").await.unwrap().into_text().await;
        assert_eq!(answer, "No image found.");
    }

    #[tokio::test]
    async fn test_completion_error_is_server_down() {
        let h = harness(ScriptedCompletion::new().with_error("connection refused"));

        let answer = h.orchestrator.handle_user_turn("send a clip").await.unwrap().into_text().await;
        assert_eq!(answer, SERVER_DOWN);

        let turns = h.orchestrator.context_snapshot().await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content(), SERVER_DOWN);
    }
}
