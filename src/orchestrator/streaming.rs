//! Streamed plain-chat answers.
//!
//! Fragments are forwarded as the model produces them, except for a short
//! look-ahead window at the start of the answer. That window is held back so a
//! hedging answer can be replaced by a web summary before the user hears it.
//! The exchange is committed once the stream is drained; a stream dropped
//! early commits nothing.

use super::{AssistantOutput, PendingTurn, Responder, TurnResources, SERVER_DOWN};
use crate::completion::FragmentStream;
use crate::router::Route;
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, info, warn};

pub(crate) struct StreamingResponder {
    resources: Arc<TurnResources>,
}

impl StreamingResponder {
    pub(crate) fn new(resources: Arc<TurnResources>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl Responder for StreamingResponder {
    async fn respond(&self, turn: PendingTurn) -> AssistantOutput {
        let request = self
            .resources
            .build_request(&turn.history(), turn.user_text(), Route::PlainChat);

        match self.resources.completion.complete_stream(request).await {
            Ok(fragments) => {
                AssistantOutput::Stream(ResponseStream::new(fragments, self.resources.clone(), turn))
            }
            Err(e) => {
                warn!("Failed to open completion stream: {}", e);
                turn.commit(SERVER_DOWN);
                AssistantOutput::Text(SERVER_DOWN.to_string())
            }
        }
    }
}

/// Text fragments of a streamed answer, in order.
///
/// Holds the conversation lock until drained or dropped.
pub struct ResponseStream {
    inner: BoxStream<'static, String>,
}

impl ResponseStream {
    fn new(fragments: FragmentStream, resources: Arc<TurnResources>, turn: PendingTurn) -> Self {
        let state = StreamState {
            fragments: Some(fragments),
            held: VecDeque::new(),
            held_chars: 0,
            screening: true,
            window: resources.hedge_window_chars,
            forwarded: String::new(),
            resources,
            turn: Some(turn),
        };

        let inner = futures::stream::unfold(state, |mut state| async move {
            state.next_fragment().await.map(|fragment| (fragment, state))
        })
        .fuse()
        .boxed();

        Self { inner }
    }
}

impl Stream for ResponseStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

struct StreamState {
    /// Upstream fragments; `None` once exhausted or abandoned.
    fragments: Option<FragmentStream>,
    /// Fragments waiting to be forwarded.
    held: VecDeque<String>,
    held_chars: usize,
    /// Still inside the look-ahead window.
    screening: bool,
    window: usize,
    /// Everything handed to the caller so far.
    forwarded: String,
    resources: Arc<TurnResources>,
    turn: Option<PendingTurn>,
}

impl StreamState {
    async fn next_fragment(&mut self) -> Option<String> {
        loop {
            // Held fragments stay put until the opening has been screened
            if !self.screening {
                if let Some(fragment) = self.held.pop_front() {
                    self.forwarded.push_str(&fragment);
                    return Some(fragment);
                }
            }

            let Some(fragments) = self.fragments.as_mut() else {
                self.commit();
                return None;
            };

            let next = fragments.next().await;
            match next {
                Some(Ok(fragment)) if fragment.is_empty() => {}
                Some(Ok(fragment)) => {
                    if !self.screening {
                        self.forwarded.push_str(&fragment);
                        return Some(fragment);
                    }
                    self.held_chars += fragment.chars().count();
                    self.held.push_back(fragment);
                    if self.held_chars >= self.window {
                        self.screen().await;
                    }
                }
                Some(Err(e)) => {
                    warn!("Completion stream failed: {}", e);
                    self.fragments = None;
                    self.screening = false;
                    if self.forwarded.is_empty() {
                        self.held.clear();
                        self.held.push_back(SERVER_DOWN.to_string());
                    }
                }
                None => {
                    self.fragments = None;
                    if self.screening {
                        self.screen().await;
                    }
                }
            }
        }
    }

    /// Decide whether the held-back opening of the answer may be forwarded.
    async fn screen(&mut self) {
        self.screening = false;
        let opening: String = self.held.iter().map(String::as_str).collect();
        if !self.resources.needs_web_fallback(&opening) {
            return;
        }

        info!("Streamed answer was uncertain, falling back to web search");
        self.fragments = None;
        self.held.clear();

        let user_text = match &self.turn {
            Some(turn) => turn.user_text().to_string(),
            None => return,
        };
        let answer = self.resources.web_answer(&user_text).await;
        self.held.push_back(answer);
    }

    fn commit(&mut self) {
        if let Some(turn) = self.turn.take() {
            debug!("Committing streamed answer ({} chars)", self.forwarded.len());
            turn.commit(&self.forwarded);
        }
    }
}
