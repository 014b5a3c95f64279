//! Bounded conversation context.
//!
//! Holds the chronological turns used to build completion requests. The store
//! only grows by appending; once the bound is exceeded the oldest turns are
//! evicted first.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Capacity-bounded, FIFO-evicting record of conversation turns.
#[derive(Debug, Clone)]
pub struct ContextStore {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl ContextStore {
    /// Create an empty store holding at most `max_turns` turns (minimum 2).
    pub fn new(max_turns: usize) -> Self {
        let max_turns = max_turns.max(2);
        Self {
            turns: VecDeque::with_capacity(max_turns + 1),
            max_turns,
        }
    }

    /// Append a turn, evicting from the front while over the bound.
    ///
    /// Eviction never leaves an assistant turn without its user turn at the front.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        if self.turns.len() <= self.max_turns {
            return;
        }
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
        while self.turns.front().is_some_and(|t| t.role() == Role::Assistant) {
            self.turns.pop_front();
        }
    }

    /// Append a completed user/assistant exchange.
    pub fn record_exchange(&mut self, user: Turn, assistant: Turn) {
        self.push(user);
        self.push(assistant);
    }

    /// Copy of the current turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}
