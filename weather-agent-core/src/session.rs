use std::{collections::VecDeque, sync::Arc};

use crate::{ChatTurn, router::ToolRouter};

/// In-memory chat history, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    turns: VecDeque<ChatTurn>,
    /// `0` means unbounded.
    limit: usize,
}

impl ChatLog {
    pub fn new(limit: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            limit,
        }
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push_back(turn);
        if self.limit > 0 {
            while self.turns.len() > self.limit {
                self.turns.pop_front();
            }
        }
    }

    pub fn turns(&self) -> Vec<ChatTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// One conversation: a router plus the turns exchanged so far.
#[derive(Debug)]
pub struct Assistant {
    router: Arc<dyn ToolRouter>,
    log: ChatLog,
}

impl Assistant {
    pub fn new(router: Arc<dyn ToolRouter>, history_limit: usize) -> Self {
        Self {
            router,
            log: ChatLog::new(history_limit),
        }
    }

    /// Answer `text`. Router failures come back as an apology, never as an error.
    pub async fn ask(&mut self, text: &str) -> String {
        let history = self.log.turns();

        let answer = match self.router.route(text, &history).await {
            Ok(reply) => reply.text,
            Err(e) => {
                tracing::warn!("router failed: {e:#}");
                format!("Sorry, I could not process that request: {e}")
            }
        };

        self.log.push(ChatTurn {
            user_text: text.to_string(),
            agent_text: answer.clone(),
        });
        answer
    }

    pub fn history(&self) -> &ChatLog {
        &self.log
    }
}
