//! Conversation memory for one session.

use faqbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of turns kept by window memory.
pub const DEFAULT_WINDOW: usize = 5;

/// Retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryKind {
    /// Keep every turn
    Buffer,
    /// Keep the most recent `n` turns
    Window(usize),
}

impl MemoryKind {
    /// Parse `"buffer"` or `"window"`; `window` sets the window size.
    pub fn parse(name: &str, window: usize) -> AppResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "buffer" => Ok(Self::Buffer),
            "window" => Ok(Self::Window(window.max(1))),
            other => Err(AppError::Config(format!(
                "Unknown memory type: '{}'. Supported types: window, buffer",
                other
            ))),
        }
    }
}

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Ordered turns with FIFO eviction past the window.
///
/// Internally synchronized so a chain can record turns while the session
/// holds a shared handle.
#[derive(Debug)]
pub struct ConversationMemory {
    kind: MemoryKind,
    turns: Mutex<VecDeque<Turn>>,
}

impl ConversationMemory {
    pub fn new(kind: MemoryKind) -> Self {
        Self {
            kind,
            turns: Mutex::new(VecDeque::new()),
        }
    }

    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Record a completed turn, evicting the oldest past the window.
    pub fn save_turn(&self, question: &str, answer: &str) {
        let mut turns = self.lock();
        turns.push_back(Turn {
            question: question.to_string(),
            answer: answer.to_string(),
        });

        if let MemoryKind::Window(n) = self.kind {
            while turns.len() > n {
                turns.pop_front();
            }
        }
    }

    /// Snapshot of the retained turns, oldest first.
    pub fn turns(&self) -> Vec<Turn> {
        self.lock().iter().cloned().collect()
    }

    /// Turns rendered as `Human:` / `Assistant:` lines.
    pub fn format_history(&self) -> String {
        self.lock()
            .iter()
            .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Turn>> {
        // A panic while holding the lock cannot leave the deque inconsistent
        self.turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
