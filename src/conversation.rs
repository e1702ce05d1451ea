//! In-memory conversation log for a single chat session.
//!
//! The store itself is a plain ordered `Vec`; callers that share it across
//! tasks wrap it in a lock (see [`crate::chat::ChatService`]). Nothing is
//! persisted and there is no size cap.

use crate::models::Turn;

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
    generation: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in insertion order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Empties the store and starts a new generation.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.generation += 1;
    }

    /// Incremented by every [`reset`](Self::reset). Lets a caller that
    /// released the store detect that the conversation it read is gone.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
