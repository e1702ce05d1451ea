//! Chat orchestration.
//!
//! [`ChatService`] owns the single conversation session for the process.
//! The store lock is only held to snapshot the transcript and to commit a
//! finished exchange, never across the model call. The user turn and its
//! reply are committed together, so each reply sits directly after the turn
//! it answers. An exchange that started before a reset is dropped instead of
//! being committed into the new conversation.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::conversation::ConversationStore;
use crate::llm::ModelClient;
use crate::models::Turn;
use crate::prompt::{assemble_prompt, system_prompt};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No message provided")]
    Validation,
    /// Displays the downstream error with its full context chain.
    #[error("{0:#}")]
    ExternalService(anyhow::Error),
}

pub struct ChatService {
    system_prompt: Arc<str>,
    store: Mutex<ConversationStore>,
    client: Arc<dyn ModelClient>,
}

impl ChatService {
    /// `context` is the startup document context; it is embedded into the
    /// preamble once and reused for every exchange.
    pub fn new(context: &str, client: Arc<dyn ModelClient>) -> Self {
        Self {
            system_prompt: Arc::from(system_prompt(context)),
            store: Mutex::new(ConversationStore::new()),
            client,
        }
    }

    /// Runs one exchange and returns the model's reply.
    ///
    /// An empty message is rejected before the store is touched. On a model
    /// failure the user turn is still committed, with no reply after it.
    pub async fn handle(&self, message: &str) -> Result<String, ChatError> {
        if message.is_empty() {
            return Err(ChatError::Validation);
        }

        let user_turn = Turn::user(message);
        let (prompt, generation) = {
            let store = self.store.lock().await;
            let mut history = store.all().to_vec();
            history.push(user_turn.clone());
            (
                assemble_prompt(&self.system_prompt, &history, message),
                store.generation(),
            )
        };
        debug!(chars = prompt.len(), "assembled prompt");

        let result = self.client.generate(&prompt).await;

        let mut store = self.store.lock().await;
        let current = store.generation() == generation;
        if !current {
            debug!("conversation reset during exchange, not recording it");
        }

        match result {
            Ok(reply) => {
                if current {
                    store.append(user_turn);
                    store.append(Turn::assistant(reply.clone()));
                }
                Ok(reply)
            }
            Err(e) => {
                error!(provider = self.client.name(), error = %format_args!("{:#}", e), "model call failed");
                if current {
                    store.append(user_turn);
                }
                Err(ChatError::ExternalService(e))
            }
        }
    }

    /// Clears the conversation. Does not wait for in-flight exchanges.
    pub async fn reset(&self) {
        self.store.lock().await.reset();
    }

    /// Snapshot of the conversation so far.
    pub async fn history(&self) -> Vec<Turn> {
        self.store.lock().await.all().to_vec()
    }
}
