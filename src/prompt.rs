//! Prompt assembly.
//!
//! Every model call gets one self-contained prompt: the instruction
//! preamble with the document context embedded, a transcript of earlier
//! turns, and the newest user message on the last line. No session state
//! is kept on the model side, so the full transcript is re-sent each time.

use crate::models::{Role, Turn};

const PREAMBLE_HEAD: &str = "You are a helpful assistant that answers questions based on the provided documents.
Use the information from these documents to answer user questions accurately.
If the answer cannot be found in the documents, say so clearly.

Here are the documents you have access to:

";

const PREAMBLE_TAIL: &str = "

---
Now answer the user's questions based on the above documents.";

/// Instruction preamble with `context` embedded between the fixed head and
/// tail. Computed once per process alongside the context string.
pub fn system_prompt(context: &str) -> String {
    let mut out = String::with_capacity(PREAMBLE_HEAD.len() + context.len() + PREAMBLE_TAIL.len());
    out.push_str(PREAMBLE_HEAD);
    out.push_str(context);
    out.push_str(PREAMBLE_TAIL);
    out
}

/// Builds the outbound prompt.
///
/// `history` is the full store contents. If its last turn is the user's
/// pending message it is left out of the transcript, since `newest` is
/// appended on its own line at the end.
pub fn assemble_prompt(system_prompt: &str, history: &[Turn], newest: &str) -> String {
    let prior = match history.last() {
        Some(last) if last.role == Role::User => &history[..history.len() - 1],
        _ => history,
    };

    let mut out = String::from(system_prompt);
    out.push_str("\n\nConversation so far:\n");
    for turn in prior {
        out.push_str(&render_turn(turn));
        out.push('\n');
    }
    out.push_str("\nUser: ");
    out.push_str(newest);
    out
}

fn render_turn(turn: &Turn) -> String {
    format!("{}: {}", turn.role.label(), turn.text)
}
