//! # Doc Chat
//!
//! A small web server that answers questions about a folder of local
//! documents using a hosted large language model.
//!
//! At startup every supported file under the document root is concatenated
//! into one context string. Each chat message is sent to the model together
//! with that context and the conversation so far, and the reply is relayed
//! back to the browser.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌──────────────┐
//! │  Loader   │──▶│  Prompt   │──▶│ Model client │
//! │ (startup) │   │ assembler │   │ Gemini/OpenAI│
//! └───────────┘   └─────▲─────┘   └──────┬───────┘
//!                       │                │
//!                ┌──────┴──────┐         │
//!                │ ChatService │◀────────┘
//!                │  + history  │
//!                └──────▲──────┘
//!                       │
//!                 ┌─────┴─────┐
//!                 │   HTTP    │
//!                 │  (axum)   │
//!                 └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! mkdir -p data && cp notes/*.md data/
//! docchat serve                 # http://127.0.0.1:5000
//! docchat documents             # list files under the document root
//! docchat ask "Summarize the notes"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Document loading and live listing |
//! | [`prompt`] | Prompt assembly |
//! | [`conversation`] | Conversation store |
//! | [`llm`] | External model client |
//! | [`chat`] | Chat orchestration |
//! | [`server`] | HTTP server |

pub mod chat;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod loader;
pub mod models;
pub mod prompt;
pub mod server;
