//! Misty Voice - talk to a Misty robot through your microphone
//!
//! This library provides the pieces of a voice conversation loop:
//! - Voice capture (microphone, endpointing, STT, wake phrase)
//! - Movement commands (`move <N> seconds`)
//! - LLM replies via an OpenAI-compatible completion API
//! - Robot control and speech over Misty's REST API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐
//! │  Microphone  │──►│  STT service │──►│     Conversation     │
//! └──────────────┘   └──────────────┘   │  move? ──► drive/stop│
//!                                       │  else  ──► complete  │
//!                                       └─────┬─────────┬──────┘
//!                                             │         │
//!                               ┌─────────────▼──┐  ┌───▼─────────────┐
//!                               │ Misty REST API │  │ Completion API  │
//!                               │ drive  tts     │  └─────────────────┘
//!                               └────────────────┘
//! ```

pub mod command;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod robot;
pub mod voice;

pub use command::{Command, drive_for};
pub use config::Config;
pub use conversation::{Conversation, LoopOptions};
pub use error::{Error, Result};
pub use llm::{ChatCompletion, ResponseGenerator};
pub use robot::{MistyClient, Robot};
