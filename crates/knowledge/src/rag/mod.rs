//! Retrieval-augmented answering with web fallback.

pub mod chain;
pub mod generator;
pub mod judge;
pub mod memory;
pub mod orchestrator;
pub mod types;

pub use chain::{ChainFlavor, ChainRegistry, RetrievalChain, CONVERSATIONAL};
pub use generator::Generator;
pub use judge::is_answer_unavailable;
pub use memory::{ConversationMemory, MemoryKind, Turn};
pub use orchestrator::{Bot, BotOptions};
pub use types::{
    Answer, AskOutcome, ChainInput, ChainOutput, SourceDocument, SystemInfo, ERROR_MESSAGE,
    NO_CHAIN_MESSAGE, WEB_SEARCH_SOURCE,
};
