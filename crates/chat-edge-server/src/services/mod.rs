pub mod llm_service;
pub mod orchestrator;
pub mod search_service;

pub use llm_service::LlmService;
pub use orchestrator::{
    ChatError, ChatInput, ChatOrchestrator, ChatTurn, ContextProvider, LlmProvider, NoContext,
};
pub use search_service::SearchService;
