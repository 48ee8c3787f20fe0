//! 服务模块

pub mod completion;
pub mod knowledge;
pub mod orchestrator;
pub mod picker;
pub mod responder;

pub use completion::{ChatCompletionClient, CompletionOutcome, CompletionService};
pub use knowledge::PageFetcher;
pub use orchestrator::{ReplySource, ResolvedReply, ResponseOrchestrator};
pub use picker::ReplyPicker;
pub use responder::PatternResponder;
