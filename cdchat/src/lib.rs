//! Dispatch policy, turn orchestration and the conversation loop.
//!
//! ```rust
//! use cdchat::{DispatchPolicy, KeywordDispatchPolicy, SensitiveKind};
//!
//! let policy = KeywordDispatchPolicy::new().expect("patterns compile");
//! let findings = policy.screen("my aadhaar is 1234 5678 9012");
//! assert_eq!(findings[0].kind, SensitiveKind::IdentityNumber);
//! ```

mod error;
mod hooks;
mod policy;
mod repl;
mod service;
mod store;
mod types;

pub mod compose;
pub mod reasoner;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatSession, ChatTurnRequest, Classification, ClassifiedAs,
        ConversationLoop, ConversationService, ConversationServiceBuilder, ConversationStore,
        DispatchPolicy, InMemoryConversationStore, KeywordDispatchPolicy, PolicyReasoner,
        TurnHooks, TurnResult, TurnState,
    };
    pub use cdcommon::{SessionId, TraceId};
}

pub use error::{ChatError, ChatErrorKind};
pub use hooks::{NoopTurnHooks, TurnHooks};
pub use policy::{
    Classification, DispatchPolicy, DispatchTarget, KeywordDispatchPolicy, SensitiveFinding,
    SensitiveKind, redact,
};
pub use reasoner::{POLICY_REASONER_NAME, PolicyReasoner};
pub use repl::{ConversationLoop, DEFAULT_EXIT_COMMAND};
pub use service::{
    ConversationService, ConversationServiceBuilder, DEFAULT_MAX_INVOCATIONS_PER_TURN,
    DEFAULT_REASONING_TIMEOUT,
};
pub use store::{ChatFuture, ConversationStore, InMemoryConversationStore};
pub use types::{
    ChatSession, ChatTurnRequest, ClassifiedAs, RespondedWith, TurnResult, TurnState,
};
