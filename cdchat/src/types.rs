//! Chat session, turn request, and turn result types.

use cdcommon::SessionId;
use cdprovider::ToolResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub id: SessionId,
    pub system_prompt: Option<String>,
}

impl ChatSession {
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnRequest {
    pub session: ChatSession,
    pub user_input: String,
}

impl ChatTurnRequest {
    pub fn new(session: ChatSession, user_input: impl Into<String>) -> Self {
        Self {
            session,
            user_input: user_input.into(),
        }
    }
}

/// How the dispatch policy read an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifiedAs {
    Matched,
    Unmatched,
    Ambiguous,
    Incomplete,
    Sensitive,
}

impl ClassifiedAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Unmatched => "unmatched",
            Self::Ambiguous => "ambiguous",
            Self::Incomplete => "incomplete",
            Self::Sensitive => "sensitive",
        }
    }
}

/// What one invocation came back with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RespondedWith {
    Record,
    NotFound,
    TransportError,
    BadRequest,
}

impl RespondedWith {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::NotFound => "not_found",
            Self::TransportError => "transport_error",
            Self::BadRequest => "bad_request",
        }
    }
}

impl From<&cdprovider::ToolOutcome> for RespondedWith {
    fn from(value: &cdprovider::ToolOutcome) -> Self {
        use cdprovider::ToolOutcome;

        match value {
            ToolOutcome::Record { .. } => Self::Record,
            ToolOutcome::NotFound { .. } => Self::NotFound,
            ToolOutcome::Unavailable { .. } => Self::TransportError,
            ToolOutcome::BadRequest { .. } | ToolOutcome::UnknownOperation { .. } => {
                Self::BadRequest
            }
        }
    }
}

/// Per-turn state machine positions, recorded in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    Received,
    Classified(ClassifiedAs),
    Invoking,
    Responded(RespondedWith),
    Composed,
}

impl TurnState {
    pub fn label(&self) -> String {
        match self {
            Self::Received => "received".to_string(),
            Self::Classified(kind) => format!("classified:{}", kind.as_str()),
            Self::Invoking => "invoking".to_string(),
            Self::Responded(kind) => format!("responded:{}", kind.as_str()),
            Self::Composed => "composed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub session_id: SessionId,
    pub reply: String,
    pub states: Vec<TurnState>,
    pub invocations: Vec<ToolResult>,
}

impl TurnResult {
    pub fn classified_as(&self) -> Option<ClassifiedAs> {
        self.states.iter().find_map(|state| match state {
            TurnState::Classified(kind) => Some(*kind),
            _ => None,
        })
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.len()
    }
}
