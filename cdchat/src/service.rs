//! Turn orchestration: screening, reasoning, invocation and reply composition.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cdcommon::{SessionId, TraceId};
use cdprovider::{
    Message, OutputItem, ReasoningProvider, ReasoningRequest, ReasoningResponse, Role, ToolCall,
    ToolDefinition, ToolOutcome, ToolResult,
};
use cdtooling::{ToolExecutionContext, ToolRuntime};

use crate::{
    ChatError, ChatTurnRequest, Classification, ClassifiedAs, ConversationStore, DispatchPolicy,
    DispatchTarget, InMemoryConversationStore, KeywordDispatchPolicy, NoopTurnHooks,
    RespondedWith, TurnHooks, TurnResult, TurnState, compose, redact, reasoner,
};

pub const DEFAULT_MAX_INVOCATIONS_PER_TURN: usize = 4;
pub const DEFAULT_REASONING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ConversationService {
    provider: Arc<dyn ReasoningProvider>,
    tools: Arc<dyn ToolRuntime>,
    store: Arc<dyn ConversationStore>,
    policy: Arc<dyn DispatchPolicy>,
    hooks: Arc<dyn TurnHooks>,
    max_invocations_per_turn: usize,
    reasoning_timeout: Duration,
    turn_counter: Arc<AtomicU64>,
}

impl ConversationService {
    pub fn builder(
        provider: Arc<dyn ReasoningProvider>,
        tools: Arc<dyn ToolRuntime>,
    ) -> ConversationServiceBuilder {
        ConversationServiceBuilder::new(provider, tools)
    }

    pub fn policy(&self) -> Arc<dyn DispatchPolicy> {
        Arc::clone(&self.policy)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    pub fn store(&self) -> Arc<dyn ConversationStore> {
        Arc::clone(&self.store)
    }

    /// Handles one utterance end to end.
    ///
    /// Conversation State is only appended once a reply has been composed; an
    /// error leaves the session exactly as it was.
    pub async fn run_turn(&self, request: ChatTurnRequest) -> Result<TurnResult, ChatError> {
        let started = Instant::now();
        let session_id = request.session.id.clone();
        self.hooks.on_turn_start(&session_id);

        match self.execute_turn(request).await {
            Ok(result) => {
                self.hooks
                    .on_turn_composed(&session_id, &result, started.elapsed());
                Ok(result)
            }
            Err(error) => {
                tracing::error!(
                    phase = "turn",
                    event = "turn_failed",
                    session_id = %session_id,
                    error_kind = ?error.kind,
                    error = %error
                );
                self.hooks
                    .on_turn_failed(&session_id, &error, started.elapsed());
                Err(error)
            }
        }
    }

    async fn execute_turn(&self, request: ChatTurnRequest) -> Result<TurnResult, ChatError> {
        let ChatTurnRequest {
            session,
            user_input,
        } = request;

        if user_input.trim().is_empty() {
            return Err(ChatError::invalid_request("user_input must not be empty"));
        }

        let mut trace = TurnTrace::new(session.id.clone(), self.hooks.as_ref());
        trace.enter(TurnState::Received);

        let findings = self.policy.screen(&user_input);
        if !findings.is_empty() {
            trace.enter(TurnState::Classified(ClassifiedAs::Sensitive));
            tracing::info!(
                phase = "turn",
                event = "sensitive_intercepted",
                session_id = %session.id,
                findings = findings.len()
            );

            let reply = compose::privacy_warning(&findings);
            let stored_input = redact(&user_input, &findings);
            return self
                .finish(trace, stored_input, reply, Vec::new())
                .await;
        }

        let definitions = self.tools.definitions();
        let classification = self.policy.classify(&user_input, &definitions);
        trace.enter(TurnState::Classified(classification.classified_as()));
        tracing::debug!(
            phase = "turn",
            event = "classified",
            session_id = %session.id,
            classified_as = classification.classified_as().as_str()
        );

        let prior = self.store.load_messages(session.id.as_str()).await?;
        let mut messages = Vec::with_capacity(prior.len() + 2);
        if let Some(system_prompt) = &session.system_prompt {
            messages.push(Message::new(Role::System, system_prompt.clone()));
        }
        messages.extend(prior);
        messages.push(Message::new(Role::User, user_input.clone()));

        let first = ReasoningRequest::builder()
            .messages(messages.clone())
            .tools(definitions.clone())
            .metadata("session_id", session.id.as_str())
            .build()?;
        let (text, requested) = collect_output(self.reason(first).await?.output);

        let calls = self.dispatchable_calls(&session.id, &classification, requested);
        let invocations = self.invoke_all(&mut trace, &session.id, calls).await;

        let reply = if invocations.is_empty() {
            if text.trim().is_empty() {
                fallback_reply(&classification)
            } else {
                text
            }
        } else {
            let second = ReasoningRequest::builder()
                .messages(messages)
                .tools(definitions.clone())
                .tool_results(invocations.clone())
                .metadata("session_id", session.id.as_str())
                .build()?;
            let (text, ignored) = collect_output(self.reason(second).await?.output);
            if !ignored.is_empty() {
                tracing::warn!(
                    phase = "turn",
                    event = "late_tool_calls_ignored",
                    session_id = %session.id,
                    count = ignored.len()
                );
            }

            if text.trim().is_empty() {
                reasoner::summarise(&definitions, &invocations)
            } else {
                text
            }
        };

        let reply = self.enforce(&classification, &definitions, &invocations, reply);
        self.finish(trace, user_input, reply, invocations).await
    }

    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ChatError> {
        match tokio::time::timeout(self.reasoning_timeout, self.provider.complete(request)).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(ChatError::timeout(format!(
                "reasoning component '{}' did not answer within {}ms",
                self.provider.name(),
                self.reasoning_timeout.as_millis()
            ))),
        }
    }

    /// The calls this turn is allowed to make.
    ///
    /// Only a matched classification may invoke anything. Every target the
    /// policy selected comes first, whether or not the reasoning component
    /// asked for it, so the per-turn limit only ever cuts extra calls.
    fn dispatchable_calls(
        &self,
        session_id: &SessionId,
        classification: &Classification,
        requested: Vec<ToolCall>,
    ) -> Vec<ToolCall> {
        let Classification::Matched(targets) = classification else {
            if !requested.is_empty() {
                tracing::warn!(
                    phase = "turn",
                    event = "tool_calls_dropped",
                    session_id = %session_id,
                    count = requested.len()
                );
            }
            return Vec::new();
        };

        let mut extra = requested;
        let mut calls = Vec::with_capacity(targets.len() + extra.len());
        for target in targets {
            if let Some(index) = extra.iter().position(|call| covers(call, target)) {
                calls.push(extra.remove(index));
                continue;
            }

            tracing::info!(
                phase = "turn",
                event = "invocation_enforced",
                session_id = %session_id,
                operation = %target.operation
            );
            let id = format!("enforced_{}", calls.len() + 1);
            calls.push(
                ToolCall::new(id, target.operation.clone())
                    .with_argument(target.input_key.clone(), target.reference.clone()),
            );
        }
        calls.extend(extra);

        if calls.len() > self.max_invocations_per_turn {
            tracing::warn!(
                phase = "turn",
                event = "invocations_truncated",
                session_id = %session_id,
                requested = calls.len(),
                limit = self.max_invocations_per_turn
            );
            calls.truncate(self.max_invocations_per_turn);
        }

        calls
    }

    async fn invoke_all(
        &self,
        trace: &mut TurnTrace<'_>,
        session_id: &SessionId,
        calls: Vec<ToolCall>,
    ) -> Vec<ToolResult> {
        if calls.is_empty() {
            return Vec::new();
        }

        trace.enter(TurnState::Invoking);
        let trace_id = TraceId::new(format!(
            "{session_id}-turn-{}",
            self.turn_counter.fetch_add(1, Ordering::Relaxed) + 1
        ));

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let context =
                ToolExecutionContext::new(session_id.clone()).with_trace_id(trace_id.clone());
            let result = self.tools.invoke(call, context).await;

            if result.outcome.is_contract_violation() {
                tracing::error!(
                    phase = "turn",
                    event = "contract_violation",
                    session_id = %session_id,
                    operation = %result.name,
                    outcome = result.outcome.kind()
                );
            }

            trace.enter(TurnState::Responded(RespondedWith::from(&result.outcome)));
            results.push(result);
        }

        results
    }

    /// Applies the reply rules the reasoning component cannot be trusted with.
    ///
    /// A turn with a failed lookup is answered from the outcomes alone: every
    /// not-found reference is stated with its portal and no status text from
    /// the reasoning component survives.
    fn enforce(
        &self,
        classification: &Classification,
        definitions: &[ToolDefinition],
        invocations: &[ToolResult],
        reply: String,
    ) -> String {
        let mut reply = reply;

        let failed = invocations.iter().any(|result| {
            matches!(
                result.outcome,
                ToolOutcome::NotFound { .. } | ToolOutcome::Unavailable { .. }
            )
        });
        if failed {
            let composed = reasoner::summarise(definitions, invocations);
            if reply != composed {
                tracing::warn!(
                    phase = "turn",
                    event = "reply_replaced",
                    reason = "failed_lookup",
                    invocations = invocations.len()
                );
            }
            reply = composed;
        }

        if invocations.is_empty()
            && matches!(classification, Classification::Unmatched { .. })
            && !reply.contains(compose::GENERAL_GUIDANCE_LABEL)
        {
            reply = format!("{}\n{reply}", compose::GENERAL_GUIDANCE_LABEL);
        }

        let leaked = self.policy.screen(&reply);
        if leaked.is_empty() {
            reply
        } else {
            tracing::warn!(
                phase = "turn",
                event = "reply_redacted",
                findings = leaked.len()
            );
            redact(&reply, &leaked)
        }
    }

    async fn finish(
        &self,
        mut trace: TurnTrace<'_>,
        user_input: String,
        reply: String,
        invocations: Vec<ToolResult>,
    ) -> Result<TurnResult, ChatError> {
        self.store
            .append_messages(
                trace.session_id.as_str(),
                vec![
                    Message::new(Role::User, user_input),
                    Message::new(Role::Assistant, reply.clone()),
                ],
            )
            .await?;

        trace.enter(TurnState::Composed);
        Ok(TurnResult {
            session_id: trace.session_id,
            reply,
            states: trace.states,
            invocations,
        })
    }
}

pub struct ConversationServiceBuilder {
    provider: Arc<dyn ReasoningProvider>,
    tools: Arc<dyn ToolRuntime>,
    store: Option<Arc<dyn ConversationStore>>,
    policy: Option<Arc<dyn DispatchPolicy>>,
    hooks: Arc<dyn TurnHooks>,
    max_invocations_per_turn: usize,
    reasoning_timeout: Duration,
}

impl ConversationServiceBuilder {
    pub fn new(provider: Arc<dyn ReasoningProvider>, tools: Arc<dyn ToolRuntime>) -> Self {
        Self {
            provider,
            tools,
            store: None,
            policy: None,
            hooks: Arc::new(NoopTurnHooks),
            max_invocations_per_turn: DEFAULT_MAX_INVOCATIONS_PER_TURN,
            reasoning_timeout: DEFAULT_REASONING_TIMEOUT,
        }
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn DispatchPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn TurnHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn max_invocations_per_turn(mut self, limit: usize) -> Self {
        self.max_invocations_per_turn = limit;
        self
    }

    pub fn reasoning_timeout(mut self, timeout: Duration) -> Self {
        self.reasoning_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ConversationService, ChatError> {
        if self.max_invocations_per_turn == 0 {
            return Err(ChatError::invalid_request(
                "max_invocations_per_turn must be at least 1",
            ));
        }

        if self.reasoning_timeout.is_zero() {
            return Err(ChatError::invalid_request(
                "reasoning_timeout must be greater than zero",
            ));
        }

        let policy = match self.policy {
            Some(policy) => policy,
            None => Arc::new(KeywordDispatchPolicy::new()?),
        };

        Ok(ConversationService {
            provider: self.provider,
            tools: self.tools,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryConversationStore::new())),
            policy,
            hooks: self.hooks,
            max_invocations_per_turn: self.max_invocations_per_turn,
            reasoning_timeout: self.reasoning_timeout,
            turn_counter: Arc::new(AtomicU64::new(0)),
        })
    }
}

struct TurnTrace<'h> {
    session_id: SessionId,
    hooks: &'h dyn TurnHooks,
    states: Vec<TurnState>,
}

impl<'h> TurnTrace<'h> {
    fn new(session_id: SessionId, hooks: &'h dyn TurnHooks) -> Self {
        Self {
            session_id,
            hooks,
            states: Vec::new(),
        }
    }

    fn enter(&mut self, state: TurnState) {
        self.hooks.on_state(&self.session_id, state);
        self.states.push(state);
    }
}

fn covers(call: &ToolCall, target: &DispatchTarget) -> bool {
    call.name == target.operation
        && call
            .arguments
            .get(&target.input_key)
            .is_some_and(|value| value.trim() == target.reference)
}

fn fallback_reply(classification: &Classification) -> String {
    match classification {
        Classification::Incomplete(domain) => compose::clarify_reference(*domain),
        Classification::Ambiguous(domains) => compose::clarify_domains(domains),
        Classification::Unmatched { topic } => compose::general_guidance(*topic),
        Classification::Matched(_) => compose::general_guidance(None),
    }
}

fn collect_output(items: Vec<OutputItem>) -> (String, Vec<ToolCall>) {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for item in items {
        match item {
            OutputItem::Message(message) => {
                if message.role == Role::Assistant {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&message.content);
                }
            }
            OutputItem::ToolCall(call) => tool_calls.push(call),
        }
    }

    (text, tool_calls)
}
